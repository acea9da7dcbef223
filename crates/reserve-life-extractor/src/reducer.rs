//! Content reduction
//!
//! A 10-K is several megabytes of HTML; the LLM gets a few kilobytes. The
//! reducer keeps table blocks and paragraphs that mention a keyword and a
//! number, ranks them, and admits them greedily within a character budget.

use crate::config::ExtractorConfig;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

static HTML_MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<\s*(html|body|div|p|table|span|br|font)\b").expect("markup pattern is valid")
});

static BLANK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t\r]*\n").expect("blank line pattern is valid"));

static TABLES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("selector is valid"));
static ROWS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("selector is valid"));
static CELLS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td, th").expect("selector is valid"));
static PARAGRAPHS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p, li, div").expect("selector is valid"));

/// Elements whose content never reaches the LLM
const EXCLUDED: &[&str] = &["script", "style", "noscript", "head", "template"];

/// Elements that break text into separate words
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "tr", "td", "th", "li", "ul", "ol", "table", "h1", "h2", "h3", "h4", "h5",
    "h6", "section", "article",
];

/// A div containing any of these is a container, not a paragraph
const CONTAINER_ELEMENTS: &[&str] = &["p", "div", "table", "li", "ul", "ol"];

/// Structural origin of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BlockKind {
    /// A table, flattened row by row
    Table,
    /// A paragraph, list item or leaf div
    Paragraph,
}

impl BlockKind {
    fn label(&self) -> &'static str {
        match self {
            BlockKind::Table => "TABLE",
            BlockKind::Paragraph => "PARAGRAPH",
        }
    }
}

#[derive(Debug, Clone)]
struct Block {
    kind: BlockKind,
    /// 1-based position among blocks of the same kind
    number: usize,
    score: usize,
    text: String,
}

impl Block {
    fn render(&self) -> String {
        format!("[{} {}]\n{}\n\n", self.kind.label(), self.number, self.text)
    }
}

/// The reduced document sent to the LLM
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Excerpt {
    /// Concatenated tagged blocks
    pub text: String,
    /// Table blocks admitted
    pub tables: usize,
    /// Paragraph blocks admitted
    pub paragraphs: usize,
    /// Matching blocks left out for lack of budget
    pub dropped: usize,
    /// Whether the top block was cut to fit
    pub truncated: bool,
}

impl Excerpt {
    /// Whether nothing relevant was found
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Length in characters
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    fn count(&mut self, kind: BlockKind) {
        match kind {
            BlockKind::Table => self.tables += 1,
            BlockKind::Paragraph => self.paragraphs += 1,
        }
    }
}

/// Keyword-driven document reducer
#[derive(Debug, Clone)]
pub struct ContentReducer {
    keywords: Vec<String>,
    budget: usize,
    min_paragraph_chars: usize,
}

impl ContentReducer {
    /// Create a reducer with explicit keywords and budget
    pub fn new<I, S>(keywords: I, budget: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty() && seen.insert(k.clone()))
            .collect();
        Self {
            keywords,
            budget,
            min_paragraph_chars: 30,
        }
    }

    /// Create a reducer from extractor configuration
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(&config.keywords, config.excerpt_budget)
            .with_min_paragraph_chars(config.min_paragraph_chars)
    }

    /// Set the shortest paragraph considered
    pub fn with_min_paragraph_chars(mut self, chars: usize) -> Self {
        self.min_paragraph_chars = chars;
        self
    }

    /// Reduce an HTML or plain-text document to a budgeted excerpt
    ///
    /// Never fails; a document without matches gives an empty excerpt.
    pub fn reduce(&self, document: &str) -> Excerpt {
        let mut blocks = if HTML_MARKUP.is_match(document) {
            self.html_blocks(document)
        } else {
            self.text_blocks(document)
        };

        // Tables first, then by score, then document order
        blocks.sort_by(|a, b| {
            a.kind
                .cmp(&b.kind)
                .then(b.score.cmp(&a.score))
                .then(a.number.cmp(&b.number))
        });

        self.admit(blocks)
    }

    /// Number of distinct keywords in `text`, or 0 without a digit
    pub fn score(&self, text: &str) -> usize {
        if !text.chars().any(|c| c.is_ascii_digit()) {
            return 0;
        }
        let lowered = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|k| lowered.contains(k.as_str()))
            .count()
    }

    fn html_blocks(&self, document: &str) -> Vec<Block> {
        let html = Html::parse_document(document);
        let mut blocks = Vec::new();

        let tables = html
            .select(&TABLES)
            .filter(|t| !has_ancestor(*t, &["table"]) && !has_ancestor(*t, EXCLUDED));
        for (idx, table) in tables.enumerate() {
            let text = table_text(table);
            let score = self.score(&text);
            if score > 0 {
                blocks.push(Block {
                    kind: BlockKind::Table,
                    number: idx + 1,
                    score,
                    text,
                });
            }
        }

        let mut seen = HashSet::new();
        let paragraphs = html.select(&PARAGRAPHS).filter(|el| {
            !has_ancestor(*el, &["table"])
                && !has_ancestor(*el, EXCLUDED)
                && (el.value().name() != "div" || is_leaf(*el))
        });
        let mut number = 0;
        for element in paragraphs {
            let text = visible_text(element);
            if text.chars().count() < self.min_paragraph_chars || !seen.insert(text.clone()) {
                continue;
            }
            number += 1;
            let score = self.score(&text);
            if score > 0 {
                blocks.push(Block {
                    kind: BlockKind::Paragraph,
                    number,
                    score,
                    text,
                });
            }
        }

        blocks
    }

    fn text_blocks(&self, document: &str) -> Vec<Block> {
        BLANK_LINE
            .split(document)
            .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|p| p.chars().count() >= self.min_paragraph_chars)
            .enumerate()
            .filter_map(|(idx, text)| {
                let score = self.score(&text);
                (score > 0).then_some(Block {
                    kind: BlockKind::Paragraph,
                    number: idx + 1,
                    score,
                    text,
                })
            })
            .collect()
    }

    /// Admission in priority order
    ///
    /// The first block that does not fit ends admission, so everything of
    /// lower priority is dropped with it. An over-long top block is cut to
    /// the budget instead.
    fn admit(&self, blocks: Vec<Block>) -> Excerpt {
        let mut excerpt = Excerpt::default();
        let mut used = 0;
        let mut blocks = blocks.into_iter();

        while let Some(block) = blocks.next() {
            let rendered = block.render();
            let len = rendered.chars().count();
            if used + len > self.budget {
                if excerpt.text.is_empty() {
                    excerpt.text = rendered.chars().take(self.budget).collect();
                    excerpt.truncated = true;
                    excerpt.count(block.kind);
                } else {
                    excerpt.dropped += 1;
                }
                excerpt.dropped += blocks.len();
                break;
            }
            used += len;
            excerpt.text.push_str(&rendered);
            excerpt.count(block.kind);
        }

        excerpt.text.truncate(excerpt.text.trim_end().len());
        excerpt
    }
}

impl Default for ContentReducer {
    fn default() -> Self {
        Self::from_config(&ExtractorConfig::default())
    }
}

/// Table text with cells joined by ` | ` and one line per row
fn table_text(table: ElementRef<'_>) -> String {
    let rows: Vec<String> = table
        .select(&ROWS)
        .map(|row| {
            row.select(&CELLS)
                .map(visible_text)
                .filter(|cell| !cell.is_empty())
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .filter(|row| !row.is_empty())
        .collect();

    if rows.is_empty() {
        visible_text(table)
    } else {
        rows.join("\n")
    }
}

/// Text of an element without script/style content, whitespace collapsed
fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_text(element, &mut out);
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = child.value().name();
                if EXCLUDED.contains(&name) {
                    continue;
                }
                let block = BLOCK_ELEMENTS.contains(&name);
                if block {
                    out.push(' ');
                }
                collect_text(child, out);
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

fn has_ancestor(element: ElementRef<'_>, names: &[&str]) -> bool {
    element
        .ancestors()
        .filter_map(|node| node.value().as_element())
        .any(|e| names.contains(&e.name()))
}

fn is_leaf(element: ElementRef<'_>) -> bool {
    !element
        .descendants()
        .skip(1)
        .filter_map(|node| node.value().as_element())
        .any(|e| CONTAINER_ELEMENTS.contains(&e.name()))
}
