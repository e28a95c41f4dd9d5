use crate::ast::Span;
use serde::{Deserialize, Serialize};

/// Root of a parsed post body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Span covering the entire normalized input.
    pub span: Span,

    #[serde(default)]
    pub blocks: Vec<BlockNode>,
}

/// A block node with a source span and a tagged kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockNode {
    pub span: Span,

    #[serde(flatten)]
    pub kind: BlockKind,
}

/// Block-level node kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Heading {
        /// Heading level (1..=4). Deeper `#` runs are clamped to 4.
        level: u8,
        content: Vec<Inline>,
    },

    Paragraph {
        content: Vec<Inline>,
    },

    List {
        list: List,
    },

    BlockQuote {
        blocks: Vec<BlockNode>,
    },

    /// A pipe table with a separator row.
    Table {
        table: Table,
    },

    /// A triple-backtick fenced block.
    CodeBlock {
        block: CodeBlock,
    },

    /// `---`, `***` or `___` on a line of its own.
    HorizontalRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub ordered: bool,

    /// Number of the first item for ordered lists that do not start at 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u64>,

    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub span: Span,

    /// `Some` for task items (`- [ ]` / `- [x]`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,

    /// Blocks that make up this item's content, including nested lists.
    #[serde(default)]
    pub blocks: Vec<BlockNode>,
}

/// A fenced code block. Also produced transiently by the normalizer when it
/// lifts paragraph-wrapped code out of rich-editor markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Language tag from the fence info string; empty means plain text.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub language: String,

    /// Optional title from a `lang:title` info string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Raw interior lines, joined with `\n`, no trailing newline.
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub alignments: Vec<Alignment>,
    pub header: Vec<TableCell>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<Vec<TableCell>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TableCell {
    #[serde(default)]
    pub content: Vec<Inline>,
}

/// Inline-level nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    /// A run of text sharing one style.
    Text {
        value: String,

        #[serde(default, skip_serializing_if = "TextStyle::is_plain")]
        style: TextStyle,
    },

    /// A single-backtick code span. Never carries a language or copy action.
    InlineCode { code: String },

    Link { link: Link },

    Image { image: Image },

    /// Hard line break (two trailing spaces or a trailing backslash).
    LineBreak,
}

impl Inline {
    pub fn text(value: impl Into<String>, style: TextStyle) -> Self {
        Inline::Text {
            value: value.into(),
            style,
        }
    }

    pub fn plain(value: impl Into<String>) -> Self {
        Self::text(value, TextStyle::default())
    }
}

/// Emphasis flags applied to a text run. Nested emphasis is flattened into
/// these flags rather than into nested nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct TextStyle {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub strikethrough: bool,
}

impl TextStyle {
    pub fn is_plain(&self) -> bool {
        !self.bold && !self.italic && !self.strikethrough
    }

    pub fn with_bold(self) -> Self {
        Self { bold: true, ..self }
    }

    pub fn with_italic(self) -> Self {
        Self {
            italic: true,
            ..self
        }
    }

    pub fn with_strikethrough(self) -> Self {
        Self {
            strikethrough: true,
            ..self
        }
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub content: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub src: String,
    pub alt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Concatenates the visible text of `nodes`, dropping all formatting.
///
/// Used for image alt text and for titles derived from headings.
pub fn plain_text(nodes: &[Inline]) -> String {
    let mut out = String::new();
    for n in nodes {
        match n {
            Inline::Text { value, .. } => out.push_str(value),
            Inline::InlineCode { code } => out.push_str(code),
            Inline::Link { link } => out.push_str(&plain_text(&link.content)),
            Inline::Image { image } => out.push_str(&image.alt),
            Inline::LineBreak => out.push('\n'),
        }
    }
    out
}
