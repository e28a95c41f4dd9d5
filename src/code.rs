//! Code-block formatting: fence info strings, language labels, the copy
//! payload, and the snippet builder used by the post editor.

use crate::ast::{BlockKind, BlockNode, CodeBlock};

/// The fence marker shared by the normalizer, parser and snippet builder.
pub const FENCE: &str = "```";

/// Languages offered by the snippet editor, as `(identifier, label)`.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("javascript", "JavaScript"),
    ("typescript", "TypeScript"),
    ("python", "Python"),
    ("java", "Java"),
    ("csharp", "C#"),
    ("cpp", "C++"),
    ("html", "HTML"),
    ("css", "CSS"),
    ("scss", "SCSS"),
    ("json", "JSON"),
    ("sql", "SQL"),
    ("bash", "Bash"),
    ("yaml", "YAML"),
    ("markdown", "Markdown"),
    ("xml", "XML"),
    ("php", "PHP"),
    ("go", "Go"),
    ("rust", "Rust"),
    ("swift", "Swift"),
    ("kotlin", "Kotlin"),
];

/// A parsed fence info string: "```lang:title".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FenceInfo {
    pub language: String,
    pub title: Option<String>,
}

impl FenceInfo {
    /// Splits an info string into language and title.
    ///
    /// The language is the first word before the first `:`; everything after
    /// the colon is the title. `"rust"` has no title, `"rust:"` neither.
    pub fn parse(info: &str) -> Self {
        let info = info.trim();
        let (lang_part, title) = match info.split_once(':') {
            Some((lang, title)) => (lang, Some(title.trim())),
            None => (info, None),
        };
        let language = lang_part
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();
        let title = title.filter(|t| !t.is_empty()).map(str::to_string);
        Self { language, title }
    }

    /// Inverse of [`FenceInfo::parse`] for well-formed values.
    pub fn to_info_string(&self) -> String {
        match &self.title {
            Some(title) => format!("{}:{}", self.language, title),
            None => self.language.clone(),
        }
    }
}

/// Human-facing label for a language identifier.
///
/// Known identifiers use the editor's label (`cpp` -> `C++`); anything else
/// gets its first letter capitalized.
pub fn language_label(language: &str) -> Option<String> {
    let language = language.trim();
    if language.is_empty() {
        return None;
    }
    if let Some((_, label)) = SUPPORTED_LANGUAGES
        .iter()
        .find(|(id, _)| id.eq_ignore_ascii_case(language))
    {
        return Some((*label).to_string());
    }
    let mut chars = language.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

impl CodeBlock {
    pub fn new(info: FenceInfo, body: impl Into<String>) -> Self {
        Self {
            language: info.language,
            title: info.title,
            body: body.into(),
        }
    }

    pub fn info(&self) -> FenceInfo {
        FenceInfo {
            language: self.language.clone(),
            title: self.title.clone(),
        }
    }

    /// Re-emits the block as normalized markup: opening fence, body, closing fence.
    pub fn fenced(&self) -> String {
        format!(
            "{FENCE}{}\n{}\n{FENCE}",
            self.info().to_info_string(),
            self.body
        )
    }

    pub fn language_label(&self) -> Option<String> {
        language_label(&self.language)
    }

    /// Text placed on the clipboard: the raw body minus one trailing newline.
    pub fn copy_payload(&self) -> &str {
        self.body.strip_suffix('\n').unwrap_or(&self.body)
    }

    pub fn line_count(&self) -> usize {
        if self.body.is_empty() {
            0
        } else {
            self.body.lines().count()
        }
    }
}

/// Every code block in `blocks`, in document order, including blocks nested
/// in lists and quotes. The index of a block here is the index the renderer
/// uses for its element id.
pub fn code_blocks(blocks: &[BlockNode]) -> Vec<&CodeBlock> {
    let mut out = Vec::new();
    collect_code_blocks(blocks, &mut out);
    out
}

fn collect_code_blocks<'a>(blocks: &'a [BlockNode], out: &mut Vec<&'a CodeBlock>) {
    for block in blocks {
        match &block.kind {
            BlockKind::CodeBlock { block } => out.push(block),
            BlockKind::BlockQuote { blocks } => collect_code_blocks(blocks, out),
            BlockKind::List { list } => {
                for item in &list.items {
                    collect_code_blocks(&item.blocks, out);
                }
            }
            _ => {}
        }
    }
}

/// A snippet being composed in the editor before it is inserted into a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSnippet {
    pub language: String,
    pub title: String,
    pub code: String,
}

impl Default for CodeSnippet {
    fn default() -> Self {
        Self {
            language: "javascript".to_string(),
            title: String::new(),
            code: String::new(),
        }
    }
}

impl CodeSnippet {
    /// Whitespace-only snippets are not inserted.
    pub fn is_insertable(&self) -> bool {
        !self.code.trim().is_empty()
    }

    fn info(&self) -> FenceInfo {
        FenceInfo {
            language: self.language.trim().to_string(),
            title: Some(self.title.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        }
    }

    /// The fenced block shown under the editor.
    pub fn preview(&self) -> String {
        format!(
            "{FENCE}{}\n{}\n{FENCE}",
            self.info().to_info_string(),
            self.code
        )
    }

    /// The text spliced into the post body, padded with newlines so the
    /// fence lands on its own lines.
    pub fn to_fenced(&self) -> String {
        format!("\n{}\n", self.preview())
    }

    pub fn clear(&mut self) {
        self.code.clear();
        self.title.clear();
    }
}
