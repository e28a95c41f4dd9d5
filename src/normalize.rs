//! Read-path normalization of stored post bodies.
//!
//! Bodies arrive either as clean markup with fenced code blocks, or as rich
//! editor HTML where every line (code lines included) sits in its own
//! `<p>...</p>`. Normalization turns both into the markup dialect the parser
//! understands. It never fails; the worst outcome is degraded text.
//!
//! The conversion path runs two passes in sequence:
//! 1. [`lift_code_runs`] pulls paragraph-wrapped fenced code out of the
//!    markup so nothing downstream can touch it.
//! 2. [`clean_markup`] strips tags and decodes entities in what remains.
//!
//! Keeping the passes separate means a rewrite in pass 2 can never re-match
//! text produced by pass 1.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::ast::CodeBlock;
use crate::code::{FENCE, FenceInfo};

/// `<p>```lang[:title]</p> ... <p>```</p>`, shortest interior first.
static CODE_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<p>```([\w+#.-]+)(:[^<]*)?</p>((?s:.*?))<p>\s*```\s*</p>")
        .expect("CODE_RUN: hardcoded regex is valid")
});

static BR_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("BR_TAG: hardcoded regex is valid"));

static P_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<p(?:\s[^<>]*)?>").expect("P_OPEN: hardcoded regex is valid")
});

static DIV_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<div(?:\s[^<>]*)?>").expect("DIV_OPEN: hardcoded regex is valid")
});

/// Any other open, close or self-closing tag. Requires a letter right after
/// `<` so comparisons like `a < b` survive.
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"</?[A-Za-z][A-Za-z0-9-]*(?:\s[^<>]*)?/?>")
        .expect("ANY_TAG: hardcoded regex is valid")
});

static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n").expect("BLANK_RUN: hardcoded regex is valid"));

/// Entities decoded inside lifted code.
const CODE_ENTITIES: &[(&str, &str)] = &[
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&amp;", "&"),
    ("&quot;", "\""),
    ("&#39;", "'"),
];

/// Entities decoded in prose: the code set plus `&nbsp;`.
const TEXT_ENTITIES: &[(&str, &str)] = &[
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&amp;", "&"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&nbsp;", " "),
];

/// A piece of conversion-path output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Residual markup, still to be cleaned.
    Markup(&'a str),
    /// A fenced run lifted out of paragraph-wrapped markup.
    Code(CodeBlock),
}

/// Normalizes a stored post body into markup-light text.
///
/// Content that already contains a fence and no `<p>`/`<div>` is returned
/// unchanged, which keeps the function idempotent on its own output.
pub fn normalize(raw: &str) -> String {
    if is_normalized(raw) {
        debug!(len = raw.len(), "content already normalized");
        return raw.to_string();
    }

    let segments = lift_code_runs(raw);
    let lifted = segments
        .iter()
        .filter(|s| matches!(s, Segment::Code(_)))
        .count();
    debug!(len = raw.len(), lifted, "converting rich-editor markup");
    assemble(segments)
}

/// The fast-path check.
pub fn is_normalized(raw: &str) -> bool {
    raw.contains(FENCE) && !raw.contains("<p>") && !raw.contains("<div>")
}

/// Pass 1: splits `raw` into residual markup and lifted code blocks.
///
/// A fence-open paragraph with no matching close paragraph is not a run; it
/// stays inside the surrounding markup segment.
pub fn lift_code_runs(raw: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0usize;

    for caps in CODE_RUN.captures_iter(raw) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > last {
            segments.push(Segment::Markup(&raw[last..whole.start()]));
        }

        let language = caps.get(1).map_or("", |m| m.as_str());
        let title = caps
            .get(2)
            .map(|m| decode_entities(m.as_str().trim_start_matches(':'), CODE_ENTITIES))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let interior = caps.get(3).map_or("", |m| m.as_str());

        let info = FenceInfo {
            language: language.to_string(),
            title,
        };
        segments.push(Segment::Code(CodeBlock::new(info, code_run_body(interior))));
        last = whole.end();
    }

    if last < raw.len() {
        segments.push(Segment::Markup(&raw[last..]));
    }
    segments
}

/// Turns the paragraph-wrapped interior of a code run back into source lines.
fn code_run_body(interior: &str) -> String {
    let interior = BR_TAG.replace_all(interior, "\n");
    let mut lines: Vec<&str> = Vec::new();

    for piece in interior.split("</p>") {
        match piece.find("<p>") {
            Some(open) => {
                let before = piece[..open].trim_matches(['\n', '\r']);
                if !before.trim().is_empty() {
                    lines.push(before);
                }
                lines.push(&piece[open + "<p>".len()..]);
            }
            None => {
                // formatting whitespace between paragraphs is not content.
                let loose = piece.trim_matches(['\n', '\r']);
                if !loose.trim().is_empty() {
                    lines.push(loose);
                }
            }
        }
    }

    let decoded = decode_entities(&lines.join("\n"), CODE_ENTITIES);
    trim_blank_lines(&decoded).to_string()
}

/// Drops whole blank lines from both ends, leaving indentation intact.
fn trim_blank_lines(s: &str) -> &str {
    let lines: Vec<&str> = s.split('\n').collect();
    let Some(first) = lines.iter().position(|l| !l.trim().is_empty()) else {
        return "";
    };
    let last = lines
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .unwrap_or(first);

    let start: usize = lines[..first].iter().map(|l| l.len() + 1).sum();
    let end: usize = start + lines[first..=last].iter().map(|l| l.len() + 1).sum::<usize>() - 1;
    &s[start..end]
}

/// Pass 2: strips markup from a residual segment and tidies whitespace.
pub fn clean_markup(markup: &str) -> String {
    let text = markup.replace("<p></p>", "\n");
    let text = BR_TAG.replace_all(&text, "\n");
    let text = P_OPEN.replace_all(&text, "");
    let text = text.replace("</p>", "\n");
    let text = DIV_OPEN.replace_all(&text, "");
    let text = text.replace("</div>", "\n");
    let text = ANY_TAG.replace_all(&text, "");
    let text = decode_entities(&text, TEXT_ENTITIES);
    let text = BLANK_RUN.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Joins segments, keeping every fenced block on lines of its own.
fn assemble(segments: Vec<Segment<'_>>) -> String {
    let mut out = String::new();
    for segment in segments {
        let piece = match segment {
            Segment::Markup(markup) => clean_markup(markup),
            Segment::Code(block) => block.fenced(),
        };
        if piece.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(&piece);
    }
    out
}

/// Decodes the entities in `table` in a single left-to-right pass, so the
/// output of one replacement is never decoded again (`&amp;lt;` -> `&lt;`).
fn decode_entities(s: &str, table: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match table.iter().find(|(entity, _)| tail.starts_with(entity)) {
            Some((entity, decoded)) => {
                out.push_str(decoded);
                rest = &tail[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
