//! Post files: YAML frontmatter plus a stored body.
//!
//! Existing frontmatter is read and kept; missing fields are derived from
//! the body (title from the first heading, slug from the title, excerpt from
//! the first paragraph, reading time from the word count). Unknown keys are
//! carried through untouched.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;
use std::{fs, io};

use deunicode::deunicode;
use html_escape::{encode_double_quoted_attribute, encode_text};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use time::{OffsetDateTime, macros::format_description};
use tracing::warn;

use crate::ast::*;

/// Average reading speed used for the estimate.
pub const WORDS_PER_MINUTE: usize = 200;

const EXCERPT_MAX_CHARS: usize = 160;
const TAG_MAX_LEN: usize = 50;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("HTML_TAG: hardcoded regex is valid"));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub slug: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,

    /// A YAML list, or the form's comma separated string.
    #[serde(default, deserialize_with = "tag_field")]
    pub tags: Vec<String>,

    /// Estimated minutes; 0 means not yet computed.
    #[serde(default)]
    pub reading_time: u32,

    /// `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,

    /// Keys this crate does not manage, preserved on rewrite.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PostMeta {
    pub fn to_yaml_string(&self) -> Result<String, serde_yaml::Error> {
        let body = serde_yaml::to_string(self)?;
        Ok(format!("---\n{body}---\n"))
    }
}

fn tag_field<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tags {
        List(Vec<String>),
        Field(String),
    }

    Ok(match Option::<Tags>::deserialize(deserializer)? {
        Some(Tags::List(tags)) => tags,
        Some(Tags::Field(raw)) => parse_tag_list(&raw),
        None => Vec::new(),
    })
}

/// If `text` starts with YAML frontmatter (`---` ... `---`), return the frontmatter
/// block verbatim (including both `---` lines and their original newlines) and
/// the remainder of the document.
pub fn split_yaml_frontmatter(text: &str) -> Option<(String, &str)> {
    if !(text.starts_with("---\n") || text.starts_with("---\r\n")) {
        return None;
    }

    let mut pos = 0usize;
    let mut lines = text.split_inclusive('\n');
    let first = lines.next()?;
    pos += first.len();

    for line in lines {
        pos += line.len();
        if line.trim_end_matches(['\n', '\r']) == "---" {
            return Some((text[..pos].to_string(), &text[pos..]));
        }
    }
    None
}

/// Splits off and parses frontmatter.
///
/// A frontmatter block that is not valid YAML is logged and dropped; the body
/// after it is still returned.
pub fn parse_frontmatter(text: &str) -> (Option<PostMeta>, &str) {
    let Some((block, rest)) = split_yaml_frontmatter(text) else {
        return (None, text);
    };
    let inner = yaml_inner(&block);
    if inner.trim().is_empty() {
        return (Some(PostMeta::default()), rest);
    }
    match serde_yaml::from_str::<PostMeta>(&inner) {
        Ok(meta) => (Some(meta), rest),
        Err(err) => {
            warn!(error = %err, "ignoring invalid frontmatter");
            (None, rest)
        }
    }
}

fn yaml_inner(block: &str) -> String {
    let mut out = String::new();
    for line in block.lines().skip(1) {
        if line.trim_end() == "---" {
            break;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Fills in missing metadata for a post.
///
/// Author-supplied fields (title, slug, excerpt, tags, unknown keys) are kept.
/// An author slug is still run through [`slugify`].
/// With `regenerate`, the derived fields (reading time and updated date) are
/// recomputed even when present.
pub fn build_frontmatter(
    path: &Path,
    doc: &Document,
    body: &str,
    existing: Option<PostMeta>,
    regenerate: bool,
) -> io::Result<PostMeta> {
    let mut meta = existing.unwrap_or_default();
    if regenerate {
        meta.reading_time = 0;
        meta.updated = None;
    }

    if meta.title.trim().is_empty() {
        meta.title = first_heading(doc)
            .or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().replace(['-', '_'], " "))
            })
            .unwrap_or_default();
    }
    // the slug names the output file, so author values get the same rules.
    let author_slug = slugify(&meta.slug);
    if !meta.slug.is_empty() && author_slug != meta.slug {
        warn!(
            path = %path.display(),
            slug = %meta.slug,
            cleaned = %author_slug,
            "rewrote frontmatter slug"
        );
    }
    meta.slug = if author_slug.is_empty() {
        slugify(&meta.title)
    } else {
        author_slug
    };
    if meta.excerpt.as_deref().is_none_or(|e| e.trim().is_empty()) {
        meta.excerpt = first_paragraph(doc).map(|p| excerpt(&p, EXCERPT_MAX_CHARS));
    }

    let mut tags: Vec<String> = meta.tags.iter().filter_map(|t| normalize_tag(t)).collect();
    tags.sort();
    tags.dedup();
    meta.tags = tags;

    if meta.reading_time == 0 {
        meta.reading_time = reading_time_minutes(body);
    }
    if meta.updated.is_none() {
        meta.updated = Some(file_mod_date(path)?);
    }
    Ok(meta)
}

fn first_heading(doc: &Document) -> Option<String> {
    doc.blocks.iter().find_map(|b| match &b.kind {
        BlockKind::Heading { content, .. } => {
            Some(plain_text(content).trim().to_string()).filter(|t| !t.is_empty())
        }
        _ => None,
    })
}

fn first_paragraph(doc: &Document) -> Option<String> {
    doc.blocks.iter().find_map(|b| match &b.kind {
        BlockKind::Paragraph { content } => {
            let text = plain_text(content).split_whitespace().collect::<Vec<_>>().join(" ");
            Some(text).filter(|t| !t.is_empty())
        }
        _ => None,
    })
}

/// Cuts `text` at a word boundary so the result, plus an ellipsis, fits `max` chars.
fn excerpt(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    for word in text.split_whitespace() {
        let extra = if out.is_empty() { 0 } else { 1 };
        if out.chars().count() + extra + word.chars().count() + 1 > max {
            break;
        }
        if extra == 1 {
            out.push(' ');
        }
        out.push_str(word);
    }
    if out.is_empty() {
        out = text.chars().take(max.saturating_sub(1)).collect();
    }
    out.push('…');
    out
}

fn file_mod_date(path: &Path) -> io::Result<String> {
    let mtime = fs::metadata(path)?.modified()?;
    let dt = OffsetDateTime::from(mtime);
    let fmt = format_description!("[year]-[month]-[day]");
    Ok(dt.format(&fmt).unwrap_or_else(|_| "1970-01-01".to_string()))
}

/// URL slug for a title: transliterated, lowercase, whitespace runs become
/// `-`, everything outside `[a-z0-9-]` is dropped.
pub fn slugify(title: &str) -> String {
    let ascii = deunicode(title.trim()).to_ascii_lowercase();
    let mut out = String::with_capacity(ascii.len());
    let mut in_space = false;
    for ch in ascii.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' {
            out.push(ch);
        }
    }
    out
}

/// Minutes to read `content` at [`WORDS_PER_MINUTE`], rounded up. Markup tags
/// are not counted. Never less than 1.
pub fn reading_time_minutes(content: &str) -> u32 {
    let text = HTML_TAG.replace_all(content, " ");
    let words = text.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1) as u32
}

/// Splits a comma separated tag field, dropping empty entries.
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalize a tag for use in URLs and filters.
///
/// - Transliterated to ASCII and lowercased
/// - Only `a-z`, `0-9` and `-`; other runs become a single `-`
/// - No leading or trailing `-`
/// - At most 50 chars
pub fn normalize_tag(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let s = deunicode(raw).to_ascii_lowercase();
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            'a'..='z' | '0'..='9' => out.push(ch),
            _ => {
                if !out.ends_with('-') {
                    out.push('-');
                }
            }
        }
    }

    let mut out = out.trim_matches('-').to_string();
    if out.len() > TAG_MAX_LEN {
        out.truncate(TAG_MAX_LEN);
        out = out.trim_end_matches('-').to_string();
    }
    if out.is_empty() { None } else { Some(out) }
}

/// Wraps rendered body HTML in a post page header.
pub fn render_page(meta: &PostMeta, body_html: &str) -> String {
    let mut out = String::from("<article class=\"max-w-4xl mx-auto\">\n<header class=\"mb-8\">\n");
    out.push_str(&format!(
        "<h1 class=\"text-4xl md:text-5xl font-bold mb-6 tracking-tight\">{}</h1>\n",
        encode_text(&meta.title)
    ));

    out.push_str("<div class=\"flex items-center gap-6 text-muted-foreground mb-6\">");
    if let Some(updated) = &meta.updated {
        out.push_str(&format!(
            "<time datetime=\"{}\">{}</time>",
            encode_double_quoted_attribute(updated),
            encode_text(updated)
        ));
    }
    if meta.reading_time > 0 {
        out.push_str(&format!("<span>{} min read</span>", meta.reading_time));
    }
    out.push_str("</div>\n");

    if !meta.tags.is_empty() {
        out.push_str("<div class=\"flex flex-wrap gap-2\">");
        for tag in &meta.tags {
            out.push_str(&format!(
                "<span class=\"inline-flex items-center rounded-full border px-2.5 py-0.5 text-xs font-semibold\">{}</span>",
                encode_text(tag)
            ));
        }
        out.push_str("</div>\n");
    }
    out.push_str("</header>\n");
    out.push_str(body_html);
    out.push_str("\n</article>\n");
    out
}
