use crate::ast::{Diagnostic, Document};
use serde::{Deserialize, Serialize};

/// Top-level JSON file written next to a rendered post when `--json` is set.
///
/// Wraps the parsed `Document` with enough metadata to debug a rendering
/// problem without re-running the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AstFile {
    pub schema_version: u32,

    pub parser: ParserInfo,

    /// How to interpret all `Span` values contained in this file.
    pub span_encoding: SpanEncoding,

    /// Slug of the post the tree was rendered for.
    pub post_id: String,

    pub source: SourceInfo,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,

    pub document: Document,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEncoding {
    pub unit: SpanUnit,
    pub base: SpanBase,
}

impl Default for SpanEncoding {
    fn default() -> Self {
        Self {
            unit: SpanUnit::Byte,
            base: SpanBase::NormalizedInput,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanUnit {
    /// Byte offsets (UTF-8).
    Byte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanBase {
    /// Offsets are measured against the output of `normalize`, which is
    /// what the parser consumes. The raw stored body is not addressable.
    NormalizedInput,
}

/// Where the content came from and how the normalizer treated it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Length of the stored body in bytes, before normalization.
    pub byte_len: u64,

    /// Length of the normalized markup the spans refer to.
    pub normalized_len: u64,

    /// False when the body was already markup-light and passed through untouched.
    pub converted: bool,
}
