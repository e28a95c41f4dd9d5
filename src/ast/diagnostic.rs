use crate::ast::Span;
use serde::{Deserialize, Serialize};

/// Severity level of a diagnostic. Nothing in the pipeline is fatal: input
/// recoveries are warnings, and `Error` marks a block sub-parser that failed
/// to consume its line (the line is then skipped).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// The pipeline stage that produced the diagnostic. Normalizing and
/// rendering are total and report nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticPhase {
    Parse,
}

/// A structured record of a recovery decision, e.g. an unterminated fence
/// that was demoted to paragraph text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<DiagnosticPhase>,

    /// A stable identifier like `markdown.fence.unclosed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Human readable message.
    pub message: String,

    /// Span into the normalized input, if the recovery is tied to a location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Shorthand for the parser's warnings, which all share a phase and carry a code.
    pub fn parse_warning(code: &str, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            severity: Severity::Warning,
            phase: Some(DiagnosticPhase::Parse),
            code: Some(code.to_string()),
            message: message.into(),
            span,
            notes: vec![],
        }
    }
}
