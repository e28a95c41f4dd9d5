//! Node tree for rendered post content, plus its JSON envelope.
//!
//! This module is the contract between:
//! 1) parsing normalized markup -> `Document`, and
//! 2) rendering `Document` -> styled HTML.
//!
//! Trees are built fresh on every parse, never mutated afterwards, and are
//! owned by whoever asked for them. They serialize to a stable JSON shape so
//! a rendering problem can be inspected on disk.

mod diagnostic;
mod envelope;
mod nodes;
mod span;

pub use diagnostic::*;
pub use envelope::*;
pub use nodes::*;
pub use span::*;

/// JSON schema version for the AST envelope.
///
/// Bump this when making non-backwards-compatible changes to the JSON structure.
pub const SCHEMA_VERSION: u32 = 1;

pub const PARSER_NAME: &str = "folio";

pub const PARSER_VERSION: &str = env!("CARGO_PKG_VERSION");
