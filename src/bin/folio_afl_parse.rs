//! AFL++ fuzz target for the `folio` pipeline.
//!
//! Reads one input from stdin and runs it through normalize -> parse ->
//! render. Build and run it via `cargo-afl`:
//!
//! ```bash
//! cargo install cargo-afl
//!
//! cargo afl build --release --features afl_fuzz --bin folio_afl_parse
//!
//! mkdir -p fuzz/afl/out
//!
//! cargo afl fuzz -i fuzz/afl/in -o fuzz/afl/out target/release/folio_afl_parse
//! ```
//!
//! AFL++ only treats signals and aborts as crashes, so any unwind is turned
//! into `abort()`.

use std::io::Read;

use folio::{ast::*, normalize, parse, render};

const MAX_INPUT_LEN: usize = 1_000_000; // 1MB guardrail; AFL++ will typically cap this anyway.

fn check_span(span: &Span, len: usize) {
    let s = span.start as usize;
    let e = span.end as usize;
    assert!(s <= e, "invalid span: start > end: {span:?}");
    assert!(e <= len, "span out of bounds (len={len}): {span:?}");
}

fn check_blocks(nodes: &[BlockNode], len: usize) {
    for n in nodes {
        check_span(&n.span, len);
        match &n.kind {
            BlockKind::List { list } => {
                for item in &list.items {
                    check_span(&item.span, len);
                    check_blocks(&item.blocks, len);
                }
            }
            BlockKind::BlockQuote { blocks } => check_blocks(blocks, len),
            BlockKind::Heading { .. }
            | BlockKind::Paragraph { .. }
            | BlockKind::Table { .. }
            | BlockKind::CodeBlock { .. }
            | BlockKind::HorizontalRule => {}
        }
    }
}

fn run_one_input(data: &[u8]) {
    if data.len() > MAX_INPUT_LEN {
        return;
    }

    let raw = String::from_utf8_lossy(data).to_string();
    let normalized = normalize::normalize(&raw);
    let out = parse::parse_document(&normalized);

    let ast_file = AstFile {
        schema_version: SCHEMA_VERSION,
        parser: ParserInfo {
            name: PARSER_NAME.to_string(),
            version: PARSER_VERSION.to_string(),
        },
        span_encoding: SpanEncoding::default(),
        post_id: "fuzz".to_string(),
        source: SourceInfo {
            path: None,
            byte_len: raw.len() as u64,
            normalized_len: normalized.len() as u64,
            converted: normalized != raw,
        },
        diagnostics: out.diagnostics,
        document: out.document,
    };

    check_span(&ast_file.document.span, normalized.len());
    check_blocks(&ast_file.document.blocks, normalized.len());

    // JSON round-trip must never panic.
    let json = serde_json::to_vec(&ast_file).unwrap();
    let back: AstFile = serde_json::from_slice(&json).unwrap();
    assert_eq!(back, ast_file);

    // parsing is deterministic.
    assert_eq!(parse::parse_document(&normalized).document, back.document);

    let _html = render::render_html(&back.document.blocks, &render::RenderOptions::default());
}

fn main() {
    let mut data = Vec::new();
    std::io::stdin().read_to_end(&mut data).unwrap();

    // convert any panic into an abort().
    if std::panic::catch_unwind(|| run_one_input(&data)).is_err() {
        std::process::abort();
    }
}
