use std::fs;
use std::path::PathBuf;

use folio::ast::*;
use folio::{normalize, parse, render_html, RenderOptions};

fn round_trip(raw: &str) {
    let normalized = normalize(raw);
    let parse_out = parse::parse_document(&normalized);
    let ast = AstFile {
        schema_version: SCHEMA_VERSION,
        parser: ParserInfo {
            name: PARSER_NAME.to_string(),
            version: PARSER_VERSION.to_string(),
        },
        span_encoding: SpanEncoding::default(),
        post_id: "crasher".to_string(),
        source: SourceInfo {
            path: None,
            byte_len: raw.len() as u64,
            normalized_len: normalized.len() as u64,
            converted: normalized != raw,
        },
        diagnostics: parse_out.diagnostics,
        document: parse_out.document,
    };

    let json = serde_json::to_string_pretty(&ast).expect("serialize");
    let back: AstFile = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(ast, back);

    let _html = render_html(&back.document.blocks, &RenderOptions::default());
}

#[test]
fn crasher_nested_containers() {
    round_trip(include_str!("crashes/minimized000.txt"));
}

#[test]
fn crashers_do_not_panic() {
    let crash_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("crashes");

    let cases = ["minimized000.txt", "minimized001.txt", "minimized002.txt"];

    let mut failures = Vec::new();

    for file in cases {
        let path = crash_dir.join(file);

        let bytes =
            fs::read(&path).unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));

        // decode like a fuzz harness would: accept arbitrary bytes.
        let src = String::from_utf8_lossy(&bytes).into_owned();

        // catch panic so we can say which file caused it.
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| round_trip(&src)));

        if let Err(panic_payload) = result {
            let msg = if let Some(s) = panic_payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = panic_payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "<non-string panic payload>".to_string()
            };

            failures.push(format!("{} panicked: {}", file, msg));
        }
    }

    assert!(
        failures.is_empty(),
        "pipeline panicked on one or more minimized inputs:\n{}",
        failures.join("\n")
    );
}

#[test]
fn unclosed_rich_editor_fence_keeps_its_text() {
    let raw = include_str!("crashes/minimized001.txt");
    let normalized = normalize(raw);
    assert!(normalized.contains("fn &lt;"), "{normalized}");
    let out = parse::parse_document(&normalized);
    assert!(
        out.diagnostics
            .iter()
            .any(|d| d.code.as_deref() == Some("markdown.fence.unclosed"))
    );
}
