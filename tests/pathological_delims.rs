use std::time::{Duration, Instant};

use folio::ast::{BlockKind, Inline, plain_text};
use folio::parse;

#[test]
fn pathological_open_delimiter_runs_are_treated_as_text() {
    // huge runs of opening delimiters that would otherwise trigger quadratic
    // scanning in the inline parser. a bare line of `*` is a thematic break,
    // hence the leading letter.
    let cases = [
        ("brackets", "[".repeat(20_000)),
        ("tildes", "~".repeat(20_000)),
        ("stars", format!("a{}", "*".repeat(20_000))),
    ];

    for (name, src) in cases {
        let parse_out = parse::parse_document(&src);

        assert!(
            parse_out
                .diagnostics
                .iter()
                .any(|d| d.code.as_deref() == Some("markdown.inline.pathological_delim_run")),
            "expected delimiter-run diagnostic for case '{name}'"
        );

        let Some(first_block) = parse_out.document.blocks.first() else {
            panic!("expected at least one block for case '{name}'");
        };

        match &first_block.kind {
            BlockKind::Paragraph { content } => {
                assert_eq!(content.len(), 1, "expected a single text inline for '{name}'");
            }
            other => panic!("expected Paragraph for '{name}', got {other:?}"),
        }
    }
}

#[test]
fn short_runs_still_parse_emphasis() {
    let parse_out = parse::parse_document("**bold** and *em*");
    assert!(parse_out.diagnostics.is_empty());
}

#[test]
fn unclosed_link_destinations_stay_linear() {
    // each `[` pairs with a `]` whose `(` never closes; rescanning the tail
    // for every opener made these quadratic.
    let cases = [
        ("bare", "[a](".repeat(50_000)),
        ("angle", "[a](<".repeat(40_000)),
        ("title", format!("[a](x \"{}", "[a](x '".repeat(30_000))),
        ("autolink", "<a".repeat(100_000)),
        ("bare url parens", format!("https://x{}", ")".repeat(200_000))),
    ];

    for (name, src) in cases {
        let started = Instant::now();
        let parse_out = parse::parse_document(&src);
        let elapsed = started.elapsed();
        assert!(
            elapsed < Duration::from_secs(5),
            "case '{name}' took {elapsed:?}"
        );

        let Some(first_block) = parse_out.document.blocks.first() else {
            panic!("expected at least one block for case '{name}'");
        };
        let BlockKind::Paragraph { content } = &first_block.kind else {
            panic!("expected Paragraph for '{name}', got {:?}", first_block.kind);
        };
        assert!(
            !content.iter().any(|i| matches!(i, Inline::Image { .. })),
            "unexpected image for '{name}'"
        );
        if name != "bare url parens" {
            assert_eq!(plain_text(content), src, "case '{name}' should stay text");
        }
    }
}

#[test]
fn links_after_an_unclosed_destination_still_parse() {
    let parse_out = parse::parse_document("[a](x [b](y) and [c](<z>)");
    let BlockKind::Paragraph { content } = &parse_out.document.blocks[0].kind else {
        panic!("expected Paragraph");
    };
    let hrefs: Vec<&str> = content
        .iter()
        .filter_map(|i| match i {
            Inline::Link { link } => Some(link.href.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(hrefs, vec!["y", "z"]);
}
