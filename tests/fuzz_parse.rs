//! Lightweight fuzz-style tests; no external fuzz harness required.

use folio::{RenderOptions, ast::*, normalize, parse, render_html};

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
            BlockKind::Table { table } => {
                for row in &table.rows {
                    assert_eq!(row.len(), table.header.len(), "ragged table row");
                }
            }
            BlockKind::Heading { level, .. } => assert!((1..=4).contains(level)),
            BlockKind::Paragraph { .. } | BlockKind::CodeBlock { .. } | BlockKind::HorizontalRule => {}
        }
    }
}

#[derive(Clone)]
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    fn gen_range(&mut self, hi: usize) -> usize {
        (self.next_u64() as usize) % hi
    }
}

/// Markup fragments that steer random input toward interesting paths in
/// both the normalizer and the parser.
const TOKENS: &[&str] = &[
    "a", "b", "word", " ", "  ", "\n", "\n\n", "\t", "#", "## ", "> ", "- ", "1. ", "* ", "[ ] ",
    "|", "|---|", ":", "*", "**", "_", "~~", "`", "```", "```js", "```rust:main.rs", "[", "]",
    "(", ")", "![", "https://x.dev", "<p>", "</p>", "<p></p>", "<div>", "</div>", "<br>",
    "<strong>", "&lt;", "&gt;", "&amp;", "&quot;", "&#39;", "&nbsp;", "&", "<", ">", "é", "日本",
];

fn gen_post_like(rng: &mut XorShift64, tokens: usize) -> String {
    let mut s = String::new();
    for _ in 0..tokens {
        s.push_str(TOKENS[rng.gen_range(TOKENS.len())]);
    }
    s
}

#[test]
fn fuzz_pipeline_random_inputs_total_and_in_bounds() {
    // keep cases bounded so this doesn't slow down normal `cargo test` too much.
    let mut rng = XorShift64::new(0xC0FFEE);
    let opts = RenderOptions::default();
    for _case in 0..2_000 {
        let n = rng.gen_range(600);
        let input = gen_post_like(&mut rng, n);

        let normalized = normalize(&input);
        let out = parse::parse_document(&normalized);
        check_span(&out.document.span, normalized.len());
        check_blocks(&out.document.blocks, normalized.len());

        let again = parse::parse_document(&normalized);
        assert_eq!(out.document, again.document, "parse is not deterministic");
        assert_eq!(
            render_html(&out.document.blocks, &opts),
            render_html(&again.document.blocks, &opts)
        );
    }
}

#[test]
fn fuzz_normalize_is_idempotent_on_fast_path_output() {
    let mut rng = XorShift64::new(0xBADC0DE);
    for _case in 0..2_000 {
        let n = rng.gen_range(200);
        let input = gen_post_like(&mut rng, n);
        let once = normalize(&input);
        if normalize::is_normalized(&once) {
            assert_eq!(normalize(&once), once, "input: {input:?}");
        }
    }
}

#[test]
fn fuzz_unclosed_fence_does_not_swallow_earlier_blocks() {
    let input = "# Title\n\nbefore\n\n```js\nlet x = 1;\n\nstill code\n";
    let out = parse::parse_document(input);
    check_blocks(&out.document.blocks, input.len());

    assert!(matches!(out.document.blocks[0].kind, BlockKind::Heading { .. }));
    let Some(BlockNode {
        kind: BlockKind::Paragraph { content },
        ..
    }) = out.document.blocks.last()
    else {
        panic!("expected trailing paragraph");
    };
    assert!(plain_text(content).contains("still code"));
}
