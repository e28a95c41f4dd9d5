use folio::ast::{BlockKind, Inline};
use folio::code::code_blocks;
use folio::{RenderOptions, content_to_html, render, render_html};

fn bare() -> RenderOptions {
    RenderOptions {
        wrapper_class: None,
        ..RenderOptions::default()
    }
}

const POST: &str = "## Setup\n\
\n\
Install with `cargo install folio` and read the [docs](https://docs.rs).\n\
\n\
```bash:install.sh\n\
cargo install folio\n\
```\n\
\n\
> Note: **bold** and *italic*.\n\
\n\
1. first\n\
2. second\n\
\n\
| Name | Size |\n\
|:-----|-----:|\n\
| a    | 1    |\n\
\n\
![diagram](/img/flow.png)\n";

#[test]
fn render_is_deterministic() {
    assert_eq!(render(POST), render(POST));
    let opts = RenderOptions::default();
    assert_eq!(content_to_html(POST, &opts), content_to_html(POST, &opts));
}

#[test]
fn block_structure_of_a_typical_post() {
    let blocks = render(POST);
    let kinds: Vec<&str> = blocks
        .iter()
        .map(|b| match &b.kind {
            BlockKind::Heading { .. } => "heading",
            BlockKind::Paragraph { .. } => "paragraph",
            BlockKind::List { .. } => "list",
            BlockKind::BlockQuote { .. } => "quote",
            BlockKind::Table { .. } => "table",
            BlockKind::CodeBlock { .. } => "code",
            BlockKind::HorizontalRule => "rule",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["heading", "paragraph", "code", "quote", "list", "table", "paragraph"]
    );

    let BlockKind::Paragraph { content } = &blocks[6].kind else {
        panic!("expected image paragraph");
    };
    assert!(matches!(&content[0], Inline::Image { image } if image.src == "/img/flow.png"));
}

#[test]
fn code_block_and_inline_code_render_differently() {
    let html = render_html(&render(POST), &bare());

    // block code: label, title, copy button, language class.
    assert!(html.contains(">Bash</span>"));
    assert!(html.contains(">install.sh</span>"));
    assert!(html.contains("data-copy-target=\"code-0\">Copy</button>"));
    assert!(html.contains("<code id=\"code-0\" class=\"language-bash\">cargo install folio</code>"));

    // inline code: no button, no label.
    assert!(html.contains("<code class=\"bg-muted px-1.5 py-0.5 rounded text-sm font-mono text-primary\">cargo install folio</code>"));
    assert_eq!(html.matches("<button").count(), 1);
}

#[test]
fn code_ids_follow_document_order_through_containers() {
    let src = "```a\n1\n```\n\n- item\n\n  ```b\n  2\n  ```\n\n> ```c\n> 3\n> ```\n";
    let blocks = render(src);
    let html = render_html(&blocks, &bare());

    for (i, block) in code_blocks(&blocks).iter().enumerate() {
        let needle = format!(
            "<code id=\"code-{i}\" class=\"language-{}\">{}</code>",
            block.language, block.body
        );
        assert!(html.contains(&needle), "missing {needle} in {html}");
    }
}

#[test]
fn code_body_is_escaped_and_verbatim() {
    let html = render_html(
        &render("```html\n<div class=\"a\">\n    &amp;\n</div>\n```"),
        &bare(),
    );
    assert!(html.contains("&lt;div class=\"a\"&gt;\n    &amp;amp;\n&lt;/div&gt;</code>"));
}

#[test]
fn headings_clamp_to_four_levels() {
    let html = render_html(&render("# One\n\n#### Four\n\n###### Six"), &bare());
    assert!(html.contains("<h1 "));
    assert_eq!(html.matches("<h4 ").count(), 2);
    assert!(!html.contains("<h5") && !html.contains("<h6"));
}

#[test]
fn unterminated_fence_renders_as_plain_paragraph() {
    let html = render_html(&render("intro\n\n```js\nlet a = 1 < 2;\n"), &bare());
    assert!(html.contains("```js\nlet a = 1 &lt; 2;</p>"), "{html}");
    assert!(!html.contains("<pre"));
}

#[test]
fn raw_markup_in_text_is_escaped() {
    let html = render_html(&render("<script>alert(1)</script>"), &bare());
    assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(!html.contains("<script>"));
}

#[test]
fn script_links_are_neutralized() {
    let html = render_html(&render("[x](javascript:alert(1))"), &bare());
    assert!(html.contains("href=\"#\""), "{html}");
}

#[test]
fn table_alignment_is_rendered() {
    let html = render_html(&render(POST), &bare());
    assert!(html.contains("<th class=\"border border-border bg-muted px-4 py-2 text-left font-semibold text-foreground\" style=\"text-align: left\">Name</th>"));
    assert!(html.contains("style=\"text-align: right\">1</td>"));
}

#[test]
fn copy_button_can_be_disabled() {
    let opts = RenderOptions {
        copy_button: false,
        ..bare()
    };
    let html = render_html(&render("```rust\nfn main() {}\n```"), &opts);
    assert!(!html.contains("<button"));
    assert!(html.contains("id=\"code-0\""));
}
