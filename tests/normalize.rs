use folio::ast::BlockKind;
use folio::normalize::{Segment, is_normalized, lift_code_runs};
use folio::{normalize, render};

const RICH_DEMO: &str = "<p>Intro text</p>\
<p>```javascript:demo</p>\
<p>const a = 1;</p>\
<p>console.log(a &lt; 2 &amp;&amp; &quot;ok&quot;);</p>\
<p>```</p>\
<p>Outro</p>";

#[test]
fn rich_editor_code_run_becomes_one_fenced_block() {
    assert_eq!(
        normalize(RICH_DEMO),
        "Intro text\n\n```javascript:demo\nconst a = 1;\nconsole.log(a < 2 && \"ok\");\n```\n\nOutro"
    );
}

#[test]
fn normalize_is_idempotent_on_rich_and_clean_input() {
    let inputs = [
        RICH_DEMO,
        "# Title\n\nSome text with `code`.",
        "<p>Hello</p><p></p><p>World</p>",
        "```rust\nfn main() {}\n```",
        "",
    ];
    for input in inputs {
        let once = normalize(input);
        assert_eq!(normalize(&once), once, "input: {input:?}");
    }
}

#[test]
fn already_normalized_content_is_returned_unchanged() {
    let src = "Text  \n\n\n\n```sh\n  indented\n```\n";
    assert!(is_normalized(src));
    assert_eq!(normalize(src), src);
}

#[test]
fn empty_paragraphs_collapse_to_one_blank_line() {
    assert_eq!(normalize("<p>Hello</p><p></p><p>World</p>"), "Hello\n\nWorld");
    assert_eq!(normalize("<p>a</p><p></p><p></p><p></p><p>b</p>"), "a\n\nb");
}

#[test]
fn entities_outside_code_are_decoded_after_tags_are_stripped() {
    assert_eq!(normalize("<p>Use &lt;div&gt; for layout</p>"), "Use <div> for layout");
    assert_eq!(normalize("<p>a&nbsp;b</p>"), "a b");
}

#[test]
fn code_entities_decode_once() {
    assert_eq!(
        normalize("<p>```html</p><p>&amp;lt;b&amp;gt;</p><p>```</p>"),
        "```html\n&lt;b&gt;\n```"
    );
}

#[test]
fn non_breaking_space_stays_encoded_inside_code() {
    assert_eq!(
        normalize("<p>```txt</p><p>a&nbsp;b</p><p>```</p>"),
        "```txt\na&nbsp;b\n```"
    );
}

#[test]
fn code_indentation_and_breaks_survive() {
    assert_eq!(
        normalize("<p>```python</p><p>def f():</p><p>    return 1</p><p>```</p>"),
        "```python\ndef f():\n    return 1\n```"
    );
    assert_eq!(
        normalize("<p>```sh</p><p>a<br>b</p><p> ``` </p>"),
        "```sh\na\nb\n```"
    );
}

#[test]
fn blank_code_lines_at_the_edges_are_trimmed() {
    assert_eq!(
        normalize("<p>```go</p><p></p><p>x := 1</p><p></p><p>```</p>"),
        "```go\nx := 1\n```"
    );
}

#[test]
fn line_breaks_and_divs_become_newlines() {
    assert_eq!(normalize("<p>one<br/>two</p>"), "one\ntwo");
    assert_eq!(normalize("<div>one</div><div>two</div>"), "one\ntwo");
    assert_eq!(normalize("<p><strong>bold</strong> <em>it</em></p>"), "bold it");
}

#[test]
fn comparison_operators_are_not_tags() {
    assert_eq!(normalize("<p>if a < b and c > d</p>"), "if a < b and c > d");
}

#[test]
fn clean_prefix_is_kept_before_lifted_code() {
    assert_eq!(
        normalize("Intro\n\n<p>```rust</p><p>fn main() {}</p><p>```</p>"),
        "Intro\n\n```rust\nfn main() {}\n```"
    );
}

#[test]
fn unclosed_rich_fence_degrades_to_text() {
    let normalized = normalize("<p>```js</p><p>let x = 1;</p><p>tail</p>");
    assert_eq!(normalized, "```js\nlet x = 1;\ntail");
    assert!(lift_code_runs("<p>```js</p><p>let x = 1;</p>")
        .iter()
        .all(|s| matches!(s, Segment::Markup(_))));

    // the renderer then shows it verbatim.
    let blocks = render(&normalized);
    assert_eq!(blocks.len(), 1);
    assert!(matches!(blocks[0].kind, BlockKind::Paragraph { .. }));
}

#[test]
fn two_runs_do_not_merge() {
    let normalized =
        normalize("<p>```a</p><p>1</p><p>```</p><p>mid</p><p>```b</p><p>2</p><p>```</p>");
    assert_eq!(normalized, "```a\n1\n```\n\nmid\n\n```b\n2\n```");
    let langs: Vec<String> = render(&normalized)
        .into_iter()
        .filter_map(|b| match b.kind {
            BlockKind::CodeBlock { block } => Some(block.language),
            _ => None,
        })
        .collect();
    assert_eq!(langs, vec!["a", "b"]);
}

#[test]
fn empty_and_whitespace_input() {
    assert_eq!(normalize(""), "");
    assert_eq!(normalize("   \n\n "), "");
    assert_eq!(normalize("<p></p>"), "");
}

/// Rich-editor output with empty paragraphs inside the code run, as saved by
/// the post editor's debugging view.
const EMPTY_PARAGRAPHS_IN_CODE: &str = "
<p>This is a test blog post with a code snippet:</p>
<p>```javascript:Hello world</p>
<p></p>
<p>let name = \"Fredrick\";</p>
<p></p>
<p></p>
<p></p>
<p></p>
<p>// console.log the variable name</p>
<p></p>
<p></p>
<p></p>
<p>console.log(name);</p>
<p></p>
<p>```</p>
<p>And this is the end of the post.</p>
  ";

#[test]
fn empty_paragraphs_inside_code_become_blank_lines() {
    // blank runs are collapsed in prose only; inside the code run every
    // empty paragraph stays a blank line and only the edges are trimmed.
    let code = "let name = \"Fredrick\";\n\n\n\n\n\
                // console.log the variable name\n\n\n\n\
                console.log(name);";
    let normalized = normalize(EMPTY_PARAGRAPHS_IN_CODE);
    assert_eq!(
        normalized,
        format!(
            "This is a test blog post with a code snippet:\n\n\
             ```javascript:Hello world\n{code}\n```\n\n\
             And this is the end of the post."
        )
    );

    let blocks = render(&normalized);
    assert_eq!(blocks.len(), 3);
    let BlockKind::CodeBlock { block } = &blocks[1].kind else {
        panic!("expected code block, got {:?}", blocks[1].kind);
    };
    assert_eq!(block.title.as_deref(), Some("Hello world"));
    assert_eq!(block.copy_payload(), code);
    assert_eq!(block.line_count(), 10);
}
