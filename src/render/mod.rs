//! AST -> styled HTML renderer.
//!
//! Operates only on the parsed tree; it never looks at normalized text. All
//! text and attribute values go through `html-escape`, so raw markup in a
//! post body is displayed rather than interpreted.

use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::{Deserialize, Serialize};

use crate::ast::*;

/// Rendering options that control output decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Emit a Copy button in each code block header.
    pub copy_button: bool,

    /// Add `target="_blank" rel="noopener noreferrer"` to links.
    pub links_in_new_tab: bool,

    /// Prefix for code element ids; the block index is appended.
    pub code_id_prefix: String,

    /// Class of the wrapping `<div>`; `None` renders the blocks bare.
    pub wrapper_class: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            copy_button: true,
            links_in_new_tab: true,
            code_id_prefix: "code-".to_string(),
            wrapper_class: Some("markdown-content max-w-none prose prose-lg".to_string()),
        }
    }
}

#[derive(Debug, Default)]
struct RenderContext {
    /// Code blocks rendered so far; used for element ids.
    code_blocks: usize,
}

const H1_CLASS: &str = "text-4xl font-bold mt-8 mb-4 text-foreground border-b border-border pb-2";
const H2_CLASS: &str = "text-3xl font-semibold mt-8 mb-4 text-foreground";
const H3_CLASS: &str = "text-2xl font-semibold mt-6 mb-3 text-foreground";
const H4_CLASS: &str = "text-xl font-semibold mt-6 mb-3 text-foreground";
const P_CLASS: &str = "text-foreground leading-relaxed mb-4";
const BLOCKQUOTE_CLASS: &str =
    "border-l-4 border-primary pl-4 py-2 my-4 bg-muted/50 italic text-muted-foreground";
const UL_CLASS: &str = "list-disc list-inside mb-4 text-foreground space-y-1";
const OL_CLASS: &str = "list-decimal list-inside mb-4 text-foreground space-y-1";
const LI_CLASS: &str = "text-foreground";
const A_CLASS: &str = "text-primary hover:text-primary/80 underline transition-colors";
const IMG_CLASS: &str = "rounded-lg shadow-md max-w-full h-auto my-6";
const TABLE_WRAP_CLASS: &str = "overflow-x-auto my-6";
const TABLE_CLASS: &str = "min-w-full border border-border rounded-lg";
const TH_CLASS: &str = "border border-border bg-muted px-4 py-2 text-left font-semibold text-foreground";
const TD_CLASS: &str = "border border-border px-4 py-2 text-foreground";
const STRONG_CLASS: &str = "font-semibold text-foreground";
const EM_CLASS: &str = "italic text-foreground";
const INLINE_CODE_CLASS: &str = "bg-muted px-1.5 py-0.5 rounded text-sm font-mono text-primary";
const HR_CLASS: &str = "my-8 border-border";

const CODE_WRAP_CLASS: &str = "relative group my-6";
const CODE_HEADER_CLASS: &str =
    "flex items-center justify-between bg-gray-800 px-4 py-2 rounded-t-lg border border-gray-700";
const CODE_LABEL_CLASS: &str = "text-gray-300 text-sm font-medium ml-2";
const CODE_TITLE_CLASS: &str = "text-gray-400 text-sm ml-2";
const COPY_BUTTON_CLASS: &str =
    "opacity-0 group-hover:opacity-100 transition-opacity text-gray-300 hover:text-white h-8 px-2 text-xs";
const PRE_CLASS: &str = "bg-gray-900 border border-gray-700 border-t-0 rounded-b-lg overflow-x-auto p-4 m-0";

/// Text of the copy button before and after a successful copy.
pub const COPY_LABEL: &str = "Copy";
pub const COPIED_LABEL: &str = "Copied!";

/// Renders `blocks` to HTML. Output is deterministic for a given tree and
/// options; empty input renders to an empty string.
pub fn render_html(blocks: &[BlockNode], opts: &RenderOptions) -> String {
    if blocks.is_empty() {
        return String::new();
    }

    let mut ctx = RenderContext::default();
    let body = render_blocks(blocks, &mut ctx, opts);
    match &opts.wrapper_class {
        Some(class) => format!(
            "<div class=\"{}\">\n{}\n</div>",
            encode_double_quoted_attribute(class),
            body
        ),
        None => body,
    }
}

fn render_blocks(blocks: &[BlockNode], ctx: &mut RenderContext, opts: &RenderOptions) -> String {
    blocks
        .iter()
        .map(|b| render_block(b, ctx, opts))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_block(block: &BlockNode, ctx: &mut RenderContext, opts: &RenderOptions) -> String {
    match &block.kind {
        BlockKind::Heading { level, content } => {
            let (tag, class) = match level {
                0 | 1 => ("h1", H1_CLASS),
                2 => ("h2", H2_CLASS),
                3 => ("h3", H3_CLASS),
                _ => ("h4", H4_CLASS),
            };
            format!(
                "<{tag} class=\"{class}\">{}</{tag}>",
                render_inlines(content, opts)
            )
        }
        BlockKind::Paragraph { content } => {
            format!("<p class=\"{P_CLASS}\">{}</p>", render_inlines(content, opts))
        }
        BlockKind::List { list } => render_list(list, ctx, opts),
        BlockKind::BlockQuote { blocks } => format!(
            "<blockquote class=\"{BLOCKQUOTE_CLASS}\">\n{}\n</blockquote>",
            render_blocks(blocks, ctx, opts)
        ),
        BlockKind::Table { table } => render_table(table, opts),
        BlockKind::CodeBlock { block } => render_code_block(block, ctx, opts),
        BlockKind::HorizontalRule => format!("<hr class=\"{HR_CLASS}\" />"),
    }
}

fn render_list(list: &List, ctx: &mut RenderContext, opts: &RenderOptions) -> String {
    let (tag, class) = if list.ordered {
        ("ol", OL_CLASS)
    } else {
        ("ul", UL_CLASS)
    };
    let mut out = format!("<{tag} class=\"{class}\"");
    if let Some(start) = list.start {
        out.push_str(&format!(" start=\"{start}\""));
    }
    out.push_str(">\n");

    for item in &list.items {
        out.push_str(&format!("<li class=\"{LI_CLASS}\">"));
        if let Some(checked) = item.checked {
            out.push_str(if checked {
                "<input type=\"checkbox\" disabled checked /> "
            } else {
                "<input type=\"checkbox\" disabled /> "
            });
        }

        // a leading paragraph is inlined on the item line.
        let rest = match item.blocks.first() {
            Some(BlockNode {
                kind: BlockKind::Paragraph { content },
                ..
            }) => {
                out.push_str(&render_inlines(content, opts));
                &item.blocks[1..]
            }
            _ => &item.blocks[..],
        };
        if !rest.is_empty() {
            out.push('\n');
            out.push_str(&render_blocks(rest, ctx, opts));
            out.push('\n');
        }
        out.push_str("</li>\n");
    }

    out.push_str(&format!("</{tag}>"));
    out
}

fn render_table(table: &Table, opts: &RenderOptions) -> String {
    let mut out = format!(
        "<div class=\"{TABLE_WRAP_CLASS}\">\n<table class=\"{TABLE_CLASS}\">\n<thead>\n<tr>"
    );
    for (i, cell) in table.header.iter().enumerate() {
        out.push_str(&render_cell("th", TH_CLASS, cell, table.alignments.get(i), opts));
    }
    out.push_str("</tr>\n</thead>\n");

    if !table.rows.is_empty() {
        out.push_str("<tbody>\n");
        for row in &table.rows {
            out.push_str("<tr>");
            for (i, cell) in row.iter().enumerate() {
                out.push_str(&render_cell("td", TD_CLASS, cell, table.alignments.get(i), opts));
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</tbody>\n");
    }

    out.push_str("</table>\n</div>");
    out
}

fn render_cell(
    tag: &str,
    class: &str,
    cell: &TableCell,
    alignment: Option<&Alignment>,
    opts: &RenderOptions,
) -> String {
    let style = match alignment {
        Some(Alignment::Left) => " style=\"text-align: left\"",
        Some(Alignment::Center) => " style=\"text-align: center\"",
        Some(Alignment::Right) => " style=\"text-align: right\"",
        Some(Alignment::None) | None => "",
    };
    format!(
        "<{tag} class=\"{class}\"{style}>{}</{tag}>",
        render_inlines(&cell.content, opts)
    )
}

fn render_code_block(block: &CodeBlock, ctx: &mut RenderContext, opts: &RenderOptions) -> String {
    let id = format!("{}{}", opts.code_id_prefix, ctx.code_blocks);
    ctx.code_blocks += 1;

    let mut out = format!("<div class=\"{CODE_WRAP_CLASS}\">\n");
    out.push_str(&format!("<div class=\"{CODE_HEADER_CLASS}\">\n"));
    out.push_str("<div class=\"flex items-center gap-2\">");
    out.push_str(concat!(
        "<div class=\"flex gap-1\">",
        "<div class=\"w-3 h-3 rounded-full bg-red-500\"></div>",
        "<div class=\"w-3 h-3 rounded-full bg-yellow-500\"></div>",
        "<div class=\"w-3 h-3 rounded-full bg-green-500\"></div>",
        "</div>"
    ));
    if let Some(label) = block.language_label() {
        out.push_str(&format!(
            "<span class=\"{CODE_LABEL_CLASS}\">{}</span>",
            encode_text(&label)
        ));
    }
    if let Some(title) = &block.title {
        out.push_str(&format!(
            "<span class=\"{CODE_TITLE_CLASS}\">{}</span>",
            encode_text(title)
        ));
    }
    out.push_str("</div>\n");

    if opts.copy_button {
        out.push_str(&format!(
            "<button type=\"button\" class=\"{COPY_BUTTON_CLASS}\" data-copy-target=\"{}\">{COPY_LABEL}</button>\n",
            encode_double_quoted_attribute(&id)
        ));
    }
    out.push_str("</div>\n");

    out.push_str(&format!(
        "<pre class=\"{PRE_CLASS}\"><code id=\"{}\"",
        encode_double_quoted_attribute(&id)
    ));
    if !block.language.is_empty() {
        out.push_str(&format!(
            " class=\"language-{}\"",
            encode_double_quoted_attribute(&block.language)
        ));
    }
    out.push('>');
    out.push_str(&encode_text(&block.body));
    out.push_str("</code></pre>\n</div>");
    out
}

fn render_inlines(inlines: &[Inline], opts: &RenderOptions) -> String {
    let mut out = String::new();
    for node in inlines {
        out.push_str(&render_inline(node, opts));
    }
    out
}

fn render_inline(node: &Inline, opts: &RenderOptions) -> String {
    match node {
        Inline::Text { value, style } => styled(&encode_text(value), *style),
        Inline::InlineCode { code } => {
            format!("<code class=\"{INLINE_CODE_CLASS}\">{}</code>", encode_text(code))
        }
        Inline::Link { link } => {
            let mut out = format!(
                "<a href=\"{}\" class=\"{A_CLASS}\"",
                encode_double_quoted_attribute(&safe_href(&link.href, false))
            );
            if let Some(title) = &link.title {
                out.push_str(&format!(" title=\"{}\"", encode_double_quoted_attribute(title)));
            }
            if opts.links_in_new_tab {
                out.push_str(" target=\"_blank\" rel=\"noopener noreferrer\"");
            }
            out.push('>');
            out.push_str(&render_inlines(&link.content, opts));
            out.push_str("</a>");
            out
        }
        Inline::Image { image } => {
            let mut out = format!(
                "<img src=\"{}\" alt=\"{}\"",
                encode_double_quoted_attribute(&safe_href(&image.src, true)),
                encode_double_quoted_attribute(&image.alt)
            );
            if let Some(title) = &image.title {
                out.push_str(&format!(" title=\"{}\"", encode_double_quoted_attribute(title)));
            }
            out.push_str(&format!(" class=\"{IMG_CLASS}\" />"));
            out
        }
        Inline::LineBreak => "<br />".to_string(),
    }
}

fn styled(escaped: &str, style: TextStyle) -> String {
    let mut out = escaped.to_string();
    if style.strikethrough {
        out = format!("<del>{out}</del>");
    }
    if style.italic {
        out = format!("<em class=\"{EM_CLASS}\">{out}</em>");
    }
    if style.bold {
        out = format!("<strong class=\"{STRONG_CLASS}\">{out}</strong>");
    }
    out
}

/// Replaces script-capable URLs with `#`. Images may use `data:image/`.
fn safe_href(href: &str, image: bool) -> String {
    let lower: String = href
        .trim()
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    let blocked = lower.starts_with("javascript:")
        || lower.starts_with("vbscript:")
        || (lower.starts_with("data:") && !(image && lower.starts_with("data:image/")));
    if blocked {
        "#".to_string()
    } else {
        href.trim().to_string()
    }
}
