//! Normalized markup -> AST parser.
//!
//! The parser is **error-tolerant**: it never fails and never panics on any
//! input. Malformed constructs degrade to plain text and leave a
//! [`Diagnostic`] behind.
//!
//! Block constructs are recognized in this order: fenced code, headings,
//! thematic breaks, blockquotes, lists, pipe tables, paragraphs. Fences come
//! first so nothing inside a code block is ever interpreted as markup.

mod inline;
mod table;
mod util;

use tracing::debug;

use crate::ast::*;
use crate::code::FenceInfo;

pub use inline::{MAX_DELIM_RUN, MAX_INLINE_DEPTH, parse_inlines};
use util::{
    FenceOpen, Line, ListMarker, blockquote_strip, collect_lines, fence_open, heading,
    is_fence_close, is_thematic_break, list_marker,
};

/// Container nesting (quotes, list items) deeper than this is parsed as text.
pub const MAX_NESTING: usize = 16;

/// Result of parsing a document.
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse normalized markup into an AST `Document`.
///
/// Spans are byte offsets into `src`. Parsing the same input twice yields
/// structurally equal output.
pub fn parse_document(src: &str) -> ParseOutput {
    let lines = collect_lines(src);
    let mut diagnostics = Vec::new();
    let blocks = parse_blocks(&lines, 0, &mut diagnostics);

    ParseOutput {
        document: Document {
            span: Span::from_range(0, src.len()),
            blocks,
        },
        diagnostics,
    }
}

fn parse_blocks(lines: &[Line<'_>], depth: usize, diagnostics: &mut Vec<Diagnostic>) -> Vec<BlockNode> {
    let mut blocks = Vec::new();
    let mut i = 0usize;

    while i < lines.len() {
        let line = lines[i];
        if line.is_blank() {
            i += 1;
            continue;
        }

        // fenced code wins over everything else.
        if let Some(open) = fence_open(line) {
            let (node, next_i) = parse_fenced_code(lines, i, open, diagnostics);
            blocks.push(node);
            i = checked_next(i, next_i, "fence", line, diagnostics);
            continue;
        }

        if let Some((level, content)) = heading(line) {
            let span = Span::from_range(line.start, line.end());
            blocks.push(BlockNode {
                span,
                kind: BlockKind::Heading {
                    level,
                    content: parse_inlines(content.text, span, diagnostics),
                },
            });
            i += 1;
            continue;
        }

        if is_thematic_break(line.text) {
            blocks.push(BlockNode {
                span: Span::from_range(line.start, line.end()),
                kind: BlockKind::HorizontalRule,
            });
            i += 1;
            continue;
        }

        let is_quote = blockquote_strip(line).is_some();
        let marker = list_marker(line);
        if (is_quote || marker.is_some()) && depth >= MAX_NESTING {
            debug!(depth, "container nesting clamped");
            diagnostics.push(Diagnostic::parse_warning(
                "markdown.nesting.clamped",
                format!("Containers nested deeper than {MAX_NESTING} levels are kept as text"),
                Some(Span::from_range(line.start, line.end())),
            ));
        } else if is_quote {
            let (node, next_i) = parse_blockquote(lines, i, depth, diagnostics);
            blocks.push(node);
            i = checked_next(i, next_i, "blockquote", line, diagnostics);
            continue;
        } else if let Some(marker) = marker {
            let (node, next_i) = parse_list(lines, i, marker, depth, diagnostics);
            blocks.push(node);
            i = checked_next(i, next_i, "list", line, diagnostics);
            continue;
        }

        if table::is_table_start(lines, i) {
            let (node, next_i) = table::parse_table(lines, i, diagnostics);
            blocks.push(node);
            i = checked_next(i, next_i, "table", line, diagnostics);
            continue;
        }

        let (node, next_i) = parse_paragraph(lines, i, depth, diagnostics);
        blocks.push(node);
        i = checked_next(i, next_i, "paragraph", line, diagnostics);
    }

    blocks
}

/// Guards the block loop against a sub-parser that failed to consume input.
fn checked_next(
    i: usize,
    next_i: usize,
    what: &str,
    line: Line<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> usize {
    if next_i > i {
        return next_i;
    }
    diagnostics.push(Diagnostic {
        severity: Severity::Error,
        phase: Some(DiagnosticPhase::Parse),
        code: Some(format!("markdown.{what}.parse_failed")),
        message: format!(
            "Block parsing error: next index ({next_i}) is not greater than current index ({i})"
        ),
        span: Some(Span::from_range(line.start, line.end())),
        notes: vec![],
    });
    i + 1
}

fn parse_fenced_code(
    lines: &[Line<'_>],
    start_i: usize,
    open: FenceOpen<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> (BlockNode, usize) {
    let first = lines[start_i];

    let Some(close_rel) = lines[start_i + 1..]
        .iter()
        .position(|l| is_fence_close(*l, open.ticks))
    else {
        return unclosed_fence(lines, start_i, diagnostics);
    };
    let close_i = start_i + 1 + close_rel;

    let body = lines[start_i + 1..close_i]
        .iter()
        .map(|l| l.dedent(open.indent).text)
        .collect::<Vec<_>>()
        .join("\n");

    let node = BlockNode {
        span: Span::from_range(first.start, lines[close_i].end()),
        kind: BlockKind::CodeBlock {
            block: CodeBlock::new(FenceInfo::parse(open.info), body),
        },
    };
    (node, close_i + 1)
}

/// An opening fence with no closer: the rest of the input becomes one
/// verbatim text paragraph.
fn unclosed_fence(
    lines: &[Line<'_>],
    start_i: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> (BlockNode, usize) {
    let first = lines[start_i];
    let last = lines.iter().rposition(|l| !l.is_blank()).unwrap_or(start_i).max(start_i);

    let raw = lines[start_i..=last]
        .iter()
        .map(|l| l.text)
        .collect::<Vec<_>>()
        .join("\n");

    debug!(line_start = first.start, "unclosed code fence kept as text");
    diagnostics.push(Diagnostic::parse_warning(
        "markdown.fence.unclosed",
        "Code fence is never closed; the remaining text is shown verbatim",
        Some(Span::from_range(first.start, first.end())),
    ));

    let node = BlockNode {
        span: Span::from_range(first.start, lines[last].end()),
        kind: BlockKind::Paragraph {
            content: vec![Inline::plain(raw)],
        },
    };
    (node, lines.len())
}

fn parse_blockquote(
    lines: &[Line<'_>],
    start_i: usize,
    depth: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> (BlockNode, usize) {
    let mut inner: Vec<Line<'_>> = Vec::new();
    let mut i = start_i;

    while i < lines.len() {
        let line = lines[i];
        if let Some(stripped) = blockquote_strip(line) {
            inner.push(stripped);
            i += 1;
            continue;
        }
        // lazy continuation of a quoted paragraph.
        let continues_text = inner.last().is_some_and(|l| !l.is_blank());
        if continues_text && !line.is_blank() && !interrupts_paragraph(lines, i, depth) {
            inner.push(line.trim_start());
            i += 1;
            continue;
        }
        break;
    }

    let last = lines[i.saturating_sub(1).max(start_i)];
    let node = BlockNode {
        span: Span::from_range(lines[start_i].start, last.end()),
        kind: BlockKind::BlockQuote {
            blocks: parse_blocks(&inner, depth + 1, diagnostics),
        },
    };
    (node, i)
}

fn parse_list(
    lines: &[Line<'_>],
    start_i: usize,
    first: ListMarker,
    depth: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> (BlockNode, usize) {
    let mut items = Vec::new();
    let mut i = start_i;

    while i < lines.len() {
        let Some(marker) = list_marker(lines[i]) else {
            break;
        };
        if marker.ordered != first.ordered
            || marker.delimiter != first.delimiter
            || is_thematic_break(lines[i].text)
        {
            break;
        }

        let (item, next_i) = parse_list_item(lines, i, marker, depth, diagnostics);
        items.push(item);
        i = next_i.max(i + 1);

        // a blank line between siblings keeps the list going.
        let after_blanks = skip_blank_lines(lines, i);
        let sibling_follows = after_blanks < lines.len()
            && list_marker(lines[after_blanks]).is_some_and(|m| {
                m.ordered == first.ordered && m.delimiter == first.delimiter
            })
            && !is_thematic_break(lines[after_blanks].text);
        if after_blanks > i && sibling_follows {
            i = after_blanks;
        }
    }

    let span = match (items.first(), items.last()) {
        (Some(a), Some(b)) => a.span.cover(b.span),
        _ => Span::from_range(lines[start_i].start, lines[start_i].end()),
    };
    let start = (first.ordered && first.number != 1).then_some(first.number);

    (
        BlockNode {
            span,
            kind: BlockKind::List {
                list: List {
                    ordered: first.ordered,
                    start,
                    items,
                },
            },
        },
        i,
    )
}

fn parse_list_item(
    lines: &[Line<'_>],
    start_i: usize,
    marker: ListMarker,
    depth: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> (ListItem, usize) {
    let first = lines[start_i];
    let mut content = first.slice_from(marker.content_offset);

    let mut checked = None;
    for (prefix, state) in [("[ ]", false), ("[x]", true), ("[X]", true)] {
        if let Some(rest) = content.text.strip_prefix(prefix)
            && (rest.is_empty() || rest.starts_with(' '))
        {
            checked = Some(state);
            content = content.slice_from((prefix.len() + 1).min(content.text.len()));
            break;
        }
    }

    let mut body = vec![content];
    let mut i = start_i + 1;
    while i < lines.len() {
        let line = lines[i];
        if line.is_blank() {
            let next = skip_blank_lines(lines, i);
            if next < lines.len() && lines[next].indent() >= marker.content_col {
                body.extend(lines[i..next].iter().map(|l| l.dedent(marker.content_col)));
                i = next;
                continue;
            }
            break;
        }
        if line.indent() >= marker.content_col {
            body.push(line.dedent(marker.content_col));
            i += 1;
            continue;
        }
        let continues_text = body.last().is_some_and(|l| !l.is_blank());
        if continues_text
            && list_marker(line).is_none()
            && !interrupts_paragraph(lines, i, depth)
        {
            body.push(line.trim_start());
            i += 1;
            continue;
        }
        break;
    }

    let last = lines[i - 1];
    let item = ListItem {
        span: Span::from_range(first.start, last.end()),
        checked,
        blocks: parse_blocks(&body, depth + 1, diagnostics),
    };
    (item, i)
}

fn parse_paragraph(
    lines: &[Line<'_>],
    start_i: usize,
    depth: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> (BlockNode, usize) {
    let mut end_i = start_i + 1;
    while end_i < lines.len()
        && !lines[end_i].is_blank()
        && !interrupts_paragraph(lines, end_i, depth)
    {
        end_i += 1;
    }

    let text = lines[start_i..end_i]
        .iter()
        .map(|l| l.text.trim_start())
        .collect::<Vec<_>>()
        .join("\n");
    let span = Span::from_range(lines[start_i].start, lines[end_i - 1].end());

    let node = BlockNode {
        span,
        kind: BlockKind::Paragraph {
            content: parse_inlines(text.trim_end(), span, diagnostics),
        },
    };
    (node, end_i)
}

/// Whether `lines[i]` starts a block that ends an open paragraph.
fn interrupts_paragraph(lines: &[Line<'_>], i: usize, depth: usize) -> bool {
    let line = lines[i];
    if fence_open(line).is_some() || heading(line).is_some() || is_thematic_break(line.text) {
        return true;
    }
    if depth < MAX_NESTING {
        if blockquote_strip(line).is_some() {
            return true;
        }
        // ordered items only interrupt when they start at 1, so a wrapped
        // "2024. was a good year" stays in the paragraph.
        if let Some(marker) = list_marker(line)
            && !marker.empty
            && (!marker.ordered || marker.number == 1)
        {
            return true;
        }
    }
    table::is_table_start(lines, i)
}

fn skip_blank_lines(lines: &[Line<'_>], mut i: usize) -> usize {
    while i < lines.len() && lines[i].is_blank() {
        i += 1;
    }
    i
}
