//! Pipe tables: a header row, a separator row, then body rows.
//!
//! ```text
//! | Name | Size |
//! |:-----|-----:|
//! | a    | 1    |
//! ```

use crate::ast::{Alignment, BlockKind, BlockNode, Diagnostic, Span, Table, TableCell};

use super::inline::parse_inlines;
use super::util::Line;

/// A header row followed by a separator row with the same number of cells.
pub fn is_table_start(lines: &[Line<'_>], i: usize) -> bool {
    let (Some(header), Some(separator)) = (lines.get(i), lines.get(i + 1)) else {
        return false;
    };
    if !header.text.contains('|') {
        return false;
    }
    match separator_alignments(separator.text) {
        Some(alignments) => alignments.len() == split_row(header.text).len(),
        None => false,
    }
}

/// Parses the separator row, e.g. `|:--|:-:|--:|`.
pub fn separator_alignments(text: &str) -> Option<Vec<Alignment>> {
    let trimmed = text.trim();
    if !trimmed.contains('-') || !trimmed.contains('|') {
        return None;
    }
    let mut alignments = Vec::new();
    for cell in split_row(trimmed) {
        let cell = cell.trim();
        let left = cell.starts_with(':');
        let right = cell.ends_with(':') && cell.len() > 1;
        let dashes = cell.trim_start_matches(':').trim_end_matches(':');
        if dashes.is_empty() || !dashes.bytes().all(|b| b == b'-') {
            return None;
        }
        alignments.push(match (left, right) {
            (true, true) => Alignment::Center,
            (true, false) => Alignment::Left,
            (false, true) => Alignment::Right,
            (false, false) => Alignment::None,
        });
    }
    if alignments.is_empty() {
        None
    } else {
        Some(alignments)
    }
}

/// Splits a row into cell texts.
///
/// Leading and trailing pipes are optional. `\|` is a literal pipe, and pipes
/// inside code spans do not split.
pub fn split_row(text: &str) -> Vec<String> {
    let mut row = text.trim();
    row = row.strip_prefix('|').unwrap_or(row);
    if row.ends_with('|') && !row.ends_with("\\|") {
        row = &row[..row.len() - 1];
    }

    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut in_code: Option<usize> = None;
    let bytes = row.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' if bytes.get(i + 1) == Some(&b'|') => {
                cell.push('|');
                i += 2;
            }
            b'`' => {
                let run = bytes[i..].iter().take_while(|b| **b == b'`').count();
                in_code = match in_code {
                    Some(open) if open == run => None,
                    None => Some(run),
                    other => other,
                };
                cell.push_str(&row[i..i + run]);
                i += run;
            }
            b'|' if in_code.is_none() => {
                cells.push(std::mem::take(&mut cell).trim().to_string());
                i += 1;
            }
            _ => {
                let Some(ch) = row[i..].chars().next() else {
                    break;
                };
                cell.push(ch);
                i += ch.len_utf8();
            }
        }
    }
    cells.push(cell.trim().to_string());
    cells
}

/// Parses a table starting at `lines[start_i]`; `is_table_start` must hold.
///
/// Body rows run until a blank line or a line without a pipe. Rows are
/// padded or truncated to the header width.
pub fn parse_table(
    lines: &[Line<'_>],
    start_i: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> (BlockNode, usize) {
    let header_line = lines[start_i];
    let alignments = lines
        .get(start_i + 1)
        .and_then(|l| separator_alignments(l.text))
        .unwrap_or_default();
    let width = alignments.len();

    let header = row_cells(header_line, width, diagnostics);

    let mut rows = Vec::new();
    let mut i = start_i + 2;
    while i < lines.len() {
        let line = lines[i];
        if line.is_blank() || !line.text.contains('|') {
            break;
        }
        rows.push(row_cells(line, width, diagnostics));
        i += 1;
    }

    let last = lines[i.saturating_sub(1).max(start_i)];
    let node = BlockNode {
        span: Span::from_range(header_line.start, last.end()),
        kind: BlockKind::Table {
            table: Table {
                alignments,
                header,
                rows,
            },
        },
    };
    (node, i.max(start_i + 2).min(lines.len()))
}

fn row_cells(line: Line<'_>, width: usize, diagnostics: &mut Vec<Diagnostic>) -> Vec<TableCell> {
    let span = Span::from_range(line.start, line.end());
    let mut cells: Vec<TableCell> = split_row(line.text)
        .into_iter()
        .take(width)
        .map(|text| TableCell {
            content: parse_inlines(&text, span, diagnostics),
        })
        .collect();
    cells.resize_with(width, TableCell::default);
    cells
}
