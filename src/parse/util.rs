//! Line-level helpers shared by the block parser.

/// One source line, without its trailing `\n` or `\r`.
///
/// `text` is always a subslice of the parser input starting at byte `start`,
/// so container parsing (quotes, list items) can strip prefixes and still
/// report absolute spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    pub start: usize,
    pub text: &'a str,
}

impl<'a> Line<'a> {
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Leading whitespace width in columns; tabs advance to the next multiple of 4.
    pub fn indent(&self) -> usize {
        let mut cols = 0usize;
        for b in self.text.bytes() {
            match b {
                b' ' => cols += 1,
                b'\t' => cols += 4 - cols % 4,
                _ => break,
            }
        }
        cols
    }

    /// Drops up to `cols` columns of leading whitespace.
    pub fn dedent(&self, cols: usize) -> Line<'a> {
        let mut seen = 0usize;
        let mut bytes = 0usize;
        for b in self.text.bytes() {
            if seen >= cols {
                break;
            }
            match b {
                b' ' => seen += 1,
                b'\t' => seen += 4 - seen % 4,
                _ => break,
            }
            bytes += 1;
        }
        self.slice_from(bytes)
    }

    pub fn trim_start(&self) -> Line<'a> {
        let trimmed = self.text.trim_start();
        self.slice_from(self.text.len() - trimmed.len())
    }

    /// The rest of the line from byte offset `at`, which must be a char boundary.
    pub fn slice_from(&self, at: usize) -> Line<'a> {
        let at = at.min(self.text.len());
        Line {
            start: self.start + at,
            text: &self.text[at..],
        }
    }
}

pub fn collect_lines(src: &str) -> Vec<Line<'_>> {
    let mut out = Vec::new();
    let mut start = 0usize;
    for (i, b) in src.bytes().enumerate() {
        if b == b'\n' {
            out.push(Line {
                start,
                text: strip_cr(&src[start..i]),
            });
            start = i + 1;
        }
    }
    if start < src.len() {
        out.push(Line {
            start,
            text: strip_cr(&src[start..]),
        });
    }
    out
}

pub fn strip_cr(s: &str) -> &str {
    s.strip_suffix('\r').unwrap_or(s)
}

/// An opening code fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceOpen<'a> {
    /// Number of backticks; the closing fence needs at least as many.
    pub ticks: usize,
    /// Indent of the fence, stripped from each body line.
    pub indent: usize,
    pub info: &'a str,
}

pub fn fence_open<'a>(line: Line<'a>) -> Option<FenceOpen<'a>> {
    let indent = line.indent();
    let trimmed = line.text.trim_start();
    let ticks = trimmed.bytes().take_while(|b| *b == b'`').count();
    if ticks < 3 {
        return None;
    }
    let info = trimmed[ticks..].trim();
    // backticks in the info string would make this an inline code span.
    if info.contains('`') {
        return None;
    }
    Some(FenceOpen {
        ticks,
        indent,
        info,
    })
}

pub fn is_fence_close(line: Line<'_>, ticks: usize) -> bool {
    let trimmed = line.text.trim();
    let run = trimmed.bytes().take_while(|b| *b == b'`').count();
    run >= ticks && run == trimmed.len()
}

/// ATX heading: `#` to `######`, then a space or end of line.
///
/// Returns the clamped level (at most 4) and the heading text with any
/// closing `#` run removed.
pub fn heading<'a>(line: Line<'a>) -> Option<(u8, Line<'a>)> {
    let line = line.trim_start();
    let hashes = line.text.bytes().take_while(|b| *b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &line.text[hashes..];
    if !(rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t')) {
        return None;
    }

    let content = line.slice_from(hashes).trim_start();
    let mut text = content.text.trim_end();
    let without_closer = text.trim_end_matches('#');
    if without_closer.is_empty() || without_closer.ends_with([' ', '\t']) {
        text = without_closer.trim_end();
    }

    let level = hashes.min(4) as u8;
    Some((
        level,
        Line {
            start: content.start,
            text,
        },
    ))
}

/// `---`, `***` or `___`, optionally spaced out.
pub fn is_thematic_break(text: &str) -> bool {
    let trimmed = text.trim();
    let Some(marker) = trimmed.chars().next() else {
        return false;
    };
    if !matches!(marker, '-' | '*' | '_') {
        return false;
    }
    let mut count = 0usize;
    for ch in trimmed.chars() {
        if ch == marker {
            count += 1;
        } else if ch != ' ' && ch != '\t' {
            return false;
        }
    }
    count >= 3
}

/// Strips a `>` marker and one optional following space.
pub fn blockquote_strip<'a>(line: Line<'a>) -> Option<Line<'a>> {
    if line.indent() > 3 {
        return None;
    }
    let line = line.trim_start();
    let rest = line.text.strip_prefix('>')?;
    let skip = if rest.starts_with(' ') || rest.starts_with('\t') {
        2
    } else {
        1
    };
    Some(line.slice_from(skip))
}

/// A list item marker at the start of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListMarker {
    /// Indent of the marker itself, in columns.
    pub indent: usize,
    /// `-`, `*` or `+` for bullets; `.` or `)` for ordered items.
    pub delimiter: u8,
    pub ordered: bool,
    pub number: u64,
    /// Byte offset of the item content within the line.
    pub content_offset: usize,
    /// Column continuation lines must reach to belong to the item.
    pub content_col: usize,
    /// True when nothing follows the marker on its line.
    pub empty: bool,
}

pub fn list_marker(line: Line<'_>) -> Option<ListMarker> {
    let indent = line.indent();
    let lead = line.text.len() - line.text.trim_start().len();
    let rest = &line.text[lead..];
    let bytes = rest.as_bytes();

    let (ordered, number, delimiter, marker_len) = match bytes.first()? {
        b @ (b'-' | b'*' | b'+') => (false, 0, *b, 1),
        b'0'..=b'9' => {
            let digits = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
            if digits > 9 {
                return None;
            }
            let delimiter = *bytes.get(digits)?;
            if delimiter != b'.' && delimiter != b')' {
                return None;
            }
            let number = rest[..digits].parse::<u64>().ok()?;
            (true, number, delimiter, digits + 1)
        }
        _ => return None,
    };

    let after = &rest[marker_len..];
    if !after.is_empty() && !after.starts_with(' ') && !after.starts_with('\t') {
        return None;
    }

    let spaces = after.bytes().take_while(|b| *b == b' ').count();
    let empty = after.trim().is_empty();
    // more than four spaces means the content is indented code; keep just one.
    let gap = if empty || spaces == 0 || spaces > 4 {
        1
    } else {
        spaces
    };
    let content_offset = (lead + marker_len + gap.min(after.len())).min(line.text.len());

    Some(ListMarker {
        indent,
        delimiter,
        ordered,
        number,
        content_offset,
        content_col: indent + marker_len + gap,
        empty,
    })
}
