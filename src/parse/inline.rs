//! Inline grammar for paragraph, heading and table-cell text.
//!
//! Supported: backslash escapes, code spans, `*`/`_` emphasis (bold, italic,
//! both), `~~` strikethrough, inline links and images, `<scheme:...>`
//! autolinks, bare `http(s)://` URLs and hard line breaks. Emphasis is
//! flattened into [`TextStyle`] flags on text runs.
//!
//! Every scan is bounded: code spans and bracket pairs are matched once up
//! front, and emphasis and link destination searches remember where a
//! closer was already proven missing.

use std::collections::HashMap;

use tracing::debug;

use crate::ast::{Diagnostic, Image, Inline, Link, Span, TextStyle, plain_text};

/// Delimiter runs at least this long are never parsed as markup.
pub const MAX_DELIM_RUN: usize = 512;

/// Emphasis and link nesting beyond this depth is left as literal text.
pub const MAX_INLINE_DEPTH: usize = 32;

/// Parses `text` into inline nodes.
///
/// `span` locates `text` in the parser input and is only used for diagnostics.
pub fn parse_inlines(text: &str, span: Span, diagnostics: &mut Vec<Diagnostic>) -> Vec<Inline> {
    if text.is_empty() {
        return Vec::new();
    }

    if let Some((delim, len)) = longest_delim_run(text).filter(|(_, len)| *len >= MAX_DELIM_RUN) {
        debug!(delim = %delim, len, "delimiter run treated as text");
        diagnostics.push(Diagnostic::parse_warning(
            "markdown.inline.pathological_delim_run",
            format!("A run of {len} '{delim}' characters was kept as plain text"),
            Some(span),
        ));
        return vec![Inline::plain(text)];
    }

    let mut parser = InlineParser::new(text);
    let mut out = Vec::new();
    parser.parse_range(0, text.len(), TextStyle::default(), 0, &mut out);
    out
}

fn longest_delim_run(text: &str) -> Option<(char, usize)> {
    let mut best: Option<(u8, usize)> = None;
    let mut current: Option<(u8, usize)> = None;
    for b in text.bytes() {
        if !matches!(b, b'[' | b'*' | b'_' | b'`' | b'~') {
            current = None;
            continue;
        }
        let run = match current {
            Some((c, n)) if c == b => (c, n + 1),
            _ => (b, 1),
        };
        current = Some(run);
        if best.is_none_or(|(_, n)| run.1 > n) {
            best = Some(run);
        }
    }
    best.map(|(b, n)| (b as char, n))
}

struct InlineParser<'a> {
    src: &'a str,
    /// Code span opener -> (closer start, closer end).
    code_spans: HashMap<usize, (usize, usize)>,
    /// `[` -> matching `]`.
    brackets: HashMap<usize, usize>,
    /// (delimiter, run length, range end) -> earliest opener with no closer.
    no_closer: HashMap<(u8, usize, usize), usize>,
    link_misses: LinkMisses,
    in_link: bool,
}

impl<'a> InlineParser<'a> {
    fn new(src: &'a str) -> Self {
        let code_spans = match_code_spans(src);
        let brackets = match_brackets(src, &code_spans);
        Self {
            src,
            code_spans,
            brackets,
            no_closer: HashMap::new(),
            link_misses: LinkMisses::default(),
            in_link: false,
        }
    }

    fn parse_range(
        &mut self,
        start: usize,
        end: usize,
        style: TextStyle,
        depth: usize,
        out: &mut Vec<Inline>,
    ) {
        let src = self.src;
        let bytes = src.as_bytes();
        let mut buf = String::new();
        let mut i = start;

        while i < end {
            match bytes[i] {
                b'\\' => {
                    let next = bytes.get(i + 1).copied().filter(|_| i + 1 < end);
                    match next {
                        Some(b'\n') => {
                            trim_trailing_blanks(&mut buf);
                            flush(&mut buf, style, out);
                            out.push(Inline::LineBreak);
                            i = skip_blanks(bytes, i + 2, end);
                        }
                        Some(c) if c.is_ascii_punctuation() => {
                            buf.push(c as char);
                            i += 2;
                        }
                        _ => {
                            buf.push('\\');
                            i += 1;
                        }
                    }
                }

                b'`' => {
                    let n = run_len(bytes, i, end, b'`');
                    match self.code_spans.get(&i).copied() {
                        Some((close_start, close_end)) if close_end <= end => {
                            flush(&mut buf, style, out);
                            out.push(Inline::InlineCode {
                                code: code_span_text(&self.src[i + n..close_start]),
                            });
                            i = close_end;
                        }
                        _ => {
                            buf.push_str(&self.src[i..i + n]);
                            i += n;
                        }
                    }
                }

                b'!' if bytes.get(i + 1) == Some(&b'[') && depth < MAX_INLINE_DEPTH => {
                    match self.try_image(i, end, depth) {
                        Some((node, next)) => {
                            flush(&mut buf, style, out);
                            out.push(node);
                            i = next;
                        }
                        None => {
                            buf.push('!');
                            i += 1;
                        }
                    }
                }

                b'[' if !self.in_link && depth < MAX_INLINE_DEPTH => {
                    match self.try_link(i, end, style, depth) {
                        Some((node, next)) => {
                            flush(&mut buf, style, out);
                            out.push(node);
                            i = next;
                        }
                        None => {
                            buf.push('[');
                            i += 1;
                        }
                    }
                }

                b'<' if !self.in_link => match self.try_autolink(i, end, style) {
                    Some((node, next)) => {
                        flush(&mut buf, style, out);
                        out.push(node);
                        i = next;
                    }
                    None => {
                        buf.push('<');
                        i += 1;
                    }
                },

                b'h' if !self.in_link && !prev_is_alphanumeric(self.src, i) => {
                    match self.try_bare_url(i, end, style) {
                        Some((node, next)) => {
                            flush(&mut buf, style, out);
                            out.push(node);
                            i = next;
                        }
                        None => {
                            buf.push('h');
                            i += 1;
                        }
                    }
                }

                c @ (b'*' | b'_') => {
                    let n = run_len(bytes, i, end, c);
                    match self.try_emphasis(i, n, end, c, style, depth) {
                        Some((inner, next)) => {
                            flush(&mut buf, style, out);
                            for node in inner {
                                push_inline(out, node);
                            }
                            i = next;
                        }
                        None => {
                            buf.push_str(&self.src[i..i + n]);
                            i += n;
                        }
                    }
                }

                b'~' => {
                    let n = run_len(bytes, i, end, b'~');
                    match self.try_strikethrough(i, n, end, style, depth) {
                        Some((inner, next)) => {
                            flush(&mut buf, style, out);
                            for node in inner {
                                push_inline(out, node);
                            }
                            i = next;
                        }
                        None => {
                            buf.push_str(&self.src[i..i + n]);
                            i += n;
                        }
                    }
                }

                b'\n' => {
                    let hard = buf.ends_with("  ");
                    trim_trailing_blanks(&mut buf);
                    if hard {
                        flush(&mut buf, style, out);
                        out.push(Inline::LineBreak);
                    } else {
                        buf.push('\n');
                    }
                    i = skip_blanks(bytes, i + 1, end);
                }

                _ => {
                    let Some(ch) = self.src[i..end].chars().next() else {
                        break;
                    };
                    buf.push(ch);
                    i += ch.len_utf8();
                }
            }
        }

        flush(&mut buf, style, out);
    }

    fn try_emphasis(
        &mut self,
        open: usize,
        n: usize,
        end: usize,
        delim: u8,
        style: TextStyle,
        depth: usize,
    ) -> Option<(Vec<Inline>, usize)> {
        if n > 3 || depth >= MAX_INLINE_DEPTH {
            return None;
        }
        let after = next_char(self.src, open + n, end)?;
        if after.is_whitespace() {
            return None;
        }
        if delim == b'_' && prev_is_alphanumeric(self.src, open) {
            return None;
        }

        let (inner_end, next) = self.find_closer(open, n, end, delim)?;
        let inner_style = match n {
            1 => style.with_italic(),
            2 => style.with_bold(),
            _ => style.with_bold().with_italic(),
        };
        let mut inner = Vec::new();
        self.parse_range(open + n, inner_end, inner_style, depth + 1, &mut inner);
        Some((inner, next))
    }

    fn try_strikethrough(
        &mut self,
        open: usize,
        n: usize,
        end: usize,
        style: TextStyle,
        depth: usize,
    ) -> Option<(Vec<Inline>, usize)> {
        if n != 2 || depth >= MAX_INLINE_DEPTH {
            return None;
        }
        let after = next_char(self.src, open + n, end)?;
        if after.is_whitespace() {
            return None;
        }
        let (inner_end, next) = self.find_closer(open, n, end, b'~')?;
        let mut inner = Vec::new();
        self.parse_range(
            open + n,
            inner_end,
            style.with_strikethrough(),
            depth + 1,
            &mut inner,
        );
        Some((inner, next))
    }

    /// Finds the closing run for an opener of `n` `delim`s at `open`.
    ///
    /// Returns the end of the enclosed text and the position after the closer.
    fn find_closer(
        &mut self,
        open: usize,
        n: usize,
        end: usize,
        delim: u8,
    ) -> Option<(usize, usize)> {
        let key = (delim, n, end);
        if self.no_closer.get(&key).is_some_and(|&failed| open >= failed) {
            return None;
        }

        let src = self.src;
        let bytes = src.as_bytes();
        let mut j = open + n;
        while j < end {
            match bytes[j] {
                b'\\' => j += 2,
                b'`' => match self.code_spans.get(&j) {
                    Some(&(_, close_end)) if close_end <= end => j = close_end,
                    _ => j += run_len(bytes, j, end, b'`'),
                },
                b if b == delim => {
                    let m = run_len(bytes, j, end, delim);
                    let inner_end = j + m.saturating_sub(n);
                    if inner_end > open + n && closes(self.src, j, m, n, delim) {
                        return Some((inner_end, j + m));
                    }
                    j += m;
                }
                _ => j += 1,
            }
        }

        self.no_closer
            .entry(key)
            .and_modify(|failed| *failed = (*failed).min(open))
            .or_insert(open);
        None
    }

    fn try_link(
        &mut self,
        open: usize,
        end: usize,
        style: TextStyle,
        depth: usize,
    ) -> Option<(Inline, usize)> {
        let close = *self.brackets.get(&open)?;
        if close >= end {
            return None;
        }
        let (href, title, next) = link_destination(self.src, close, end, &mut self.link_misses)?;

        self.in_link = true;
        let mut content = Vec::new();
        self.parse_range(open + 1, close, style, depth + 1, &mut content);
        self.in_link = false;

        Some((
            Inline::Link {
                link: Link {
                    href,
                    title,
                    content,
                },
            },
            next,
        ))
    }

    fn try_image(&mut self, bang: usize, end: usize, depth: usize) -> Option<(Inline, usize)> {
        let open = bang + 1;
        let close = *self.brackets.get(&open)?;
        if close >= end {
            return None;
        }
        let (src, title, next) = link_destination(self.src, close, end, &mut self.link_misses)?;

        let was_in_link = self.in_link;
        self.in_link = true;
        let mut alt = Vec::new();
        self.parse_range(open + 1, close, TextStyle::default(), depth + 1, &mut alt);
        self.in_link = was_in_link;

        Some((
            Inline::Image {
                image: Image {
                    src,
                    alt: plain_text(&alt),
                    title,
                },
            },
            next,
        ))
    }

    fn try_autolink(&self, open: usize, end: usize, style: TextStyle) -> Option<(Inline, usize)> {
        let rest = &self.src[open + 1..end];
        // whitespace or another `<` ends the candidate, so runs of `<` stay linear.
        let close = rest.find(|c: char| c == '>' || c == '<' || c.is_whitespace())?;
        if close == 0 || rest.as_bytes()[close] != b'>' {
            return None;
        }
        let inner = &rest[..close];
        let lower = inner.to_ascii_lowercase();
        if !["http://", "https://", "mailto:"]
            .iter()
            .any(|scheme| lower.starts_with(scheme) && lower.len() > scheme.len())
        {
            return None;
        }
        Some((
            Inline::Link {
                link: Link {
                    href: inner.to_string(),
                    title: None,
                    content: vec![Inline::text(inner, style)],
                },
            },
            open + 1 + close + 1,
        ))
    }

    fn try_bare_url(&self, start: usize, end: usize, style: TextStyle) -> Option<(Inline, usize)> {
        let rest = &self.src[start..end];
        let scheme_len = if rest.starts_with("https://") {
            "https://".len()
        } else if rest.starts_with("http://") {
            "http://".len()
        } else {
            return None;
        };

        let mut len = rest
            .find(|c: char| c.is_whitespace() || c == '<')
            .unwrap_or(rest.len());
        let opens = rest[..len].matches('(').count();
        let mut closes = rest[..len].matches(')').count();
        while let Some(last) = rest[..len].chars().next_back() {
            if last == ')' && closes > opens {
                closes -= 1;
            } else if !".,:;!?'\"*_~".contains(last) {
                break;
            }
            len -= last.len_utf8();
        }
        if len <= scheme_len {
            return None;
        }

        let url = &rest[..len];
        Some((
            Inline::Link {
                link: Link {
                    href: url.to_string(),
                    title: None,
                    content: vec![Inline::text(url, style)],
                },
            },
            start + len,
        ))
    }
}

/// Whether a run of `m` delimiters at `at` can close an opener of length `n`.
fn closes(src: &str, at: usize, m: usize, n: usize, delim: u8) -> bool {
    let lengths_fit = match n {
        1 => m == 1 || m >= 3,
        _ => m >= n,
    };
    if !lengths_fit {
        return false;
    }
    let before = src[..at].chars().next_back();
    if before.is_none_or(char::is_whitespace) {
        return false;
    }
    if delim == b'_' && src[at + m..].chars().next().is_some_and(char::is_alphanumeric) {
        return false;
    }
    true
}

/// Link destination scans already proven to fail, keyed by range end.
#[derive(Debug, Default)]
struct LinkMisses {
    /// Bare destinations starting at or after this position run into the
    /// range end unclosed.
    bare: HashMap<usize, usize>,
    /// `<...>` searches starting inside `[from, to]` hit a newline or the
    /// range end before any `>`.
    angle: HashMap<usize, (usize, usize)>,
    /// (quote, range end) -> search start from which no closing quote exists.
    title: HashMap<(u8, usize), usize>,
}

/// Parses `(dest "title")` following the `]` at `close`.
fn link_destination(
    src: &str,
    close: usize,
    end: usize,
    misses: &mut LinkMisses,
) -> Option<(String, Option<String>, usize)> {
    let bytes = src.as_bytes();
    if close + 1 >= end || bytes[close + 1] != b'(' {
        return None;
    }
    let mut j = skip_whitespace(bytes, close + 2, end);

    let href = if j < end && bytes[j] == b'<' {
        let from = j + 1;
        if misses
            .angle
            .get(&end)
            .is_some_and(|&(lo, hi)| (lo..=hi).contains(&from))
        {
            return None;
        }
        let Some(rel) = src[from..end].find(['>', '\n']) else {
            misses.angle.insert(end, (from, end));
            return None;
        };
        if bytes[from + rel] != b'>' {
            misses.angle.insert(end, (from, from + rel));
            return None;
        }
        let href = unescape(&src[from..from + rel]);
        j += rel + 2;
        href
    } else {
        if misses.bare.get(&end).is_some_and(|&failed| j >= failed) {
            return None;
        }
        let start = j;
        // just past the last nested `)`; later starts before it may close.
        let mut last_close = start;
        let mut parens = 0usize;
        let mut closed = false;
        while j < end {
            match bytes[j] {
                b' ' | b'\t' | b'\n' => {
                    closed = true;
                    break;
                }
                b'(' => parens += 1,
                b')' if parens == 0 => {
                    closed = true;
                    break;
                }
                b')' => {
                    parens -= 1;
                    last_close = j + 1;
                }
                b'\\' => j += 1,
                _ => {}
            }
            j += 1;
        }
        if !closed {
            misses
                .bare
                .entry(end)
                .and_modify(|failed| *failed = (*failed).min(last_close))
                .or_insert(last_close);
            return None;
        }
        unescape(&src[start..j])
    };

    j = skip_whitespace(bytes, j, end);
    let mut title = None;
    if let Some(&quote @ (b'"' | b'\'')) = bytes.get(j).filter(|_| j < end) {
        let from = j + 1;
        let key = (quote, end);
        if misses.title.get(&key).is_some_and(|&failed| from >= failed) {
            return None;
        }
        let Some(rel) = src[from..end].find(quote as char) else {
            misses
                .title
                .entry(key)
                .and_modify(|failed| *failed = (*failed).min(from))
                .or_insert(from);
            return None;
        };
        title = Some(unescape(&src[from..from + rel]));
        j = skip_whitespace(bytes, j + rel + 2, end);
    }

    if j < end && bytes[j] == b')' {
        Some((href, title, j + 1))
    } else {
        None
    }
}

fn match_code_spans(src: &str) -> HashMap<usize, (usize, usize)> {
    let bytes = src.as_bytes();
    let mut spans = HashMap::new();
    // run length -> position from which no run of that length exists.
    let mut exhausted: HashMap<usize, usize> = HashMap::new();
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => {
                let n = run_len(bytes, i, bytes.len(), b'`');
                if exhausted.get(&n).is_some_and(|&from| i + n >= from) {
                    i += n;
                    continue;
                }
                let mut j = i + n;
                let mut found = None;
                while j < bytes.len() {
                    if bytes[j] == b'`' {
                        let m = run_len(bytes, j, bytes.len(), b'`');
                        if m == n {
                            found = Some((j, j + m));
                            break;
                        }
                        j += m;
                    } else {
                        j += 1;
                    }
                }
                match found {
                    Some((close_start, close_end)) => {
                        spans.insert(i, (close_start, close_end));
                        i = close_end;
                    }
                    None => {
                        exhausted.insert(n, i + n);
                        i += n;
                    }
                }
            }
            _ => i += 1,
        }
    }
    spans
}

fn match_brackets(src: &str, code_spans: &HashMap<usize, (usize, usize)>) -> HashMap<usize, usize> {
    let bytes = src.as_bytes();
    let mut pairs = HashMap::new();
    let mut stack: Vec<usize> = Vec::new();
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => match code_spans.get(&i) {
                Some(&(_, close_end)) => i = close_end,
                None => i += run_len(bytes, i, bytes.len(), b'`'),
            },
            b'[' => {
                stack.push(i);
                i += 1;
            }
            b']' => {
                if let Some(open) = stack.pop() {
                    pairs.insert(open, i);
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    pairs
}

fn code_span_text(raw: &str) -> String {
    let text = raw.replace('\n', " ");
    let strip = text.len() >= 2
        && text.starts_with(' ')
        && text.ends_with(' ')
        && !text.trim().is_empty();
    if strip {
        text[1..text.len() - 1].to_string()
    } else {
        text
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\'
            && let Some(&next) = chars.peek()
            && next.is_ascii_punctuation()
        {
            out.push(next);
            chars.next();
            continue;
        }
        out.push(ch);
    }
    out
}

fn run_len(bytes: &[u8], start: usize, end: usize, b: u8) -> usize {
    bytes[start..end].iter().take_while(|c| **c == b).count()
}

fn skip_blanks(bytes: &[u8], mut i: usize, end: usize) -> usize {
    while i < end && matches!(bytes[i], b' ' | b'\t') {
        i += 1;
    }
    i
}

fn skip_whitespace(bytes: &[u8], mut i: usize, end: usize) -> usize {
    while i < end && matches!(bytes[i], b' ' | b'\t' | b'\n') {
        i += 1;
    }
    i
}

fn next_char(src: &str, at: usize, end: usize) -> Option<char> {
    if at >= end {
        return None;
    }
    src[at..end].chars().next()
}

fn prev_is_alphanumeric(src: &str, at: usize) -> bool {
    src[..at].chars().next_back().is_some_and(char::is_alphanumeric)
}

fn trim_trailing_blanks(buf: &mut String) {
    let keep = buf.trim_end_matches([' ', '\t']).len();
    buf.truncate(keep);
}

fn flush(buf: &mut String, style: TextStyle, out: &mut Vec<Inline>) {
    if buf.is_empty() {
        return;
    }
    push_inline(out, Inline::text(std::mem::take(buf), style));
}

/// Appends `node`, merging adjacent text runs that share a style.
fn push_inline(out: &mut Vec<Inline>, node: Inline) {
    if let Inline::Text { value, style } = &node
        && let Some(Inline::Text {
            value: prev,
            style: prev_style,
        }) = out.last_mut()
        && prev_style == style
    {
        prev.push_str(value);
        return;
    }
    out.push(node);
}
