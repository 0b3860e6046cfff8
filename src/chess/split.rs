//! Splits a chapter file into record spans.
//!
//! A record ends at a termination token (`*`, `1-0`, `0-1`, `1/2-1/2`) or where
//! a new tag block opens at the start of a line. Markers inside tag brackets or
//! brace comments never split.

const TERMINATION_MARKERS: [&str; 4] = ["1/2-1/2", "1-0", "0-1", "*"];

#[derive(Clone, Copy, PartialEq, Eq)]
enum Scan {
    Body,
    Tag { quoted: bool },
    Comment,
}

/// Returns the trimmed, non-empty record spans of `text` in file order.
pub fn split_records(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut records = Vec::new();
    let mut start = 0;
    let mut state = Scan::Body;
    // Non-blank text seen outside tags since the record began.
    let mut body_seen = false;
    let mut line_blank = true;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        match state {
            Scan::Tag { quoted } => match b {
                b'"' => state = Scan::Tag { quoted: !quoted },
                b'\\' if quoted => i += 1,
                b']' if !quoted => state = Scan::Body,
                b'\n' => state = Scan::Body,
                _ => {}
            },
            Scan::Comment => {
                if b == b'}' {
                    state = Scan::Body;
                }
            }
            Scan::Body => match b {
                b'[' => {
                    if line_blank && body_seen {
                        push_span(&mut records, &text[start..i]);
                        start = i;
                        body_seen = false;
                    }
                    state = Scan::Tag { quoted: false };
                }
                b'{' => {
                    body_seen = true;
                    state = Scan::Comment;
                }
                _ if b.is_ascii_whitespace() => {}
                _ => {
                    if let Some(end) = marker_end(bytes, i) {
                        push_span(&mut records, &text[start..end]);
                        start = end;
                        body_seen = false;
                        line_blank = false;
                        i = end;
                        continue;
                    }
                    body_seen = true;
                }
            },
        }

        if b == b'\n' {
            line_blank = true;
        } else if !b.is_ascii_whitespace() {
            line_blank = false;
        }
        i += 1;
    }

    if start < text.len() {
        push_span(&mut records, &text[start..]);
    }

    records
}

/// End offset of a termination token starting at `i`, if one stands there as
/// a whole token.
fn marker_end(bytes: &[u8], i: usize) -> Option<usize> {
    if i > 0 && !matches!(bytes[i - 1], b' ' | b'\t' | b'\r' | b'\n' | b')' | b'}') {
        return None;
    }

    TERMINATION_MARKERS.iter().find_map(|marker| {
        let end = i + marker.len();
        let whole = bytes[i..].starts_with(marker.as_bytes())
            && bytes.get(end).is_none_or(|b| b.is_ascii_whitespace());
        whole.then_some(end)
    })
}

fn push_span<'a>(records: &mut Vec<&'a str>, span: &'a str) {
    let span = span.trim();
    if !span.is_empty() {
        records.push(span);
    }
}
