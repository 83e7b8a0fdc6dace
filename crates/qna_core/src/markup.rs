//! Minimal inline-emphasis transform for chat text.
//!
//! `**bold**` is replaced first, then `*italic*`, each matching the leftmost
//! opening marker with the nearest closing one on the same line. Newlines
//! become the target's line break.

/// Output vocabulary for [`render_inline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkupTags {
    pub strong_open: &'static str,
    pub strong_close: &'static str,
    pub em_open: &'static str,
    pub em_close: &'static str,
    pub line_break: &'static str,
    pub escape_html: bool,
}

pub const HTML: MarkupTags = MarkupTags {
    strong_open: "<strong>",
    strong_close: "</strong>",
    em_open: "<em>",
    em_close: "</em>",
    line_break: "<br>",
    escape_html: true,
};

pub const ANSI: MarkupTags = MarkupTags {
    strong_open: "\x1b[1m",
    strong_close: "\x1b[22m",
    em_open: "\x1b[3m",
    em_close: "\x1b[23m",
    line_break: "\n",
    escape_html: false,
};

pub fn render_inline(text: &str, tags: &MarkupTags) -> String {
    let source = if tags.escape_html {
        escape_html(text)
    } else {
        text.to_owned()
    };

    source
        .split('\n')
        .map(|line| {
            let strong = replace_delimited(line, "**", tags.strong_open, tags.strong_close);
            replace_delimited(&strong, "*", tags.em_open, tags.em_close)
        })
        .collect::<Vec<_>>()
        .join(tags.line_break)
}

fn replace_delimited(line: &str, delimiter: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(start) = rest.find(delimiter) {
        let after = &rest[start + delimiter.len()..];
        // No closing marker after the leftmost opener means none after any later opener either.
        let Some(end) = after.find(delimiter) else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str(open);
        out.push_str(&after[..end]);
        out.push_str(close);
        rest = &after[end + delimiter.len()..];
    }
    out.push_str(rest);
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
