//! HTML → Markdown conversion for legacy CMS rich text
//!
//! A fixed, ordered chain of regex substitutions tuned to the markup the
//! legacy CMS emits for rich-text fields. It is not an HTML parser: nested
//! or arbitrary markup is converted on a best-effort basis only.
//!
//! Order of passes:
//!
//! 1. images (before any tag stripping, so `src`/`alt` survive)
//! 2. headings `h1`–`h4`
//! 3. blockquotes
//! 4. bold, then italic
//! 5. links
//! 6. ordered and unordered lists
//! 7. paragraphs, line breaks, horizontal rules
//! 8. strip every remaining tag
//! 9. decode the fixed entity set (`&amp;` last)
//! 10. collapse blank lines and trailing whitespace

use regex::{Captures, Regex};
use std::sync::LazyLock;

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        #[allow(clippy::expect_used)]
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect("hardcoded regex pattern is valid"));
    };
}

pattern!(IMG_TAG, r"(?is)<img\b[^>]*>");
pattern!(SRC_ATTR, r#"(?is)(?:^|\s)src\s*=\s*["']([^"']*)["']"#);
pattern!(ALT_ATTR, r#"(?is)(?:^|\s)alt\s*=\s*["']([^"']*)["']"#);
pattern!(H1, r"(?is)<h1\b[^>]*>(.*?)</h1\s*>");
pattern!(H2, r"(?is)<h2\b[^>]*>(.*?)</h2\s*>");
pattern!(H3, r"(?is)<h3\b[^>]*>(.*?)</h3\s*>");
pattern!(H4, r"(?is)<h4\b[^>]*>(.*?)</h4\s*>");
pattern!(BLOCKQUOTE, r"(?is)<blockquote\b[^>]*>(.*?)</blockquote\s*>");
pattern!(BOLD, r"(?is)<(?:strong|b)(?:\s[^>]*)?>(.*?)</(?:strong|b)\s*>");
pattern!(ITALIC, r"(?is)<(?:em|i)(?:\s[^>]*)?>(.*?)</(?:em|i)\s*>");
pattern!(LINK, r#"(?is)<a\b[^>]*?\shref\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a\s*>"#);
pattern!(ORDERED_LIST, r"(?is)<ol\b[^>]*>(.*?)</ol\s*>");
pattern!(LIST_ITEM, r"(?is)<li\b[^>]*>(.*?)</li\s*>");
pattern!(LIST_WRAPPER, r"(?is)</?ul\b[^>]*>");
pattern!(PARAGRAPH, r"(?is)<p(?:\s[^>]*)?>(.*?)</p\s*>");
pattern!(LINE_BREAK, r"(?i)<br\s*/?>");
pattern!(HORIZONTAL_RULE, r"(?i)<hr\b[^>]*>");
pattern!(ANY_TAG, r"(?s)<[^>]+>");
pattern!(TRAILING_SPACE, r"[ \t]+\n");
pattern!(BLANK_LINES, r"\n{3,}");

/// Entities decoded after all tag work. `&amp;` must stay last so that an
/// escaped entity such as `&amp;lt;` decodes to `&lt;`, not `<`.
///
/// Decoded `&lt;`/`&gt;` produce literal angle brackets, so converting the
/// output a second time strips them as tags: the converter is only idempotent
/// on text without escaped markup.
const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&#x27;", "'"),
    ("&rsquo;", "\u{2019}"),
    ("&lsquo;", "\u{2018}"),
    ("&rdquo;", "\u{201D}"),
    ("&ldquo;", "\u{201C}"),
    ("&mdash;", "\u{2014}"),
    ("&ndash;", "\u{2013}"),
    ("&hellip;", "\u{2026}"),
    ("&amp;", "&"),
];

/// Convert a legacy rich-text HTML fragment to Markdown.
pub fn html_to_markdown(html: &str) -> String {
    let mut md = IMG_TAG
        .replace_all(html, |caps: &Captures| {
            let tag = &caps[0];
            let src = SRC_ATTR.captures(tag).map(|c| c[1].trim().to_string());
            let alt = ALT_ATTR.captures(tag).map(|c| c[1].trim().to_string()).unwrap_or_default();
            match src {
                Some(src) if !src.is_empty() => format!("\n\n![{}]({})\n\n", alt, src),
                _ => String::new(),
            }
        })
        .into_owned();

    for (regex, hashes) in [(&H1, "#"), (&H2, "##"), (&H3, "###"), (&H4, "####")] {
        md = regex
            .replace_all(&md, |caps: &Captures| {
                format!("\n\n{} {}\n\n", hashes, collapse_inline(&caps[1]))
            })
            .into_owned();
    }

    md = BLOCKQUOTE
        .replace_all(&md, |caps: &Captures| {
            // Inline tags inside the quote are left for the later passes.
            let inner = PARAGRAPH.replace_all(&caps[1], "$1\n");
            let inner = LINE_BREAK.replace_all(&inner, "\n");
            let quoted: Vec<String> = inner
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(|line| format!("> {}", line))
                .collect();
            format!("\n\n{}\n\n", quoted.join("\n"))
        })
        .into_owned();

    md = BOLD.replace_all(&md, "**$1**").into_owned();
    md = ITALIC.replace_all(&md, "*$1*").into_owned();

    md = LINK
        .replace_all(&md, |caps: &Captures| {
            let text = collapse_inline(&caps[2]);
            let href = caps[1].trim();
            if text.is_empty() {
                String::new()
            } else {
                format!("[{}]({})", text, href)
            }
        })
        .into_owned();

    md = ORDERED_LIST
        .replace_all(&md, |caps: &Captures| {
            let items: Vec<String> = LIST_ITEM
                .captures_iter(&caps[1])
                .enumerate()
                .map(|(i, item)| format!("{}. {}", i + 1, collapse_inline(&item[1])))
                .collect();
            format!("\n\n{}\n\n", items.join("\n"))
        })
        .into_owned();
    md = LIST_ITEM
        .replace_all(&md, |caps: &Captures| format!("- {}\n", collapse_inline(&caps[1])))
        .into_owned();
    md = LIST_WRAPPER.replace_all(&md, "\n\n").into_owned();

    md = PARAGRAPH
        .replace_all(&md, |caps: &Captures| format!("{}\n\n", caps[1].trim()))
        .into_owned();
    md = LINE_BREAK.replace_all(&md, "\n").into_owned();
    md = HORIZONTAL_RULE.replace_all(&md, "\n\n---\n\n").into_owned();

    md = strip_tags(&md);
    md = decode_entities(&md);

    normalize_whitespace(&md)
}

/// Remove every remaining tag, keeping the text between them.
pub fn strip_tags(html: &str) -> String {
    ANY_TAG.replace_all(html, "").into_owned()
}

/// Decode the fixed entity set.
pub fn decode_entities(text: &str) -> String {
    ENTITIES
        .iter()
        .fold(text.to_string(), |acc, (entity, plain)| acc.replace(entity, plain))
}

fn normalize_whitespace(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let text = TRAILING_SPACE.replace_all(&text, "\n");
    let text = BLANK_LINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Inline content (heading text, list items, link labels) is kept on one line.
fn collapse_inline(html: &str) -> String {
    html.split_whitespace().collect::<Vec<_>>().join(" ")
}
