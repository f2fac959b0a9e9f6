// Content documents: frontmatter block + body
//
// The frontmatter is never reparsed and re-emitted. Reads pick simple
// top-level `key: value` scalars out of it; writes replace a single line.

const DELIMITER: &str = "---";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Raw frontmatter including both `---` lines and the trailing newline.
    frontmatter: Option<String>,
    body: String,
}

impl Document {
    pub fn parse(text: &str) -> Self {
        match split_frontmatter(text) {
            Some((frontmatter, body)) => Self {
                frontmatter: Some(frontmatter.to_string()),
                body: body.to_string(),
            },
            None => Self {
                frontmatter: None,
                body: text.to_string(),
            },
        }
    }

    pub fn frontmatter(&self) -> Option<&str> {
        self.frontmatter.as_deref()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Value of a top-level scalar field, unquoted. Empty values read as `None`.
    pub fn field(&self, key: &str) -> Option<String> {
        let frontmatter = self.frontmatter.as_deref()?;
        frontmatter_lines(frontmatter)
            .find_map(|line| field_value(line, key))
            .map(unquote)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Set a top-level scalar field in place, keeping the existing quote style.
    ///
    /// A missing field is appended at the end of the block. Documents without
    /// frontmatter are left unchanged and `false` is returned.
    pub fn set_field(&mut self, key: &str, value: &str) -> bool {
        let Some(frontmatter) = self.frontmatter.as_deref() else {
            return false;
        };

        let mut lines: Vec<String> = frontmatter.split_inclusive('\n').map(str::to_string).collect();
        let last_inner = lines.len().saturating_sub(1);

        let existing = lines
            .iter()
            .enumerate()
            .skip(1)
            .take(last_inner.saturating_sub(1))
            .find_map(|(i, line)| field_value(line, key).map(|raw| (i, quote_char(raw))));

        match existing {
            Some((i, quote)) => {
                let newline = if lines[i].ends_with('\n') { "\n" } else { "" };
                lines[i] = format_field(key, value, quote, newline);
            }
            None => {
                lines.insert(last_inner, format_field(key, value, Some('"'), "\n"));
            }
        }

        self.frontmatter = Some(lines.concat());
        true
    }

    /// Replace the body, keeping the frontmatter byte-for-byte.
    pub fn set_body(&mut self, markdown: &str) {
        self.body = if self.frontmatter.is_some() {
            format!("\n{}\n", markdown.trim())
        } else {
            format!("{}\n", markdown.trim())
        };
    }

    pub fn render(&self) -> String {
        match &self.frontmatter {
            Some(frontmatter) => format!("{}{}", frontmatter, self.body),
            None => self.body.clone(),
        }
    }
}

/// Split `text` into (frontmatter incl. delimiters, body). The opening
/// delimiter must be the first line.
fn split_frontmatter(text: &str) -> Option<(&str, &str)> {
    let first_line_end = text.find('\n')?;
    if text[..first_line_end].trim_end() != DELIMITER {
        return None;
    }

    let mut offset = first_line_end + 1;
    for line in text[offset..].split_inclusive('\n') {
        offset += line.len();
        if line.trim_end() == DELIMITER {
            return Some((&text[..offset], &text[offset..]));
        }
    }
    None
}

/// Lines between the delimiters.
fn frontmatter_lines(frontmatter: &str) -> impl Iterator<Item = &str> {
    let mut lines: Vec<&str> = frontmatter.lines().collect();
    if !lines.is_empty() {
        lines.remove(0);
    }
    lines.pop();
    lines.into_iter()
}

/// Raw value of `key` on this line if it is a top-level `key:` line.
fn field_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(key)?;
    let rest = rest.strip_prefix(':')?;
    Some(rest.trim())
}

fn quote_char(raw: &str) -> Option<char> {
    match raw.chars().next() {
        Some(c @ ('"' | '\'')) => Some(c),
        _ => None,
    }
}

fn unquote(raw: &str) -> &str {
    let raw = raw.trim();
    for quote in ['"', '\''] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return &raw[1..raw.len() - 1];
        }
    }
    raw
}

fn format_field(key: &str, value: &str, quote: Option<char>, newline: &str) -> String {
    match quote {
        Some('"') => format!("{}: \"{}\"{}", key, value.replace('"', "\\\""), newline),
        Some('\'') => format!("{}: '{}'{}", key, value.replace('\'', "''"), newline),
        _ => format!("{}: {}{}", key, value, newline),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST: &str = "---\ntitle: \"Barcode vs QR\"\nimage: https://cdn.prod.website-files.com/a/1_cover.jpg\nauthor: 'Sam'\ntags:\n  - tracking\n---\n\nOld body.\n";

    #[test]
    fn test_parse_and_render_is_lossless() {
        let doc = Document::parse(POST);
        assert_eq!(doc.body(), "\nOld body.\n");
        assert!(doc.frontmatter().unwrap().ends_with("---\n"));
        assert_eq!(doc.render(), POST);
    }

    #[test]
    fn test_document_without_frontmatter() {
        let doc = Document::parse("# Just markdown\n\n---\n\nwith a rule\n");
        assert!(doc.frontmatter().is_none());
        assert_eq!(doc.field("title"), None);
        assert_eq!(doc.render(), "# Just markdown\n\n---\n\nwith a rule\n");
    }

    #[test]
    fn test_unterminated_frontmatter_is_body() {
        let doc = Document::parse("---\ntitle: x\nno closing line\n");
        assert!(doc.frontmatter().is_none());
    }

    #[test]
    fn test_field_reads_unquoted_values() {
        let doc = Document::parse(POST);
        assert_eq!(doc.field("title").as_deref(), Some("Barcode vs QR"));
        assert_eq!(doc.field("author").as_deref(), Some("Sam"));
        assert_eq!(
            doc.field("image").as_deref(),
            Some("https://cdn.prod.website-files.com/a/1_cover.jpg")
        );
        assert_eq!(doc.field("tags"), None);
        assert_eq!(doc.field("missing"), None);
    }

    #[test]
    fn test_nested_keys_are_not_top_level_fields() {
        let doc = Document::parse("---\nseo:\n  image: nested.png\n---\nbody\n");
        assert_eq!(doc.field("image"), None);
    }

    #[test]
    fn test_set_field_keeps_quote_style_and_other_lines() {
        let mut doc = Document::parse(POST);
        assert!(doc.set_field("title", "Barcodes \"and\" QR"));
        assert!(doc.set_field("author", "Sam's team"));
        assert!(doc.set_field("image", "https://storage.test/blog/cover.jpg"));

        let rendered = doc.render();
        assert!(rendered.contains("title: \"Barcodes \\\"and\\\" QR\"\n"));
        assert!(rendered.contains("author: 'Sam''s team'\n"));
        assert!(rendered.contains("image: https://storage.test/blog/cover.jpg\n"));
        assert!(rendered.contains("tags:\n  - tracking\n---\n"));
        assert!(rendered.ends_with("\nOld body.\n"));
    }

    #[test]
    fn test_set_missing_field_appends_before_delimiter() {
        let mut doc = Document::parse("---\ntitle: Hello\n---\nbody\n");
        assert!(doc.set_field("image", "https://storage.test/a.png"));
        assert_eq!(
            doc.render(),
            "---\ntitle: Hello\nimage: \"https://storage.test/a.png\"\n---\nbody\n"
        );
    }

    #[test]
    fn test_set_field_without_frontmatter_is_noop() {
        let mut doc = Document::parse("plain\n");
        assert!(!doc.set_field("image", "x"));
        assert_eq!(doc.render(), "plain\n");
    }

    #[test]
    fn test_set_body_keeps_frontmatter_verbatim() {
        let mut doc = Document::parse(POST);
        let frontmatter = doc.frontmatter().unwrap().to_string();
        doc.set_body("## New\n\nScraped text.");

        assert_eq!(doc.frontmatter().unwrap(), frontmatter);
        assert_eq!(doc.render(), format!("{}\n## New\n\nScraped text.\n", frontmatter));
    }
}
