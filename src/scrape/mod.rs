//! Legacy Page Scraper
//!
//! Fetches a live page from the legacy CMS and pulls out its article body.
//!
//! The body is taken from the first `<div>` whose class list contains
//! `w-richtext`, which is where the legacy CMS renders rich-text fields. This
//! is a heuristic tied to the legacy markup: the only check that the right
//! region was found is a minimum length on the converted Markdown.

use crate::content::{ContentFile, Document};
use crate::convert::html_to_markdown;
use regex::Regex;
use reqwest::Client;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::debug;

/// Converted bodies shorter than this are treated as failed extractions.
pub const MIN_CONTENT_CHARS: usize = 100;

#[allow(clippy::expect_used)]
static RICHTEXT_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<div\b[^>]*\bclass\s*=\s*["'](?:[^"']*\s)?w-richtext(?:\s[^"']*)?["'][^>]*>"#)
        .expect("hardcoded regex pattern is valid")
});

#[allow(clippy::expect_used)]
static DIV_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<div\b|</div\s*>").expect("hardcoded regex pattern is valid")
});

#[allow(clippy::expect_used)]
static OG_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<meta\b[^>]*\bproperty\s*=\s*["']og:image["'][^>]*>"#)
        .expect("hardcoded regex pattern is valid")
});

#[allow(clippy::expect_used)]
static CONTENT_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\scontent\s*=\s*["']([^"']+)["']"#).expect("hardcoded regex pattern is valid")
});

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no legacy URL: set `legacy_url` in frontmatter or LEGACY_SITE_URL")]
    NoLegacyUrl,

    #[error("page unreachable: {0}")]
    Unreachable(String),

    #[error("no w-richtext region found")]
    MarkupMissing,

    #[error("extracted content too short ({0} chars)")]
    TooShort(usize),
}

/// Article content pulled from a legacy page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyPage {
    pub url: String,
    pub markdown: String,
    pub og_image: Option<String>,
}

/// Inner HTML of the first `w-richtext` div, with nested divs balanced.
///
/// An unclosed region runs to the end of the document.
pub fn extract_rich_text(html: &str) -> Option<&str> {
    let open = RICHTEXT_OPEN.find(html)?;
    let start = open.end();
    let mut depth = 1usize;

    for boundary in DIV_BOUNDARY.find_iter(&html[start..]) {
        if boundary.as_str().starts_with("</") {
            depth -= 1;
            if depth == 0 {
                return Some(&html[start..start + boundary.start()]);
            }
        } else {
            depth += 1;
        }
    }

    Some(&html[start..])
}

/// `og:image` meta content, if the page declares one.
pub fn extract_og_image(html: &str) -> Option<String> {
    let tag = OG_IMAGE.find(html)?;
    CONTENT_ATTR
        .captures(tag.as_str())
        .map(|c| c[1].trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Convert a fetched page into its article Markdown.
pub fn parse_page(url: &str, html: &str) -> Result<LegacyPage, ExtractionError> {
    let region = extract_rich_text(html).ok_or(ExtractionError::MarkupMissing)?;
    let markdown = html_to_markdown(region);
    let chars = markdown.chars().count();
    if chars < MIN_CONTENT_CHARS {
        return Err(ExtractionError::TooShort(chars));
    }

    Ok(LegacyPage {
        url: url.to_string(),
        markdown,
        og_image: extract_og_image(html),
    })
}

/// Fetch and parse a legacy page.
pub async fn scrape_page(client: &Client, url: &str) -> Result<LegacyPage, ExtractionError> {
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| ExtractionError::Unreachable(e.to_string()))?;
    let html = response
        .text()
        .await
        .map_err(|e| ExtractionError::Unreachable(e.to_string()))?;

    debug!(url = %url, bytes = html.len(), "Fetched legacy page");
    parse_page(url, &html)
}

/// Where a content file lived on the legacy site.
///
/// An explicit `legacy_url` frontmatter field wins; otherwise the URL is
/// `{legacy_base}/{category}/{slug}`, with `slug` from frontmatter or the
/// file stem.
pub fn legacy_url_for(file: &ContentFile, legacy_base: Option<&str>) -> Result<String, ExtractionError> {
    let doc = Document::parse(&file.text);
    if let Some(url) = doc.field("legacy_url") {
        return Ok(url);
    }

    let base = legacy_base.ok_or(ExtractionError::NoLegacyUrl)?;
    let slug = doc.field("slug").unwrap_or_else(|| file.stem());
    Ok(format!(
        "{}/{}/{}",
        base.trim_end_matches('/'),
        file.category.as_str(),
        slug.trim_matches('/')
    ))
}
