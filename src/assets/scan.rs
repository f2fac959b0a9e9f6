// Discovery of legacy CDN URLs inside content text

use regex::Regex;
use std::collections::HashSet;

/// Hosts the legacy CMS served uploaded files from.
pub const DEFAULT_CDN_HOSTS: &[&str] = &[
    "cdn.prod.website-files.com",
    "assets-global.website-files.com",
    "assets.website-files.com",
    "uploads-ssl.webflow.com",
];

/// URL path up to the first character that ends a URL inside Markdown, HTML
/// attributes or YAML. Balanced `(...)` groups stay in the URL since the CDN
/// keeps them in filenames; an unmatched `)` closes a Markdown link.
const URL_BODY: &str = r#"(?:[^\s"'()<>\[\]`]|\([^\s"'()<>\[\]`]*\))+"#;

/// Trailing punctuation that belongs to the surrounding sentence, not the URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?'];

/// Matches asset URLs on a fixed set of CDN hosts.
#[derive(Debug, Clone)]
pub struct CdnMatcher {
    regex: Regex,
}

impl CdnMatcher {
    pub fn new<S: AsRef<str>>(hosts: &[S]) -> Result<Self, regex::Error> {
        let alternatives: Vec<String> = hosts
            .iter()
            .map(|h| regex::escape(h.as_ref().trim_end_matches('/')))
            .collect();
        let pattern = format!(r"https?://(?:{})/{}", alternatives.join("|"), URL_BODY);
        Ok(Self {
            regex: Regex::new(&pattern)?,
        })
    }

    pub fn with_default_hosts() -> Result<Self, regex::Error> {
        Self::new(DEFAULT_CDN_HOSTS)
    }

    /// Matches URLs under `prefix`, e.g. the public root of a storage bucket.
    pub fn with_prefix(prefix: &str) -> Result<Self, regex::Error> {
        let pattern = format!("{}{}", regex::escape(prefix), URL_BODY);
        Ok(Self {
            regex: Regex::new(&pattern)?,
        })
    }

    /// Distinct CDN URLs in `text`, in order of first appearance.
    pub fn find_urls(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.regex
            .find_iter(text)
            .map(|m| m.as_str().trim_end_matches(TRAILING_PUNCTUATION).to_string())
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }
}
