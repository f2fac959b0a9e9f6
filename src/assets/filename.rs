// CDN URL → human filename, with collision handling

use percent_encoding::percent_decode_str;
use std::collections::{HashMap, HashSet};
use url::Url;

/// Derive a human filename from a legacy CDN URL.
///
/// The CDN stores uploads as `<hash>_<filename>`; the part after the first
/// underscore of the decoded last path segment is the original name. A
/// segment without an underscore is returned whole. Anything unparseable
/// gets a timestamped fallback name.
pub fn resolve_filename(source_url: &str) -> String {
    try_resolve(source_url)
        .unwrap_or_else(|| format!("asset-{}", chrono::Utc::now().timestamp_millis()))
}

fn try_resolve(source_url: &str) -> Option<String> {
    let parsed = Url::parse(source_url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let decoded = percent_decode_str(segment).decode_utf8().ok()?;
    let decoded = decoded.trim().replace('/', "-");
    if decoded.is_empty() {
        return None;
    }

    let name = match decoded.split_once('_') {
        Some((_, rest)) if !rest.is_empty() => rest.to_string(),
        _ => decoded,
    };
    Some(name)
}

/// Insert `-{n}` before the extension: `photo.jpg` → `photo-2.jpg`.
pub fn with_suffix(filename: &str, n: usize) -> String {
    match filename.rfind('.') {
        Some(dot) if dot > 0 => format!("{}-{}{}", &filename[..dot], n, &filename[dot..]),
        _ => format!("{}-{}", filename, n),
    }
}

/// Assigns unique filenames to source URLs within one storage folder.
///
/// The first URL to claim a derived name keeps it; later distinct URLs with
/// the same derived name get `-1`, `-2`, … The counter is keyed by the
/// derived name, not by the disambiguated one.
#[derive(Debug, Default)]
pub struct FilenameRegistry {
    counters: HashMap<String, usize>,
    assigned: HashMap<String, String>,
    taken: HashSet<String>,
}

impl FilenameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filename for `source_url`. Asking twice for the same URL returns the same name.
    pub fn assign(&mut self, source_url: &str) -> String {
        if let Some(existing) = self.assigned.get(source_url) {
            return existing.clone();
        }

        let base = resolve_filename(source_url);
        let counter = self.counters.entry(base.clone()).or_insert(0);
        let mut name = if *counter == 0 {
            base.clone()
        } else {
            with_suffix(&base, *counter)
        };
        *counter += 1;

        // A suffixed name can clash with a URL whose own derived name already had that form.
        while self.taken.contains(&name) {
            name = with_suffix(&base, *counter);
            *counter += 1;
        }

        self.taken.insert(name.clone());
        self.assigned.insert(source_url.to_string(), name.clone());
        name
    }

    /// Mark `filename` as used without assigning it to any URL.
    pub fn reserve(&mut self, filename: impl Into<String>) {
        self.taken.insert(filename.into());
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}
