// URL → URL replacement across whole documents

use std::collections::HashMap;

/// Old URL → new URL, built once the upload phase has finished.
#[derive(Debug, Clone, Default)]
pub struct UrlMap {
    entries: HashMap<String, String>,
}

impl UrlMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, old: impl Into<String>, new: impl Into<String>) {
        self.entries.insert(old.into(), new.into());
    }

    pub fn get(&self, old: &str) -> Option<&str> {
        self.entries.get(old).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries with longer keys first, so a URL that is a prefix of another
    /// never rewrites part of the longer one.
    fn ordered(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<(&str, &str)> = self
            .entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        pairs.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));
        pairs
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for UrlMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = UrlMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    pub replacements: usize,
}

impl Rewrite {
    pub fn changed(&self) -> bool {
        self.replacements > 0
    }
}

/// Replace every literal occurrence of each old URL in `text`.
pub fn rewrite_urls(text: &str, map: &UrlMap) -> Rewrite {
    let mut current = text.to_string();
    let mut replacements = 0;

    for (old, new) in map.ordered() {
        if old.is_empty() || old == new {
            continue;
        }
        let count = current.matches(old).count();
        if count > 0 {
            current = current.replace(old, new);
            replacements += count;
        }
    }

    Rewrite {
        text: current,
        replacements,
    }
}
