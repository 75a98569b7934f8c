//! # Configuration
//!
//! A string key/value store with dotted keys, set through
//! `app.set("posts.dataDir", "data")` and read back with `app.get(..)`.
//! Hooks see an immutable [`QuillConfigSnapshot`] taken when the call began.
//!
//! Environment overrides follow a `PREFIX__SECTION__KEY` convention, see
//! [`load_env_config`]:
//!
//! ```bash
//! export QUILL__POSTS__PREVIEW_CHARS=200   # posts.previewChars = 200
//! ```

use std::collections::HashMap;

use crate::QuillApp;

#[derive(Debug, Default)]
pub struct QuillConfig {
    values: HashMap<String, String>,
}

impl QuillConfig {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn snapshot(&self) -> QuillConfigSnapshot {
        QuillConfigSnapshot::new(self.values.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuillConfigSnapshot {
    map: HashMap<String, String>,
}

impl QuillConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse::<usize>().ok())
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.trim().parse::<bool>().ok())
    }
}

/// Copy every `PREFIX…` environment variable into the app config.
///
/// `QUILL__HTTP__PORT=8080` with prefix `QUILL__` becomes `http.port = 8080`;
/// `QUILL__POSTS__PREVIEW_CHARS` becomes `posts.previewChars`.
/// Returns how many keys were set.
pub fn load_env_config<R, P>(app: &QuillApp<R, P>, prefix: &str) -> usize
where
    R: Send + 'static,
    P: Send + Clone + 'static,
{
    load_from_pairs(app, prefix, std::env::vars())
}

fn load_from_pairs<R, P, I>(app: &QuillApp<R, P>, prefix: &str, vars: I) -> usize
where
    R: Send + 'static,
    P: Send + Clone + 'static,
    I: IntoIterator<Item = (String, String)>,
{
    let mut count = 0;
    for (key, value) in vars {
        if let Some(stripped) = key.strip_prefix(prefix) {
            let normalized = stripped
                .split("__")
                .map(camel_case)
                .collect::<Vec<_>>()
                .join(".");
            if normalized.is_empty() {
                continue;
            }
            app.set(normalized, value);
            count += 1;
        }
    }
    count
}

/// `PREVIEW_CHARS` → `previewChars`
fn camel_case(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for (i, word) in segment.split('_').filter(|w| !w.is_empty()).enumerate() {
        let word = word.to_lowercase();
        if i == 0 {
            out.push_str(&word);
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
