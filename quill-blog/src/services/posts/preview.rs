use regex::Regex;

pub const DEFAULT_PREVIEW_CHARS: usize = 150;

/// Builds list previews: post HTML with tags removed, cut to a number of
/// characters. Entities are left as written.
#[derive(Debug, Clone)]
pub struct Previewer {
    tags: Regex,
}

impl Previewer {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            tags: Regex::new(r"<[^>]*>")?,
        })
    }

    pub fn strip_tags<'a>(&self, html: &'a str) -> std::borrow::Cow<'a, str> {
        self.tags.replace_all(html, "")
    }

    pub fn preview(&self, html: &str, max_chars: usize) -> String {
        self.strip_tags(html).chars().take(max_chars).collect()
    }
}
