//! Path templates: `~` expansion and strftime-style placeholders.
//!
//! A path containing `%` is treated as a format string against the run
//! timestamp, so `backup/%w/` becomes `backup/3/` on a Wednesday. Codes chrono
//! does not know are copied through untouched. There is no escape besides
//! `%%`; a literal `%` in a path will be read as a placeholder.

use std::env;
use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset};

pub const TEMPLATE_MARKER: char = '%';

// Longest specifier chrono accepts is `%::z`-like, four chars after the marker.
const MAX_SPECIFIER_LEN: usize = 4;

#[derive(Debug, Clone, Default)]
pub struct TemplateResolver {
    home: Option<String>,
}

impl TemplateResolver {
    pub fn from_env() -> Self {
        Self {
            home: env::var("HOME").ok().filter(|h| !h.is_empty()),
        }
    }

    pub fn with_home(home: impl Into<String>) -> Self {
        Self {
            home: Some(home.into()),
        }
    }

    pub fn resolve(&self, path: &str, at: &DateTime<FixedOffset>) -> String {
        let expanded = self.expand_home(path);
        if !expanded.contains(TEMPLATE_MARKER) {
            return expanded;
        }
        format_permissive(&expanded, at)
    }

    fn expand_home(&self, path: &str) -> String {
        let Some(home) = self.home.as_deref() else {
            return path.to_string();
        };
        if path == "~" {
            return home.to_string();
        }
        match path.strip_prefix("~/") {
            Some(rest) => format!("{}/{}", home.trim_end_matches('/'), rest),
            None => path.to_string(),
        }
    }
}

fn format_permissive(template: &str, at: &DateTime<FixedOffset>) -> String {
    let mut out = String::with_capacity(template.len() + 8);
    let mut rest = template;
    while let Some(pos) = rest.find(TEMPLATE_MARKER) {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match render_specifier(rest, at) {
            Some((rendered, consumed)) => {
                out.push_str(&rendered);
                rest = &rest[consumed..];
            }
            None => {
                out.push(TEMPLATE_MARKER);
                rest = &rest[TEMPLATE_MARKER.len_utf8()..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Renders the shortest specifier at the start of `input` that chrono
/// understands. Returns the rendered text and the number of bytes consumed.
fn render_specifier(input: &str, at: &DateTime<FixedOffset>) -> Option<(String, usize)> {
    for (idx, ch) in input.char_indices().skip(1).take(MAX_SPECIFIER_LEN) {
        let end = idx + ch.len_utf8();
        let candidate = &input[..end];
        let items: Vec<Item<'_>> = StrftimeItems::new(candidate).collect();
        if items.is_empty() || items.iter().any(|item| matches!(item, Item::Error)) {
            continue;
        }
        let mut rendered = String::new();
        if write!(rendered, "{}", at.format_with_items(items.into_iter())).is_err() {
            return None;
        }
        return Some((rendered, end));
    }
    None
}
