//! Inline style/script hash extraction over raw HTML text.
//!
//! This is pattern matching over markup, not a DOM parse. Exotic markup may
//! be missed.

use base64::Engine;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

use crate::config::CspOptions;

static STYLE_ELEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b([^>]*)>(.*?)</style\s*>").unwrap());

static SCRIPT_ELEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script\s*>").unwrap());

static SRC_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bsrc\s*=").unwrap());

static INTEGRITY_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\bintegrity\s*=\s*["']?(sha256-[A-Za-z0-9+/]{43}=)"#).unwrap()
});

static STYLE_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)style\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#).unwrap()
});

static HTML_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)&(?:quot|#34|#x22|apos|#39|#x27|lt|gt|amp);").unwrap());

/// Which inline content to hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    pub style_elements: bool,
    pub style_attributes: bool,
    pub inline_scripts: bool,
}

impl From<&CspOptions> for ExtractOptions {
    fn from(options: &CspOptions) -> Self {
        Self {
            style_elements: options.hash_style_elements,
            style_attributes: options.hash_style_attributes,
            inline_scripts: options.hash_inline_scripts,
        }
    }
}

/// Quoted `'sha256-…'` tokens found so far, one set per category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashSources {
    pub style_elements: BTreeSet<String>,
    pub style_attributes: BTreeSet<String>,
    pub scripts: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HashCounts {
    pub style_elements: usize,
    pub style_attributes: usize,
    pub scripts: usize,
}

impl HashSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unions `other` into `self`.
    pub fn absorb(&mut self, other: &HashSources) {
        self.style_elements
            .extend(other.style_elements.iter().cloned());
        self.style_attributes
            .extend(other.style_attributes.iter().cloned());
        self.scripts.extend(other.scripts.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.style_elements.is_empty() && self.style_attributes.is_empty() && self.scripts.is_empty()
    }

    pub fn counts(&self) -> HashCounts {
        HashCounts {
            style_elements: self.style_elements.len(),
            style_attributes: self.style_attributes.len(),
            scripts: self.scripts.len(),
        }
    }
}

/// `sha256-<base64>` of the UTF-8 bytes of `content`.
pub fn content_hash(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    format!(
        "sha256-{}",
        base64::engine::general_purpose::STANDARD.encode(digest)
    )
}

fn quoted(hash: &str) -> String {
    format!("'{}'", hash)
}

/// Scans one HTML document and adds its hashes to `sources`.
pub fn extract_hashes(html: &str, options: &ExtractOptions, sources: &mut HashSources) {
    if options.style_elements {
        for caps in STYLE_ELEMENT.captures_iter(html) {
            let attrs = group(&caps, 1);
            let body = group(&caps, 2);
            if let Some(hash) = pinned_or_computed(attrs, body, !body.is_empty()) {
                sources.style_elements.insert(hash);
            }
        }
    }

    if options.inline_scripts {
        for caps in SCRIPT_ELEMENT.captures_iter(html) {
            let attrs = group(&caps, 1);
            if SRC_ATTRIBUTE.is_match(attrs) {
                continue;
            }
            let body = group(&caps, 2);
            if body.trim().is_empty() {
                continue;
            }
            if let Some(hash) = pinned_or_computed(attrs, body, true) {
                sources.scripts.insert(hash);
            }
        }
    }

    if options.style_attributes {
        for caps in STYLE_ATTRIBUTE.captures_iter(html) {
            let value = caps
                .get(1)
                .or_else(|| caps.get(2))
                .or_else(|| caps.get(3))
                .map(|m| m.as_str())
                .unwrap_or_default();
            if value.is_empty() {
                continue;
            }

            sources.style_attributes.insert(quoted(&content_hash(value)));
            let decoded = decode_entities(value);
            if decoded != value {
                sources
                    .style_attributes
                    .insert(quoted(&content_hash(&decoded)));
            }
        }
    }
}

/// An `integrity="sha256-…"` pin on the opening tag wins over hashing the body.
fn pinned_or_computed(attrs: &str, body: &str, hash_body: bool) -> Option<String> {
    if let Some(pinned) = INTEGRITY_ATTRIBUTE.captures(attrs).and_then(|c| c.get(1)) {
        return Some(quoted(pinned.as_str()));
    }
    hash_body.then(|| quoted(&content_hash(body)))
}

fn group<'h>(caps: &Captures<'h>, index: usize) -> &'h str {
    caps.get(index).map(|m| m.as_str()).unwrap_or_default()
}

/// Decodes the quote, angle-bracket and ampersand entities in one pass.
pub fn decode_entities(value: &str) -> String {
    HTML_ENTITY
        .replace_all(value, |caps: &Captures| {
            match caps[0].to_ascii_lowercase().as_str() {
                "&quot;" | "&#34;" | "&#x22;" => "\"",
                "&apos;" | "&#39;" | "&#x27;" => "'",
                "&lt;" => "<",
                "&gt;" => ">",
                _ => "&",
            }
        })
        .into_owned()
}
