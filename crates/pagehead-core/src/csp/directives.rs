//! Content-Security-Policy directive codec.
//!
//! Directive names are kept verbatim. Callers match them case-sensitively
//! against the lowercase literals below.

use std::collections::HashMap;

pub const STYLE_SRC: &str = "style-src";
pub const STYLE_SRC_ATTR: &str = "style-src-attr";
pub const SCRIPT_SRC: &str = "script-src";

/// A CSP value split into directives, remembering first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCsp {
    directives: HashMap<String, String>,
    order: Vec<String>,
}

impl ParsedCsp {
    pub fn parse(raw: &str) -> Self {
        let mut parsed = Self::default();

        for segment in raw.split(';') {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }

            let (name, value) = match segment.split_once(' ') {
                Some((name, value)) => (name, value.trim()),
                None => (segment, ""),
            };
            parsed.set(name, value);
        }

        parsed
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.directives.get(name).map(String::as_str)
    }

    /// Sets a directive value. A new name goes to the end of the order;
    /// an existing one keeps its position.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        if self
            .directives
            .insert(name.to_string(), value.into())
            .is_none()
        {
            self.order.push(name.to_string());
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Renders `name value; name value` without a trailing semicolon.
    pub fn serialize(&self) -> String {
        let mut parts = Vec::with_capacity(self.directives.len());

        for name in &self.order {
            if let Some(value) = self.directives.get(name) {
                parts.push(render_directive(name, value));
            }
        }

        // Names outside the order list come last, sorted for stable output.
        let mut stray: Vec<_> = self
            .directives
            .iter()
            .filter(|(name, _)| !self.order.contains(*name))
            .collect();
        stray.sort();
        parts.extend(stray.into_iter().map(|(n, v)| render_directive(n, v)));

        parts.join("; ")
    }
}

fn render_directive(name: &str, value: &str) -> String {
    if value.is_empty() {
        name.to_string()
    } else {
        format!("{} {}", name, value)
    }
}
