use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

pub const DEFAULT_MAX_HEADER_LINE_LENGTH: usize = 2000;

/// Configuration handed over by the host build at setup time.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationConfig {
    /// Flat `{ name: value }` or nested `{ route: { name: value } }` map.
    #[serde(default)]
    pub headers: Option<serde_json::Value>,
    /// Rewrite a bare `*` route to `/*`.
    #[serde(default)]
    pub workers: bool,
    #[serde(default)]
    pub csp: CspConfig,
}

impl IntegrationConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(&content)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CspMode {
    /// One union of hashes applied to every CSP-bearing route.
    #[default]
    Global,
    /// Hashes attributed to the route of the HTML file that produced them.
    Route,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    Warn,
    #[default]
    Error,
}

/// User-facing CSP options. Every field is optional; see [`CspConfig::resolve`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CspConfig {
    pub auto_hashes: Option<bool>,
    pub mode: Option<CspMode>,
    pub hash_style_elements: Option<bool>,
    pub hash_style_attributes: Option<bool>,
    pub hash_inline_scripts: Option<bool>,
    pub strip_unsafe_inline: Option<bool>,
    pub max_header_line_length: Option<f64>,
    pub overflow: Option<OverflowPolicy>,
}

/// Resolved, immutable CSP options.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CspOptions {
    pub auto_hashes: bool,
    pub mode: CspMode,
    pub hash_style_elements: bool,
    pub hash_style_attributes: bool,
    pub hash_inline_scripts: bool,
    pub strip_unsafe_inline: bool,
    pub max_header_line_length: usize,
    pub overflow: OverflowPolicy,
}

impl Default for CspOptions {
    fn default() -> Self {
        CspConfig::default().resolve()
    }
}

impl CspConfig {
    pub fn resolve(&self) -> CspOptions {
        CspOptions {
            auto_hashes: self.auto_hashes.unwrap_or(false),
            mode: self.mode.unwrap_or_default(),
            hash_style_elements: self.hash_style_elements.unwrap_or(true),
            hash_style_attributes: self.hash_style_attributes.unwrap_or(true),
            hash_inline_scripts: self.hash_inline_scripts.unwrap_or(false),
            strip_unsafe_inline: self.strip_unsafe_inline.unwrap_or(true),
            max_header_line_length: resolve_line_limit(self.max_header_line_length),
            overflow: self.overflow.unwrap_or_default(),
        }
    }
}

fn resolve_line_limit(raw: Option<f64>) -> usize {
    match raw {
        Some(n) if n.is_finite() && n > 0.0 => (n.floor() as usize).max(1),
        _ => DEFAULT_MAX_HEADER_LINE_LENGTH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = CspConfig::default().resolve();
        assert!(!opts.auto_hashes);
        assert_eq!(opts.mode, CspMode::Global);
        assert!(opts.hash_style_elements);
        assert!(opts.hash_style_attributes);
        assert!(!opts.hash_inline_scripts);
        assert!(opts.strip_unsafe_inline);
        assert_eq!(opts.max_header_line_length, 2000);
        assert_eq!(opts.overflow, OverflowPolicy::Error);
    }

    #[test]
    fn test_line_limit_fallback() {
        assert_eq!(resolve_line_limit(Some(0.0)), 2000);
        assert_eq!(resolve_line_limit(Some(-5.0)), 2000);
        assert_eq!(resolve_line_limit(Some(f64::NAN)), 2000);
        assert_eq!(resolve_line_limit(Some(f64::INFINITY)), 2000);
        assert_eq!(resolve_line_limit(Some(40.0)), 40);
        assert_eq!(resolve_line_limit(Some(40.9)), 40);
        assert_eq!(resolve_line_limit(Some(0.5)), 1);
    }

    #[test]
    fn test_parse_camel_case() {
        let config = IntegrationConfig::from_json(
            r#"{
                "headers": { "X-Test": "value" },
                "workers": true,
                "csp": {
                    "autoHashes": true,
                    "mode": "route",
                    "hashInlineScripts": true,
                    "maxHeaderLineLength": 120,
                    "overflow": "warn"
                }
            }"#,
        )
        .unwrap();

        assert!(config.workers);
        let opts = config.csp.resolve();
        assert!(opts.auto_hashes);
        assert_eq!(opts.mode, CspMode::Route);
        assert!(opts.hash_inline_scripts);
        assert_eq!(opts.max_header_line_length, 120);
        assert_eq!(opts.overflow, OverflowPolicy::Warn);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let result = IntegrationConfig::from_json(r#"{ "csp": { "mode": "page" } }"#);
        assert!(matches!(result, Err(Error::Json(_))));
    }
}
