//! End-to-end tests for the `_headers` build hook.

use pagehead_core::csp::content_hash;
use pagehead_core::{CspMode, Error, HeadersIntegration, IntegrationConfig};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn integration(config: serde_json::Value) -> HeadersIntegration {
    let config: IntegrationConfig = serde_json::from_value(config).unwrap();
    HeadersIntegration::setup(config).unwrap()
}

fn read_headers(dir: &TempDir) -> String {
    fs::read_to_string(dir.path().join("_headers")).unwrap()
}

#[test]
fn test_flat_config_output() {
    let dir = TempDir::new().unwrap();
    let report = integration(json!({ "headers": { "X-Test": "value" } }))
        .build_done(dir.path())
        .unwrap();

    assert!(report.written);
    assert_eq!(read_headers(&dir), "/*\n  X-Test: value\n");
}

#[test]
fn test_nested_config_output() {
    let dir = TempDir::new().unwrap();
    integration(json!({ "headers": { "/test": { "X-Test": "value" } } }))
        .build_done(dir.path())
        .unwrap();

    assert_eq!(read_headers(&dir), "/test\n  X-Test: value\n");
}

#[test]
fn test_case_variant_headers_both_render() {
    let dir = TempDir::new().unwrap();
    integration(json!({ "headers": { "/a": { "X-Custom": "one", "x-custom": "two" } } }))
        .build_done(dir.path())
        .unwrap();

    assert_eq!(read_headers(&dir), "/a\n  X-Custom: one\n  x-custom: two\n");
}

#[test]
fn test_every_csp_header_is_patched() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("index.html"), "<style>body{color:red}</style>").unwrap();

    let report = integration(json!({
        "headers": {
            "/*": {
                "Content-Security-Policy": "default-src 'self'",
                "content-security-policy": "style-src 'none'"
            }
        },
        "csp": { "autoHashes": true }
    }))
    .build_done(dir.path())
    .unwrap();

    let hash = "'sha256-FcQqt3aNlV7AZnGV4zkQRVeCeJOxbMPnQSx258L803E='";
    assert_eq!(report.patch.unwrap().updated_header_count, 1);
    assert_eq!(
        read_headers(&dir),
        format!(
            "/*\n  Content-Security-Policy: default-src 'self'; style-src 'self' {hash};\n  content-security-policy: style-src {hash};\n"
        )
    );
}

#[test]
fn test_setup_resolves_routes_and_options() {
    let hooks = integration(json!({
        "headers": { "*": { "X-Test": "value" }, "/about/": { "X-Other": "1" } },
        "workers": true,
        "csp": { "mode": "route", "maxHeaderLineLength": 0.5 }
    }));

    let routes: Vec<_> = hooks.routes().iter().map(|e| e.route.as_str()).collect();
    assert_eq!(routes, vec!["/*", "/about/"]);
    assert_eq!(hooks.csp_options().mode, CspMode::Route);
    assert_eq!(hooks.csp_options().max_header_line_length, 1);
    assert!(!hooks.csp_options().auto_hashes);
}

#[test]
fn test_workers_normalization() {
    let dir = TempDir::new().unwrap();
    integration(json!({
        "headers": { "*": { "X-Test": "value" } },
        "workers": true
    }))
    .build_done(dir.path())
    .unwrap();

    assert_eq!(read_headers(&dir), "/*\n  X-Test: value\n");
}

#[test]
fn test_empty_config_skips_generation() {
    let dir = TempDir::new().unwrap();
    let report = integration(json!({ "headers": {} }))
        .build_done(dir.path())
        .unwrap();

    assert!(!report.written);
    assert_eq!(report.warnings.len(), 1);
    assert!(!dir.path().join("_headers").exists());
}

#[test]
fn test_overflow_error_aborts_before_write() {
    let dir = TempDir::new().unwrap();
    let result = integration(json!({
        "headers": { "X-Test": "value".repeat(100) },
        "csp": { "maxHeaderLineLength": 40, "overflow": "error" }
    }))
    .build_done(dir.path());

    assert!(matches!(result, Err(Error::HeaderOverflow(_))));
    assert!(!dir.path().join("_headers").exists());
}

#[test]
fn test_overflow_warn_still_writes() {
    let dir = TempDir::new().unwrap();
    let report = integration(json!({
        "headers": { "X-Test": "value".repeat(100) },
        "csp": { "maxHeaderLineLength": 40, "overflow": "warn" }
    }))
    .build_done(dir.path())
    .unwrap();

    assert!(report.written);
    assert!(report
        .warnings
        .iter()
        .any(|w| w.contains("Header line length overflow")));
    assert_eq!(
        read_headers(&dir),
        format!("/*\n  X-Test: {}\n", "value".repeat(100))
    );
}

#[test]
fn test_global_auto_hashes() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("index.html"),
        "<html><head><style>body{color:red}</style></head></html>",
    )
    .unwrap();

    let report = integration(json!({
        "headers": {
            "/*": { "Content-Security-Policy": "default-src 'self'; style-src 'self' 'unsafe-inline'" }
        },
        "csp": { "autoHashes": true }
    }))
    .build_done(dir.path())
    .unwrap();

    let patch = report.patch.unwrap();
    assert_eq!(patch.counts.style_elements, 1);
    assert_eq!(patch.updated_header_count, 1);
    assert_eq!(
        read_headers(&dir),
        "/*\n  Content-Security-Policy: default-src 'self'; style-src 'self' 'sha256-FcQqt3aNlV7AZnGV4zkQRVeCeJOxbMPnQSx258L803E=';\n"
    );
}

#[test]
fn test_auto_hashes_off_leaves_csp() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("index.html"), "<style>a{}</style>").unwrap();

    let report = integration(json!({
        "headers": { "Content-Security-Policy": "style-src 'self'" }
    }))
    .build_done(dir.path())
    .unwrap();

    assert!(report.patch.is_none());
    assert_eq!(
        read_headers(&dir),
        "/*\n  Content-Security-Policy: style-src 'self'\n"
    );
}

#[test]
fn test_hashing_failure_is_not_fatal() {
    let dir = TempDir::new().unwrap();
    let build_dir = dir.path().join("dist");
    fs::create_dir(&build_dir).unwrap();
    // Invalid UTF-8 cannot be read as page text.
    fs::write(build_dir.join("index.html"), [0xff, 0xfe, 0x00]).unwrap();

    let report = integration(json!({
        "headers": { "Content-Security-Policy": "style-src 'self'" },
        "csp": { "autoHashes": true }
    }))
    .build_done(&build_dir)
    .unwrap();

    assert!(report.written);
    assert!(report.patch.is_none());
    assert_eq!(report.errors.len(), 1);
    assert_eq!(
        fs::read_to_string(build_dir.join("_headers")).unwrap(),
        "/*\n  Content-Security-Policy: style-src 'self'\n"
    );
}

#[test]
fn test_write_failure_is_not_fatal() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("not-built");

    let report = integration(json!({ "headers": { "X-Test": "value" } }))
        .build_done(&missing)
        .unwrap();

    assert!(!report.written);
    assert_eq!(report.errors.len(), 1);
}

#[test]
fn test_second_build_is_stable() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("index.html"),
        r#"<p style="color:red">x</p><script>boot()</script>"#,
    )
    .unwrap();

    let hooks = integration(json!({
        "headers": { "Content-Security-Policy": "default-src 'self'" },
        "csp": { "autoHashes": true, "hashInlineScripts": true }
    }));
    hooks.build_done(dir.path()).unwrap();
    let first = read_headers(&dir);
    hooks.build_done(dir.path()).unwrap();
    let second = read_headers(&dir);

    assert_eq!(first, second);
    assert!(first.contains(&format!(
        "style-src-attr 'unsafe-hashes' '{}'",
        content_hash("color:red")
    )));
    assert!(first.contains(&format!("script-src 'self' '{}'", content_hash("boot()"))));
}
