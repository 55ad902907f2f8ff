use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::routes::RouteHeaderMap;

pub const HEADERS_FILE: &str = "_headers";

pub fn header_line(name: &str, value: &str) -> String {
    format!("  {}: {}", name, value)
}

/// Renders routes in the `_headers` format: the route on its own line,
/// indented `Name: value` lines, and a blank line between routes.
pub fn render_headers(routes: &RouteHeaderMap) -> String {
    routes
        .iter()
        .map(|entry| {
            let mut block = format!("{}\n", entry.route);
            for (name, value) in entry.headers.iter() {
                block.push_str(&header_line(name, value));
                block.push('\n');
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Writes `_headers` into `dir` and returns its path.
pub fn write_headers_file(dir: &Path, routes: &RouteHeaderMap) -> Result<PathBuf> {
    let path = dir.join(HEADERS_FILE);
    std::fs::write(&path, render_headers(routes)).map_err(|e| Error::io(&path, e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_render() {
        let routes = RouteHeaderMap::from_config(&json!({ "X-Test": "value" })).unwrap();
        assert_eq!(render_headers(&routes), "/*\n  X-Test: value\n");
    }

    #[test]
    fn test_nested_render() {
        let routes =
            RouteHeaderMap::from_config(&json!({ "/test": { "X-Test": "value" } })).unwrap();
        assert_eq!(render_headers(&routes), "/test\n  X-Test: value\n");
    }

    #[test]
    fn test_blank_line_between_routes() {
        let routes = RouteHeaderMap::from_config(&json!({
            "/a": { "X-A": "1", "X-B": "2" },
            "/b": { "X-C": "3" },
        }))
        .unwrap();
        assert_eq!(
            render_headers(&routes),
            "/a\n  X-A: 1\n  X-B: 2\n\n/b\n  X-C: 3\n"
        );
    }

    #[test]
    fn test_empty_render() {
        assert_eq!(render_headers(&RouteHeaderMap::new()), "");
    }
}
