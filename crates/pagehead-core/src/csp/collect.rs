//! Walks the build output and folds per-file hashes together.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::attribution::route_for_file;
use super::extract::{extract_hashes, ExtractOptions, HashSources};
use crate::error::{Error, Result};

/// Every `.html` file under `dir`, in a stable order.
pub fn list_html_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some("html")
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn read_html(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Hashes from every page, unioned.
pub fn collect_global(build_dir: &Path, options: &ExtractOptions) -> Result<HashSources> {
    let mut sources = HashSources::new();
    for file in list_html_files(build_dir)? {
        let html = read_html(&file)?;
        extract_hashes(&html, options, &mut sources);
        tracing::debug!("Scanned {} for inline hashes", file.display());
    }
    Ok(sources)
}

/// Hashes grouped by the route each file is served from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteBuckets {
    pub routes: BTreeMap<String, HashSources>,
    /// Union over all routes, for reporting.
    pub totals: HashSources,
}

impl RouteBuckets {
    pub fn get(&self, route: &str) -> Option<&HashSources> {
        self.routes.get(route)
    }
}

pub fn collect_by_route(build_dir: &Path, options: &ExtractOptions) -> Result<RouteBuckets> {
    let mut buckets = RouteBuckets::default();
    for file in list_html_files(build_dir)? {
        let html = read_html(&file)?;
        let mut page = HashSources::new();
        extract_hashes(&html, options, &mut page);

        let route = route_for_file(build_dir, &file);
        tracing::debug!(
            "Scanned {} as {} ({} style, {} attribute, {} script hashes)",
            file.display(),
            route,
            page.style_elements.len(),
            page.style_attributes.len(),
            page.scripts.len()
        );

        buckets.totals.absorb(&page);
        buckets.routes.entry(route).or_default().absorb(&page);
    }
    Ok(buckets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn styles_only() -> ExtractOptions {
        ExtractOptions {
            style_elements: true,
            style_attributes: false,
            inline_scripts: false,
        }
    }

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_list_only_html() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.html", "");
        write(dir.path(), "about/index.html", "");
        write(dir.path(), "assets/app.js", "");
        write(dir.path(), "notes.htm", "");

        let files = list_html_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| route_for_file(dir.path(), f))
            .collect();
        assert_eq!(names, vec!["/about/", "/"]);
    }

    #[test]
    fn test_global_union() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.html", "<style>a{}</style>");
        write(dir.path(), "about/index.html", "<style>a{}</style><style>b{}</style>");

        let sources = collect_global(dir.path(), &styles_only()).unwrap();
        assert_eq!(sources.counts().style_elements, 2);
    }

    #[test]
    fn test_by_route_keeps_pages_apart() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.html", "<style>home{}</style>");
        write(dir.path(), "about/index.html", "<style>about{}</style>");

        let buckets = collect_by_route(dir.path(), &styles_only()).unwrap();
        let home = buckets.get("/").unwrap();
        let about = buckets.get("/about/").unwrap();
        assert_eq!(home.style_elements.len(), 1);
        assert_eq!(about.style_elements.len(), 1);
        assert!(home.style_elements.is_disjoint(&about.style_elements));
        assert_eq!(buckets.totals.style_elements.len(), 2);
    }

    #[test]
    fn test_missing_directory_errors() {
        let dir = TempDir::new().unwrap();
        let result = collect_global(&dir.path().join("missing"), &styles_only());
        assert!(matches!(result, Err(Error::Walk(_))));
    }
}
