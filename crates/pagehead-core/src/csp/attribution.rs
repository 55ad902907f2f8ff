use std::path::Path;

/// Maps a built HTML file to the route it is served from.
///
/// `index.html` → `/`, `blog/index.html` → `/blog/`, `about.html` → `/about`.
pub fn route_for_file(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    let relative = relative
        .to_string_lossy()
        .replace('\\', "/")
        .trim_start_matches('/')
        .to_string();

    if relative == "index.html" {
        return "/".to_string();
    }
    if let Some(dir) = relative.strip_suffix("/index.html") {
        return format!("/{}/", dir);
    }
    if let Some(page) = relative.strip_suffix(".html") {
        return format!("/{}", page);
    }
    format!("/{}", relative)
}
