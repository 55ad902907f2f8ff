//! Source-list merging for CSP directives.

pub const NONE: &str = "'none'";
pub const SELF: &str = "'self'";
pub const UNSAFE_INLINE: &str = "'unsafe-inline'";
pub const UNSAFE_HASHES: &str = "'unsafe-hashes'";

/// Merges `additions` into an `existing` source list.
///
/// Order is first-seen across existing then additions, and duplicates
/// collapse, so merging the same additions again is a no-op. `'none'` is
/// dropped once any real source is added, and `'unsafe-inline'` is dropped
/// when `strip_unsafe_inline` is set.
pub fn merge_sources<E, A>(existing: &[E], additions: &[A], strip_unsafe_inline: bool) -> String
where
    E: AsRef<str>,
    A: AsRef<str>,
{
    let adds_real_source = additions.iter().any(|t| !t.as_ref().is_empty());
    let mut merged: Vec<&str> = Vec::with_capacity(existing.len() + additions.len());

    for token in existing.iter().map(AsRef::as_ref) {
        if token.is_empty() {
            continue;
        }
        if token == NONE && adds_real_source {
            continue;
        }
        if token == UNSAFE_INLINE && strip_unsafe_inline {
            continue;
        }
        if !merged.contains(&token) {
            merged.push(token);
        }
    }

    for token in additions.iter().map(AsRef::as_ref) {
        if !token.is_empty() && !merged.contains(&token) {
            merged.push(token);
        }
    }

    merged.join(" ").trim().to_string()
}

/// Splits a raw source-list value into tokens.
pub fn tokens(value: &str) -> Vec<&str> {
    value.split_whitespace().collect()
}
