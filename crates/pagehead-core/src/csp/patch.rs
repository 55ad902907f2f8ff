//! Rewrites configured CSP header values with discovered hash sources.

use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;

use super::collect::{collect_by_route, collect_global, RouteBuckets};
use super::directives::{ParsedCsp, SCRIPT_SRC, STYLE_SRC, STYLE_SRC_ATTR};
use super::extract::{ExtractOptions, HashCounts, HashSources};
use super::sources::{merge_sources, tokens, SELF, UNSAFE_HASHES};
use super::wildcard::{canonical_route, is_wildcard, WildcardSet};
use crate::config::{CspMode, CspOptions};
use crate::error::Result;
use crate::routes::RouteHeaderMap;

pub const CSP_HEADER: &str = "Content-Security-Policy";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchSummary {
    #[serde(flatten)]
    pub counts: HashCounts,
    pub updated_header_count: usize,
}

/// Adds hash sources for the built HTML to every configured CSP header.
///
/// Returns zero counts without touching the filesystem when no route
/// carries a CSP header.
pub fn patch_routes(
    routes: &mut RouteHeaderMap,
    build_dir: &Path,
    options: &CspOptions,
) -> Result<PatchSummary> {
    let csp_routes: Vec<String> = routes
        .iter()
        .filter(|entry| entry.headers.contains(CSP_HEADER))
        .map(|entry| entry.route.clone())
        .collect();
    if csp_routes.is_empty() {
        return Ok(PatchSummary::default());
    }

    let extract = ExtractOptions::from(options);
    let summary = match options.mode {
        CspMode::Global => {
            let sources = collect_global(build_dir, &extract)?;
            let mut updated = 0;
            for route in &csp_routes {
                if patch_route_header(routes, route, &sources, options) {
                    updated += 1;
                }
            }
            PatchSummary {
                counts: sources.counts(),
                updated_header_count: updated,
            }
        }
        CspMode::Route => {
            let buckets = collect_by_route(build_dir, &extract)?;
            let updated = patch_by_route(routes, &csp_routes, &buckets, options)?;
            PatchSummary {
                counts: buckets.totals.counts(),
                updated_header_count: updated,
            }
        }
    };

    tracing::info!(
        "CSP auto-hash: {} style element, {} style attribute, {} script hashes; {} header(s) updated",
        summary.counts.style_elements,
        summary.counts.style_attributes,
        summary.counts.scripts,
        summary.updated_header_count
    );

    Ok(summary)
}

fn patch_by_route(
    routes: &mut RouteHeaderMap,
    csp_routes: &[String],
    buckets: &RouteBuckets,
    options: &CspOptions,
) -> Result<usize> {
    let mut updated = 0;
    let mut claimed: BTreeSet<&str> = BTreeSet::new();

    for route in csp_routes.iter().filter(|r| !is_wildcard(r)) {
        let Some((built, sources)) = find_bucket(buckets, route) else {
            tracing::debug!("No built page for CSP route {}", route);
            continue;
        };
        claimed.insert(built);
        if sources.is_empty() {
            continue;
        }
        if patch_route_header(routes, route, sources, options) {
            updated += 1;
        }
    }

    let wildcards = WildcardSet::compile(
        csp_routes
            .iter()
            .filter(|r| is_wildcard(r))
            .map(|r| r.as_str())
            .enumerate(),
    )?;
    if wildcards.is_empty() {
        return Ok(updated);
    }

    for (built, sources) in &buckets.routes {
        if sources.is_empty() || claimed.contains(built.as_str()) {
            continue;
        }
        if routes
            .get(built)
            .is_some_and(|headers| headers.contains(CSP_HEADER))
        {
            continue;
        }
        let Some(template) = wildcards.find(built) else {
            continue;
        };
        let seeds: Vec<(String, String)> = routes
            .get(&template.route)
            .map(|headers| {
                headers
                    .matching(CSP_HEADER)
                    .map(|(n, v)| (n.to_string(), v.to_string()))
                    .collect()
            })
            .unwrap_or_default();
        if seeds.is_empty() {
            continue;
        }

        tracing::debug!("Synthesized CSP for {} from {}", built, template.route);
        let headers = routes.entry(built);
        for (name, seed) in seeds {
            headers.push(name, patch_value(&seed, sources, options));
        }
        updated += 1;
    }

    Ok(updated)
}

/// Exact bucket for `route`, else the first whose trailing-slash form matches.
fn find_bucket<'b>(buckets: &'b RouteBuckets, route: &str) -> Option<(&'b str, &'b HashSources)> {
    if let Some((built, sources)) = buckets.routes.get_key_value(route) {
        return Some((built.as_str(), sources));
    }
    let wanted = canonical_route(route);
    buckets
        .routes
        .iter()
        .find(|(built, _)| canonical_route(built) == wanted)
        .map(|(built, sources)| (built.as_str(), sources))
}

fn patch_route_header(
    routes: &mut RouteHeaderMap,
    route: &str,
    sources: &HashSources,
    options: &CspOptions,
) -> bool {
    let Some(headers) = routes.get_mut(route) else {
        return false;
    };

    let mut changed = false;
    for value in headers.values_mut(CSP_HEADER) {
        let patched = patch_value(value.as_str(), sources, options);
        if patched != *value {
            *value = patched;
            changed = true;
        }
    }
    changed
}

/// Merges `sources` into one CSP header value.
///
/// Returns `raw` untouched when no directive changes, so a second pass with
/// the same hashes is byte-for-byte stable.
pub fn patch_value(raw: &str, sources: &HashSources, options: &CspOptions) -> String {
    let trimmed = raw.trim().trim_end_matches(';');
    let mut csp = ParsedCsp::parse(trimmed);
    let mut changed = false;

    if options.hash_style_elements && !sources.style_elements.is_empty() {
        let additions: Vec<&str> = sources.style_elements.iter().map(String::as_str).collect();
        changed |= merge_directive(&mut csp, STYLE_SRC, SELF, &additions, options);
    }

    if options.hash_style_attributes && !sources.style_attributes.is_empty() {
        let additions: Vec<&str> = std::iter::once(UNSAFE_HASHES)
            .chain(sources.style_attributes.iter().map(String::as_str))
            .collect();
        changed |= merge_directive(&mut csp, STYLE_SRC_ATTR, "", &additions, options);
    }

    if options.hash_inline_scripts && !sources.scripts.is_empty() {
        let additions: Vec<&str> = sources.scripts.iter().map(String::as_str).collect();
        changed |= merge_directive(&mut csp, SCRIPT_SRC, SELF, &additions, options);
    }

    if !changed {
        return raw.to_string();
    }
    format!("{};", csp.serialize())
}

fn merge_directive(
    csp: &mut ParsedCsp,
    directive: &str,
    default: &str,
    additions: &[&str],
    options: &CspOptions,
) -> bool {
    let current = csp.get(directive).unwrap_or(default).to_string();
    let merged = merge_sources(&tokens(&current), additions, options.strip_unsafe_inline);
    if csp.get(directive) == Some(merged.as_str()) {
        return false;
    }
    csp.set(directive, merged);
    true
}
