//! Wildcard route templates (`/blog/*`) matched against concrete built routes.

use regex::Regex;

use crate::error::{Error, Result};

/// A configured route containing `*`.
#[derive(Debug, Clone)]
pub struct WildcardRoute {
    pub route: String,
    /// Length of the route with every `*` removed.
    pub specificity: usize,
    /// Position among the configured routes.
    pub order: usize,
    matcher: Regex,
}

impl WildcardRoute {
    pub fn compile(route: &str, order: usize) -> Result<Self> {
        let pattern = route
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let matcher = Regex::new(&format!("^{}$", pattern))
            .map_err(|e| Error::Config(format!("route \"{}\": {}", route, e)))?;

        Ok(Self {
            route: route.to_string(),
            specificity: route.chars().filter(|c| *c != '*').count(),
            order,
            matcher,
        })
    }

    pub fn matches(&self, route: &str) -> bool {
        self.matcher.is_match(route)
    }
}

pub fn is_wildcard(route: &str) -> bool {
    route.contains('*')
}

/// Wildcard templates, most specific first; ties keep declaration order.
#[derive(Debug, Clone, Default)]
pub struct WildcardSet {
    routes: Vec<WildcardRoute>,
}

impl WildcardSet {
    /// Compiles the wildcard routes among `(order, route)` pairs.
    pub fn compile<'a>(routes: impl IntoIterator<Item = (usize, &'a str)>) -> Result<Self> {
        let mut compiled = routes
            .into_iter()
            .filter(|(_, route)| is_wildcard(route))
            .map(|(order, route)| WildcardRoute::compile(route, order))
            .collect::<Result<Vec<_>>>()?;

        compiled.sort_by(|a, b| {
            b.specificity
                .cmp(&a.specificity)
                .then(a.order.cmp(&b.order))
        });

        Ok(Self { routes: compiled })
    }

    /// The most specific template matching `route`.
    pub fn find(&self, route: &str) -> Option<&WildcardRoute> {
        self.routes.iter().find(|w| w.matches(route))
    }

    pub fn iter(&self) -> impl Iterator<Item = &WildcardRoute> {
        self.routes.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// `/foo/` and `/foo` compare equal; `/` is left alone.
pub fn canonical_route(route: &str) -> &str {
    let trimmed = route.trim_end_matches('/');
    if trimmed.is_empty() {
        &route[..route.len().min(1)]
    } else {
        trimmed
    }
}
