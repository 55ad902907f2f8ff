use crate::config::{CspOptions, OverflowPolicy};
use crate::error::{Error, Result};
use crate::render::header_line;
use crate::routes::RouteHeaderMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineViolation {
    pub route: String,
    pub header: String,
    pub length: usize,
}

/// Every rendered header line longer than `limit`.
pub fn find_violations(routes: &RouteHeaderMap, limit: usize) -> Vec<LineViolation> {
    let mut violations = Vec::new();
    for entry in routes.iter() {
        for (name, value) in entry.headers.iter() {
            let length = header_line(name, value).chars().count();
            if length > limit {
                violations.push(LineViolation {
                    route: entry.route.clone(),
                    header: name.to_string(),
                    length,
                });
            }
        }
    }
    violations
}

/// Applies the overflow policy to the final routes.
///
/// Returns the warning message under `warn`, or a build-fatal
/// [`Error::HeaderOverflow`] under `error`.
pub fn enforce_line_length(routes: &RouteHeaderMap, options: &CspOptions) -> Result<Option<String>> {
    let limit = options.max_header_line_length;
    let violations = find_violations(routes, limit);
    let Some(first) = violations.first() else {
        return Ok(None);
    };

    let message = format!(
        "Header line length overflow: route \"{}\" header \"{}\" is {} characters (limit {}); {} line(s) over the limit",
        first.route,
        first.header,
        first.length,
        limit,
        violations.len()
    );

    match options.overflow {
        OverflowPolicy::Warn => {
            tracing::warn!("{}", message);
            Ok(Some(message))
        }
        OverflowPolicy::Error => {
            tracing::error!("{}", message);
            Err(Error::HeaderOverflow(message))
        }
    }
}
