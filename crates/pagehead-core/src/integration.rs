//! Build-hook lifecycle: resolve configuration at setup, then patch,
//! validate and write `_headers` once the build output exists.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::{CspOptions, IntegrationConfig};
use crate::csp::patch::{patch_routes, PatchSummary};
use crate::error::Result;
use crate::limits::enforce_line_length;
use crate::render::write_headers_file;
use crate::routes::RouteHeaderMap;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub written: bool,
    pub path: Option<PathBuf>,
    pub routes: usize,
    pub patch: Option<PatchSummary>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct HeadersIntegration {
    routes: RouteHeaderMap,
    csp: CspOptions,
}

impl HeadersIntegration {
    pub fn setup(config: IntegrationConfig) -> Result<Self> {
        let mut routes = match &config.headers {
            Some(value) => RouteHeaderMap::from_config(value)?,
            None => RouteHeaderMap::new(),
        };
        if config.workers {
            routes.normalize_workers_wildcard();
        }
        let csp = config.csp.resolve();

        info!(
            "🔧 Headers setup: {} route(s), CSP auto-hash {} ({:?} mode)",
            routes.len(),
            if csp.auto_hashes { "on" } else { "off" },
            csp.mode
        );

        Ok(Self { routes, csp })
    }

    pub fn routes(&self) -> &RouteHeaderMap {
        &self.routes
    }

    pub fn csp_options(&self) -> &CspOptions {
        &self.csp
    }

    /// Runs after the build has written its output to `build_dir`.
    ///
    /// Only a header-line overflow under the `error` policy is returned as
    /// `Err`; hashing and write failures are logged and recorded.
    pub fn build_done(&self, build_dir: &Path) -> Result<BuildReport> {
        info!("📦 Generating _headers for {}", build_dir.display());
        let mut report = BuildReport::default();

        if self.routes.is_empty() {
            let message = "No headers configured; skipping _headers generation".to_string();
            warn!("{}", message);
            report.warnings.push(message);
            return Ok(report);
        }

        let mut routes = self.routes.clone();

        if self.csp.auto_hashes {
            match patch_routes(&mut routes, build_dir, &self.csp) {
                Ok(summary) => report.patch = Some(summary),
                Err(e) => {
                    let message = format!("CSP auto-hash failed, headers left unpatched: {}", e);
                    error!("{}", message);
                    report.errors.push(message);
                    routes = self.routes.clone();
                }
            }
        }

        if let Some(message) = enforce_line_length(&routes, &self.csp)? {
            report.warnings.push(message);
        }

        report.routes = routes.len();
        match write_headers_file(build_dir, &routes) {
            Ok(path) => {
                info!("✅ Wrote {} ({} route(s))", path.display(), routes.len());
                report.written = true;
                report.path = Some(path);
            }
            Err(e) => {
                let message = format!("Failed to write _headers: {}", e);
                error!("{}", message);
                report.errors.push(message);
            }
        }

        Ok(report)
    }
}
