//! `_headers` generation for static builds, with CSP hashes for inline
//! styles and scripts.

pub mod config;
pub mod csp;
pub mod error;
pub mod integration;
pub mod limits;
pub mod render;
pub mod routes;

pub use config::{CspConfig, CspMode, CspOptions, IntegrationConfig, OverflowPolicy};
pub use error::{Error, Result};
pub use integration::{BuildReport, HeadersIntegration};
pub use routes::{HeaderList, RouteHeaderMap};
