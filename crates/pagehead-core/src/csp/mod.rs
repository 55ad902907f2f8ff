pub mod attribution;
pub mod collect;
pub mod directives;
pub mod extract;
pub mod patch;
pub mod sources;
pub mod wildcard;

pub use directives::ParsedCsp;
pub use extract::{content_hash, extract_hashes, ExtractOptions, HashCounts, HashSources};
pub use patch::{patch_routes, patch_value, PatchSummary, CSP_HEADER};
pub use sources::merge_sources;
