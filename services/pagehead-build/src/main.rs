use anyhow::Context;
use pagehead_core::{HeadersIntegration, IntegrationConfig};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pagehead_core=info,pagehead_build=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let build_dir = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PAGEHEAD_BUILD_DIR").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("dist"));
    let config_path = std::env::args()
        .nth(2)
        .or_else(|| std::env::var("PAGEHEAD_CONFIG").ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("headers.json"));

    info!("🚀 pagehead-build starting (config {})", config_path.display());

    let config = IntegrationConfig::from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let integration = HeadersIntegration::setup(config)?;

    let report = match integration.build_done(&build_dir) {
        Ok(report) => report,
        Err(e) => {
            error!("❌ Build failed: {}", e);
            std::process::exit(1);
        }
    };

    if std::env::var("PAGEHEAD_REPORT").is_ok_and(|v| v == "json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
