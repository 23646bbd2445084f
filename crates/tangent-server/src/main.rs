use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tangent_server::config::Config;
use tangent_server::server::start_server;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[clap(name = "tangent", version, about = "Personal knowledge-base content server")]
struct Opts {
    /// Path to a TOML configuration file.
    #[clap(long, env = "TANGENT_CONFIG")]
    config: Option<PathBuf>,

    /// Directory containing markdown content (overrides the config file).
    #[clap(long, env = "TANGENT_CONTENT_DIR")]
    content_dir: Option<PathBuf>,

    /// Listen host (overrides the config file).
    #[clap(long, env = "TANGENT_HOST")]
    host: Option<String>,

    /// Listen port (overrides the config file).
    #[clap(long, env = "TANGENT_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let opts = Opts::parse();

    let mut config = match &opts.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(dir) = opts.content_dir {
        config.content.dir = dir;
    }
    if let Some(host) = opts.host {
        config.server.host = host;
    }
    if let Some(port) = opts.port {
        config.server.port = port;
    }

    // The API key never lives in the config file.
    config.chat.api_key = std::env::var("ANTHROPIC_API_KEY")
        .ok()
        .filter(|key| !key.is_empty());

    start_server(config).await
}
