mod auth;

use anyhow::{anyhow, Result};
use clap::Parser;
use copilot_usage_core::{
    FsStore, GithubSource, ReconcileOptions, RunOptions, SinceBoundary,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "copilot-usage")]
#[command(author, version, about = "GitHub Copilot usage aggregation job")]
struct Cli {
    /// GitHub organization to aggregate (env: GITHUB_ORG)
    #[arg(long)]
    org: Option<String>,

    /// File containing the GitHub access token (env: GITHUB_TOKEN_FILE, else GITHUB_TOKEN)
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// Directory acting as the artifact bucket (env: COPILOT_USAGE_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// GitHub API base URL
    #[arg(long, default_value = "https://api.github.com")]
    api_url: String,

    /// Treat the incremental `since` filter as inclusive and drop re-returned days
    #[arg(long)]
    since_inclusive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let org = cli
        .org
        .or_else(|| std::env::var("GITHUB_ORG").ok())
        .filter(|org| !org.is_empty())
        .ok_or_else(|| anyhow!("no organization configured, pass --org or set GITHUB_ORG"))?;

    let token = match auth::access_token(cli.token_file.as_deref()) {
        Ok(token) => token,
        Err(err) => {
            let message = format!("Error getting access token: {err}");
            tracing::error!("{message}");
            println!("{message}");
            std::process::exit(1);
        }
    };
    tracing::info!(org = %org, "access token resolved");

    let data_dir = resolve_data_dir(cli.data_dir)?;
    tracing::info!(data_dir = %data_dir.display(), "artifact store ready");

    let source = GithubSource::with_base_url(&org, &token, &cli.api_url);
    let store = FsStore::new(data_dir);

    let options = RunOptions {
        reconcile: ReconcileOptions {
            since_boundary: if cli.since_inclusive {
                SinceBoundary::Inclusive
            } else {
                SinceBoundary::Exclusive
            },
        },
    };

    let outcome = copilot_usage_core::run(&source, &store, options).await;
    println!("{outcome}");

    Ok(())
}

fn resolve_data_dir(flag: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir);
    }
    if let Ok(dir) = std::env::var("COPILOT_USAGE_DATA_DIR") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    dirs::data_dir()
        .map(|base| base.join("copilot-usage"))
        .ok_or_else(|| anyhow!("could not determine a data directory, pass --data-dir"))
}
