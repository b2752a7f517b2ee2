//! Access token resolution for the aggregation job.
//!
//! Installation-token minting lives with the deployment platform; the job
//! only needs a ready bearer credential, read from a mounted token file or
//! the environment.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Resolve the bearer token: an explicit file, then `GITHUB_TOKEN_FILE`,
/// then the `GITHUB_TOKEN` variable.
pub fn access_token(token_file: Option<&Path>) -> Result<String> {
    let file = token_file
        .map(Path::to_path_buf)
        .or_else(|| std::env::var("GITHUB_TOKEN_FILE").ok().map(PathBuf::from));

    if let Some(path) = file {
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read token file {}", path.display()))?;
        let token = raw.trim();
        if token.is_empty() {
            bail!("token file {} is empty", path.display());
        }
        return Ok(token.to_string());
    }

    match std::env::var("GITHUB_TOKEN") {
        Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => bail!("no credential configured, set GITHUB_TOKEN or pass --token-file"),
    }
}
