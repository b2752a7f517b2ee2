//! The remote metrics source seam.
//!
//! Everything downstream of the fetch layer branches on `FetchError`
//! variants instead of inspecting response shapes, and takes the source as
//! an explicit parameter rather than reaching for a shared client.

use crate::TeamDescriptor;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("unexpected response shape: {0}")]
    Shape(String),
}

/// One page of the organization's team listing.
#[derive(Debug, Clone, Default)]
pub struct TeamsPage {
    pub teams: Vec<RawTeam>,
    /// Last page number advertised by the source, if it advertised one.
    pub last_page: Option<u32>,
}

/// A team as returned by the listing endpoint, before the metrics probe.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTeam {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: String,
}

impl RawTeam {
    pub fn descriptor(&self) -> TeamDescriptor {
        TeamDescriptor {
            name: self.name.clone(),
            slug: self.slug.clone(),
            description: self.description.clone().unwrap_or_default(),
            url: self.html_url.clone(),
        }
    }
}

/// Paginated source of organization and per-team Copilot metrics.
#[allow(async_fn_in_trait)]
pub trait MetricsSource {
    /// Organization-wide per-day usage records.
    async fn org_metrics(&self) -> Result<Vec<Value>, FetchError>;

    /// One page of the organization's teams. Pages start at 1.
    async fn teams_page(&self, page: u32) -> Result<TeamsPage, FetchError>;

    /// A team's per-day metrics records, optionally only those after `since`.
    async fn team_metrics(&self, team: &str, since: Option<&str>)
        -> Result<Vec<Value>, FetchError>;
}
