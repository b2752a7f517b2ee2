#![deny(clippy::all)]

mod discovery;
mod github;
mod job;
mod merge;
mod reconcile;
mod source;
mod store;

#[cfg(test)]
pub(crate) mod testutil;

pub use discovery::*;
pub use github::*;
pub use job::*;
pub use merge::*;
pub use reconcile::*;
pub use source::*;
pub use store::*;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Identity and metadata for a team known to have Copilot metrics.
///
/// Rebuilt from the API on every run; never assumed to be a superset of the
/// previous snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamDescriptor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: String,
}

/// A team's accumulated usage history, keyed by `team.name`.
///
/// `data` holds per-day metrics records verbatim as returned by the API and
/// is only ever appended to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamHistoryEntry {
    pub team: TeamDescriptor,
    #[serde(default)]
    pub data: Vec<Value>,
}
