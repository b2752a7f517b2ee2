//! One aggregation run: fetch, merge, and republish the usage artifacts.

use crate::discovery::discover_teams;
use crate::merge::merge;
use crate::reconcile::{reconcile, ReconcileOptions};
use crate::source::MetricsSource;
use crate::store::{read_series, write_series, ObjectStore};
use crate::TeamHistoryEntry;
use serde_json::Value;
use tracing::{error, info};

/// Organization-wide historic usage series.
pub const HISTORIC_USAGE_KEY: &str = "historic_usage_data.json";
/// Point-in-time snapshot of teams with Copilot metrics.
pub const COPILOT_TEAMS_KEY: &str = "copilot_teams.json";
/// Accumulated per-team history.
pub const TEAMS_HISTORY_KEY: &str = "teams_history.json";

pub const COMPLETION_MESSAGE: &str = "Github data logging is now complete.";

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub reconcile: ReconcileOptions,
}

/// Run the aggregation once against the given source and store.
///
/// A single linear pass: merge the organization series, snapshot the team
/// list, then reconcile per-team history. Every write failure is logged and
/// absorbed so unrelated artifacts still publish; the returned string is
/// the run's only output.
pub async fn run(
    source: &impl MetricsSource,
    store: &impl ObjectStore,
    options: RunOptions,
) -> String {
    // Organization-wide series.
    let incoming = match source.org_metrics().await {
        Ok(records) => records,
        Err(err) => {
            error!(error = %err, "failed to fetch organization metrics, nothing to merge");
            Vec::new()
        }
    };
    info!(records = incoming.len(), "organization usage data retrieved");

    let existing: Vec<Value> = read_series(store, HISTORIC_USAGE_KEY);
    let dates_before = existing.len();
    let outcome = merge(existing, incoming, "date");
    info!(
        no_days_added = outcome.added_keys.len(),
        dates_added = ?outcome.added_keys,
        "new usage data merged into the historic series"
    );
    write_series(store, HISTORIC_USAGE_KEY, &outcome.merged);

    // Teams snapshot: full replace, not a merge.
    let teams = discover_teams(source).await;
    write_series(store, COPILOT_TEAMS_KEY, &teams);

    // Per-team history.
    let existing_history: Vec<TeamHistoryEntry> = read_series(store, TEAMS_HISTORY_KEY);
    info!(
        entries = existing_history.len(),
        "existing team history loaded"
    );
    let updated_history = reconcile(&teams, existing_history, source, options.reconcile).await;
    write_series(store, TEAMS_HISTORY_KEY, &updated_history);

    info!(
        no_days_added = outcome.added_keys.len(),
        no_dates_before = dates_before,
        no_dates_after = outcome.merged.len(),
        no_copilot_teams = teams.len(),
        "process complete"
    );

    COMPLETION_MESSAGE.to_string()
}
