//! Incremental reconciliation of per-team usage history.

use crate::source::MetricsSource;
use crate::{TeamDescriptor, TeamHistoryEntry};
use chrono::NaiveDate;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{error, info, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// How to interpret the source's `since` filter relative to the watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SinceBoundary {
    /// Trust the source to return strictly newer records than `since`.
    #[default]
    Exclusive,
    /// Assume the source may re-return the watermark day; drop fetched
    /// records dated at or before it.
    Inclusive,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    pub since_boundary: SinceBoundary,
}

/// The most recent date present in a team's stored history, used to request
/// only newer data on the next fetch.
pub fn watermark(data: &[Value]) -> Option<String> {
    latest_date(data).map(|date| date.format(DATE_FORMAT).to_string())
}

fn latest_date(data: &[Value]) -> Option<NaiveDate> {
    data.iter().filter_map(record_date).max()
}

fn record_date(record: &Value) -> Option<NaiveDate> {
    record
        .get("date")
        .and_then(Value::as_str)
        .and_then(|raw| NaiveDate::parse_from_str(raw, DATE_FORMAT).ok())
}

/// Extend each discovered team's stored history with records fetched since
/// its watermark.
///
/// Known teams are extended in place, unknown teams are inserted, and teams
/// present in `existing_history` but absent from `teams` are carried through
/// untouched. One team's fetch failure is logged and treated as "nothing
/// new" for that team only. Duplicate names in `existing_history` collapse
/// to the last entry.
pub async fn reconcile(
    teams: &[TeamDescriptor],
    existing_history: Vec<TeamHistoryEntry>,
    source: &impl MetricsSource,
    options: ReconcileOptions,
) -> Vec<TeamHistoryEntry> {
    let mut entries: Vec<TeamHistoryEntry> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for entry in existing_history {
        match index.get(&entry.team.name) {
            Some(&slot) => entries[slot] = entry,
            None => {
                index.insert(entry.team.name.clone(), entries.len());
                entries.push(entry);
            }
        }
    }

    for team in teams {
        if team.name.is_empty() {
            warn!("skipping team with no name");
            continue;
        }

        let last_known = index
            .get(&team.name)
            .and_then(|&slot| latest_date(&entries[slot].data));
        let since = last_known.map(|date| date.format(DATE_FORMAT).to_string());

        let fetched = match source.team_metrics(&team.name, since.as_deref()).await {
            Ok(records) => records,
            Err(err) => {
                error!(team = %team.name, error = %err, "failed to fetch team history");
                continue;
            }
        };

        let fresh: Vec<Value> = match (last_known, options.since_boundary) {
            (Some(mark), SinceBoundary::Inclusive) => fetched
                .into_iter()
                .filter(|record| record_date(record).is_none_or(|date| date > mark))
                .collect(),
            _ => fetched,
        };

        if fresh.is_empty() {
            info!(team = %team.name, "no new history found for team");
            continue;
        }

        match index.get(&team.name) {
            Some(&slot) => entries[slot].data.extend(fresh),
            None => {
                index.insert(team.name.clone(), entries.len());
                entries.push(TeamHistoryEntry {
                    team: team.clone(),
                    data: fresh,
                });
            }
        }
    }

    entries
}
