//! Team discovery across the paginated teams listing.

use crate::source::{MetricsSource, RawTeam};
use crate::TeamDescriptor;
use tracing::{error, info, warn};

/// Enumerate every organization team and keep those with Copilot metrics.
///
/// The last page is taken from the pagination hint on the first page; with
/// no hint the listing is assumed to be a single page. Each listed team is
/// probed with a metrics request and kept only if the probe returns a
/// record array; a failed probe skips that team and enumeration continues.
/// Output order is page order, then within-page source order.
pub async fn discover_teams(source: &impl MetricsSource) -> Vec<TeamDescriptor> {
    let first = match source.teams_page(1).await {
        Ok(page) => page,
        Err(err) => {
            error!(error = %err, "failed to fetch the first teams page");
            return Vec::new();
        }
    };
    let last_page = first.last_page.unwrap_or(1);

    let mut teams = Vec::new();
    probe_page_teams(source, &first.teams, &mut teams).await;

    for page in 2..=last_page {
        match source.teams_page(page).await {
            Ok(listing) => probe_page_teams(source, &listing.teams, &mut teams).await,
            Err(err) => {
                error!(page, error = %err, "failed to fetch teams page");
            }
        }
    }

    info!(
        teams = teams.len(),
        pages = last_page,
        "fetched teams with Copilot metrics"
    );

    teams
}

async fn probe_page_teams(
    source: &impl MetricsSource,
    listed: &[RawTeam],
    teams: &mut Vec<TeamDescriptor>,
) {
    for team in listed {
        match source.team_metrics(&team.name, None).await {
            Ok(_) => teams.push(team.descriptor()),
            Err(err) => {
                warn!(team = %team.name, error = %err, "skipping team without Copilot metrics");
            }
        }
    }
}
