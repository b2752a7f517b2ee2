//! Scripted metrics source for unit tests.

use crate::source::{FetchError, MetricsSource, RawTeam, TeamsPage};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    OrgMetrics,
    TeamsPage(u32),
    TeamMetrics {
        team: String,
        since: Option<String>,
    },
}

/// A `MetricsSource` that replays scripted responses and records every call.
pub(crate) struct ScriptedSource {
    org: Option<Vec<Value>>,
    pages: Vec<Option<TeamsPage>>,
    team_data: HashMap<String, Vec<Value>>,
    failing_teams: HashSet<String>,
    pub(crate) calls: RefCell<Vec<Call>>,
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self {
            org: Some(Vec::new()),
            pages: Vec::new(),
            team_data: HashMap::new(),
            failing_teams: HashSet::new(),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl ScriptedSource {
    pub(crate) fn with_org_metrics(mut self, records: Vec<Value>) -> Self {
        self.org = Some(records);
        self
    }

    pub(crate) fn with_failing_org_metrics(mut self) -> Self {
        self.org = None;
        self
    }

    pub(crate) fn with_page(mut self, teams: Vec<RawTeam>, last_page: Option<u32>) -> Self {
        self.pages.push(Some(TeamsPage { teams, last_page }));
        self
    }

    pub(crate) fn with_failing_page(mut self) -> Self {
        self.pages.push(None);
        self
    }

    pub(crate) fn with_team_data(mut self, team: &str, records: Vec<Value>) -> Self {
        self.team_data.insert(team.to_string(), records);
        self
    }

    pub(crate) fn failing_team(mut self, team: &str) -> Self {
        self.failing_teams.insert(team.to_string());
        self
    }

    pub(crate) fn team_metrics_calls(&self) -> Vec<(String, Option<String>)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::TeamMetrics { team, since } => Some((team.clone(), since.clone())),
                _ => None,
            })
            .collect()
    }
}

impl MetricsSource for ScriptedSource {
    async fn org_metrics(&self) -> Result<Vec<Value>, FetchError> {
        self.calls.borrow_mut().push(Call::OrgMetrics);
        match &self.org {
            Some(records) => Ok(records.clone()),
            None => Err(FetchError::Shape("scripted org metrics failure".into())),
        }
    }

    async fn teams_page(&self, page: u32) -> Result<TeamsPage, FetchError> {
        self.calls.borrow_mut().push(Call::TeamsPage(page));
        match self.pages.get(page as usize - 1) {
            Some(Some(listing)) => Ok(listing.clone()),
            Some(None) => Err(FetchError::Status {
                status: 502,
                url: format!("scripted://teams?page={page}"),
            }),
            None => Ok(TeamsPage::default()),
        }
    }

    async fn team_metrics(
        &self,
        team: &str,
        since: Option<&str>,
    ) -> Result<Vec<Value>, FetchError> {
        self.calls.borrow_mut().push(Call::TeamMetrics {
            team: team.to_string(),
            since: since.map(str::to_owned),
        });
        if self.failing_teams.contains(team) {
            return Err(FetchError::Shape(format!(
                "scripted failure for team {team}"
            )));
        }
        Ok(self.team_data.get(team).cloned().unwrap_or_default())
    }
}
