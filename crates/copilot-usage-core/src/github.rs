//! GitHub REST implementation of the metrics source.

use crate::source::{FetchError, MetricsSource, RawTeam, TeamsPage};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";

/// Fixed page size for the teams listing.
pub const TEAMS_PAGE_SIZE: u32 = 100;

pub struct GithubSource {
    client: reqwest::Client,
    base_url: String,
    org: String,
    token: String,
}

impl GithubSource {
    pub fn new(org: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_base_url(org, token, DEFAULT_API_URL)
    }

    pub fn with_base_url(
        org: impl Into<String>,
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            org: org.into(),
            token: token.into(),
        }
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header(
                reqwest::header::USER_AGENT,
                concat!("copilot-usage/", env!("CARGO_PKG_VERSION")),
            )
    }

    async fn get_records(
        &self,
        url: String,
        query: &[(&str, &str)],
    ) -> Result<Vec<Value>, FetchError> {
        let response = self.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        match response.json::<Value>().await? {
            Value::Array(records) => Ok(records),
            other => Err(FetchError::Shape(format!(
                "expected a JSON array of records, got {}",
                json_kind(&other)
            ))),
        }
    }
}

impl MetricsSource for GithubSource {
    async fn org_metrics(&self) -> Result<Vec<Value>, FetchError> {
        let url = format!("{}/orgs/{}/copilot/metrics", self.base_url, self.org);
        self.get_records(url, &[]).await
    }

    async fn teams_page(&self, page: u32) -> Result<TeamsPage, FetchError> {
        let url = format!("{}/orgs/{}/teams", self.base_url, self.org);
        let per_page = TEAMS_PAGE_SIZE.to_string();
        let page_param = page.to_string();

        let response = self
            .get(&url)
            .query(&[
                ("per_page", per_page.as_str()),
                ("page", page_param.as_str()),
            ])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let last_page = response
            .headers()
            .get(reqwest::header::LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(last_page_from_link);
        let teams = response.json::<Vec<RawTeam>>().await?;

        Ok(TeamsPage { teams, last_page })
    }

    async fn team_metrics(
        &self,
        team: &str,
        since: Option<&str>,
    ) -> Result<Vec<Value>, FetchError> {
        let url = format!(
            "{}/orgs/{}/team/{}/copilot/metrics",
            self.base_url, self.org, team
        );
        match since {
            Some(since) => self.get_records(url, &[("since", since)]).await,
            None => self.get_records(url, &[]).await,
        }
    }
}

/// Extract the `rel="last"` page number from an RFC 8288 `Link` header.
fn last_page_from_link(header: &str) -> Option<u32> {
    for part in header.split(',') {
        let mut sections = part.split(';');
        let url = sections
            .next()
            .map(|raw| raw.trim().trim_start_matches('<').trim_end_matches('>'))?;
        if !sections.any(|param| param.trim() == r#"rel="last""#) {
            continue;
        }

        let query = url.split_once('?')?.1;
        return query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "page")
            .and_then(|(_, page)| page.parse().ok());
    }

    None
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
