//! Linear issue tracker adapter.
//!
//! Speaks the Linear GraphQL API: team lookup by key, label
//! resolve-or-create, and issue creation. All failures surface as
//! [`HealError::Tracker`] so the learnings flow can report and continue.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{header, Client as ReqwestClient};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::domain::errors::{HealError, HealResult};
use crate::domain::models::config::TrackerConfig;
use crate::domain::ports::{CreatedIssue, IssueTracker, NewIssue};

/// Default API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.linear.app";

const REQUEST_TIMEOUT_SECS: u64 = 30;

const TEAM_QUERY: &str =
    "query Team($key: String!) { teams(filter: { key: { eq: $key } }) { nodes { id } } }";

const TEAM_LABELS_QUERY: &str =
    "query Labels($teamId: String!) { team(id: $teamId) { labels { nodes { id name } } } }";

const LABEL_CREATE_MUTATION: &str = "mutation LabelCreate($input: IssueLabelCreateInput!) { issueLabelCreate(input: $input) { issueLabel { id } } }";

const ISSUE_CREATE_MUTATION: &str = "mutation IssueCreate($input: IssueCreateInput!) { issueCreate(input: $input) { issue { id identifier url } } }";

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    data: Option<Value>,
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

/// GraphQL client for Linear
pub struct LinearTracker {
    http_client: ReqwestClient,
    base_url: String,
}

impl LinearTracker {
    /// Create a tracker client
    ///
    /// # Errors
    /// Returns [`HealError::Tracker`] if the API key is not a valid header
    /// value or the HTTP client cannot be built.
    pub fn new(api_key: &str, base_url: impl Into<String>) -> HealResult<Self> {
        let mut key_value = header::HeaderValue::from_str(api_key)
            .map_err(|e| HealError::Tracker(format!("invalid API key: {e}")))?;
        key_value.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, key_value);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let http_client = ReqwestClient::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(headers)
            .build()
            .map_err(|e| HealError::Tracker(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
        })
    }

    /// Build a tracker from configuration
    ///
    /// Returns `Ok(None)` when the tracker is disabled. An enabled tracker
    /// requires an API key, either in the config file or via
    /// `LINEAR_API_KEY`.
    pub fn from_config(config: &TrackerConfig) -> HealResult<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }

        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("LINEAR_API_KEY").ok())
            .ok_or_else(|| {
                HealError::Tracker("tracker is enabled but no API key is configured".to_string())
            })?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self::new(&api_key, base_url).map(Some)
    }

    async fn execute(&self, query: &str, variables: Value) -> HealResult<Value> {
        let url = format!("{}/graphql", self.base_url);
        debug!(%url, "tracker request");

        let response = self
            .http_client
            .post(&url)
            .json(&GraphqlRequest { query, variables })
            .send()
            .await
            .map_err(|e| HealError::Tracker(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HealError::Tracker(format!("HTTP {status}: {body}")));
        }

        let body: GraphqlResponse = response
            .json()
            .await
            .map_err(|e| HealError::Tracker(format!("invalid response: {e}")))?;

        if let Some(errors) = body.errors {
            let joined = errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(HealError::Tracker(joined));
        }

        body.data
            .ok_or_else(|| HealError::Tracker("response carried no data".to_string()))
    }

    async fn team_id(&self, key: &str) -> HealResult<String> {
        let data = self
            .execute(TEAM_QUERY, json!({ "key": key }))
            .await?;

        data.pointer("/teams/nodes/0/id")
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| HealError::Tracker(format!("team '{key}' not found")))
    }

    /// Existing labels for a team, name to id
    async fn existing_labels(&self, team_id: &str) -> HealResult<HashMap<String, String>> {
        let data = self
            .execute(TEAM_LABELS_QUERY, json!({ "teamId": team_id }))
            .await?;

        let nodes = data
            .pointer("/team/labels/nodes")
            .and_then(Value::as_array)
            .ok_or_else(|| HealError::Tracker("malformed label listing".to_string()))?;

        let mut labels = HashMap::new();
        for node in nodes {
            if let (Some(id), Some(name)) = (
                node.get("id").and_then(Value::as_str),
                node.get("name").and_then(Value::as_str),
            ) {
                labels.insert(name.to_string(), id.to_string());
            }
        }
        Ok(labels)
    }

    async fn create_label(&self, team_id: &str, name: &str) -> HealResult<String> {
        let data = self
            .execute(
                LABEL_CREATE_MUTATION,
                json!({ "input": { "teamId": team_id, "name": name } }),
            )
            .await?;

        data.pointer("/issueLabelCreate/issueLabel/id")
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| HealError::Tracker(format!("label '{name}' was not created")))
    }
}

#[async_trait]
impl IssueTracker for LinearTracker {
    async fn ensure_labels(&self, team: &str, names: &[String]) -> HealResult<Vec<String>> {
        let team_id = self.team_id(team).await?;
        let mut existing = self.existing_labels(&team_id).await?;

        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            let id = if let Some(id) = existing.get(name) {
                id.clone()
            } else {
                let id = self.create_label(&team_id, name).await?;
                info!(label = %name, "created tracker label");
                existing.insert(name.clone(), id.clone());
                id
            };
            ids.push(id);
        }
        Ok(ids)
    }

    async fn create_issue(&self, issue: &NewIssue) -> HealResult<CreatedIssue> {
        let team_id = self.team_id(&issue.team).await?;

        let data = self
            .execute(
                ISSUE_CREATE_MUTATION,
                json!({
                    "input": {
                        "teamId": team_id,
                        "title": issue.title,
                        "description": issue.description,
                        "priority": issue.priority,
                        "labelIds": issue.label_ids,
                    }
                }),
            )
            .await?;

        let created = data
            .pointer("/issueCreate/issue")
            .ok_or_else(|| HealError::Tracker("issue was not created".to_string()))?;

        let id = created
            .get("identifier")
            .or_else(|| created.get("id"))
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| HealError::Tracker("created issue carried no identifier".to_string()))?;
        let url = created
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        info!(issue = %id, "created tracker issue");
        Ok(CreatedIssue { id, url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    async fn graphql_mock(
        server: &mut mockito::Server,
        query_marker: &str,
        body: &str,
    ) -> mockito::Mock {
        server
            .mock("POST", "/graphql")
            .match_body(Matcher::Regex(query_marker.to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn test_ensure_labels_reuses_and_creates() {
        let mut server = mockito::Server::new_async().await;

        let team = graphql_mock(
            &mut server,
            r"teams\(filter",
            r#"{"data":{"teams":{"nodes":[{"id":"team-1"}]}}}"#,
        )
        .await;
        let labels = graphql_mock(
            &mut server,
            r"query Labels",
            r#"{"data":{"team":{"labels":{"nodes":[{"id":"lbl-1","name":"test-healing"}]}}}}"#,
        )
        .await;
        let create = graphql_mock(
            &mut server,
            r"issueLabelCreate",
            r#"{"data":{"issueLabelCreate":{"issueLabel":{"id":"lbl-2"}}}}"#,
        )
        .await;

        let tracker = LinearTracker::new("lin_api_test", server.url()).unwrap();
        let ids = tracker
            .ensure_labels(
                "ENG",
                &["test-healing".to_string(), "tech-debt".to_string()],
            )
            .await
            .unwrap();

        assert_eq!(ids, vec!["lbl-1", "lbl-2"]);
        team.assert_async().await;
        labels.assert_async().await;
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_issue_returns_identifier_and_url() {
        let mut server = mockito::Server::new_async().await;

        let _team = graphql_mock(
            &mut server,
            r"teams\(filter",
            r#"{"data":{"teams":{"nodes":[{"id":"team-1"}]}}}"#,
        )
        .await;
        let create = graphql_mock(
            &mut server,
            r"mutation IssueCreate",
            r#"{"data":{"issueCreate":{"issue":{"id":"uuid-1","identifier":"ENG-42","url":"https://linear.app/acme/issue/ENG-42"}}}}"#,
        )
        .await;

        let tracker = LinearTracker::new("lin_api_test", server.url()).unwrap();
        let issue = tracker
            .create_issue(&NewIssue {
                title: "Fix recurring auth failures".to_string(),
                description: "Seen across 3 sessions".to_string(),
                team: "ENG".to_string(),
                priority: 2,
                label_ids: vec!["lbl-1".to_string()],
            })
            .await
            .unwrap();

        assert_eq!(issue.id, "ENG-42");
        assert_eq!(issue.url, "https://linear.app/acme/issue/ENG-42");
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_graphql_errors_surface_as_tracker_error() {
        let mut server = mockito::Server::new_async().await;

        let _mock = graphql_mock(
            &mut server,
            r"teams\(filter",
            r#"{"errors":[{"message":"authentication required"}]}"#,
        )
        .await;

        let tracker = LinearTracker::new("bad-key", server.url()).unwrap();
        let err = tracker.team_id("ENG").await.unwrap_err();

        match err {
            HealError::Tracker(message) => assert!(message.contains("authentication required")),
            other => panic!("Expected Tracker error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_team_is_reported() {
        let mut server = mockito::Server::new_async().await;

        let _mock = graphql_mock(
            &mut server,
            r"teams\(filter",
            r#"{"data":{"teams":{"nodes":[]}}}"#,
        )
        .await;

        let tracker = LinearTracker::new("lin_api_test", server.url()).unwrap();
        let err = tracker.team_id("NOPE").await.unwrap_err();
        assert!(err.to_string().contains("NOPE"));
    }

    #[test]
    fn test_from_config_disabled_is_none() {
        let config = TrackerConfig::default();
        assert!(LinearTracker::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_from_config_enabled_requires_key() {
        temp_env::with_var("LINEAR_API_KEY", None::<&str>, || {
            let config = TrackerConfig {
                enabled: true,
                team: Some("ENG".to_string()),
                api_key: None,
                base_url: None,
            };
            assert!(LinearTracker::from_config(&config).is_err());
        });
    }
}
