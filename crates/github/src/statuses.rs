//! Commit status creation.

use async_trait::async_trait;
use domain::{Status, StatusCreationError, StatusesRepository};
use serde::Serialize;

use crate::client::{upstream_message, GitHubClient};

/// Body of `POST /repos/{owner}/{repo}/statuses/{sha}`.
#[derive(Debug, Serialize)]
struct CreateStatusRequest<'a> {
    state: &'a str,
    context: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

impl<'a> From<&'a Status> for CreateStatusRequest<'a> {
    fn from(status: &'a Status) -> Self {
        Self {
            state: status.state.as_str(),
            context: &status.context,
            target_url: status.target_url.as_deref(),
            description: status.description.as_deref(),
        }
    }
}

/// [`StatusesRepository`] that posts to the GitHub statuses endpoint.
///
/// Nothing is retained locally.
#[derive(Debug, Clone)]
pub struct GitHubStatusesRepository {
    client: GitHubClient,
}

impl GitHubStatusesRepository {
    /// Creates a repository sharing `client`.
    #[must_use]
    pub fn new(client: GitHubClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusesRepository for GitHubStatusesRepository {
    #[tracing::instrument(
        skip_all,
        fields(repository = %status.repository, sha = %status.sha, state = %status.state),
        err(Display)
    )]
    async fn create(&self, status: &Status) -> Result<(), StatusCreationError> {
        let url = self
            .client
            .endpoint(&[
                "repos",
                status.repository.owner(),
                status.repository.name(),
                "statuses",
                status.sha.as_str(),
            ])
            .map_err(|message| StatusCreationError::Transport { message })?;

        let response = self
            .client
            .post(url)
            .json(&CreateStatusRequest::from(status))
            .send()
            .await
            .map_err(|e| StatusCreationError::Transport {
                message: format!("request failed: {e}"),
            })?;

        let code = response.status();
        if code.is_success() {
            return Ok(());
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| StatusCreationError::Transport {
                message: format!("failed reading error body: {e}"),
            })?;
        Err(StatusCreationError::Rejected {
            status: code.as_u16(),
            message: upstream_message(&body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::upstream;
    use crate::GitHubConfig;
    use axum::http::{Method, StatusCode};
    use domain::{BuildState, CommitSha, RepositoryId, DEFAULT_CONTEXT};
    use reqwest::Url;

    const FULL: &str = "6607c19d3fd492ec53439f4104b39e4c62ece179";

    fn repository(base_url: &str) -> GitHubStatusesRepository {
        GitHubStatusesRepository::new(GitHubClient::new(GitHubConfig {
            api_url: Url::parse(base_url).expect("valid url"),
            token: "t0ken".to_string(),
            timeout: None,
        })
        .expect("client builds"))
    }

    fn status(target_url: Option<&str>) -> Status {
        Status::for_build(
            RepositoryId::parse("ejholmes/docker-statsd").expect("valid repository"),
            CommitSha::parse(FULL).expect("valid sha"),
            BuildState::Pending,
            DEFAULT_CONTEXT,
            target_url.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn posts_status_to_commit() {
        let (base, captured) = upstream::spawn(StatusCode::CREATED, "{}").await;

        repository(&base)
            .create(&status(Some("https://quay.io/repository/ejholmes/docker-statsd/build")))
            .await
            .expect("created");

        let requests = captured.lock().expect("capture lock").clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(
            requests[0].path,
            format!("/repos/ejholmes/docker-statsd/statuses/{FULL}")
        );
        assert_eq!(requests[0].authorization.as_deref(), Some("Bearer t0ken"));

        let body: serde_json::Value = serde_json::from_str(&requests[0].body).expect("json body");
        assert_eq!(
            body,
            serde_json::json!({
                "state": "pending",
                "context": "Docker Image",
                "target_url": "https://quay.io/repository/ejholmes/docker-statsd/build",
                "description": "Image is building",
            })
        );
    }

    #[tokio::test]
    async fn omits_absent_target_url() {
        let (base, captured) = upstream::spawn(StatusCode::CREATED, "{}").await;

        repository(&base).create(&status(None)).await.expect("created");

        let requests = captured.lock().expect("capture lock").clone();
        let body: serde_json::Value = serde_json::from_str(&requests[0].body).expect("json body");
        assert!(body.get("target_url").is_none());
    }

    #[tokio::test]
    async fn rejection_carries_status_and_message() {
        let (base, _) = upstream::spawn(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message":"No commit found for SHA"}"#,
        )
        .await;

        let err = repository(&base)
            .create(&status(None))
            .await
            .expect_err("rejected");

        assert_eq!(
            err,
            StatusCreationError::Rejected {
                status: 422,
                message: "No commit found for SHA".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn unreachable_api_is_transport_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let err = repository(&format!("http://{addr}"))
            .create(&status(None))
            .await
            .expect_err("unreachable");

        assert!(matches!(err, StatusCreationError::Transport { .. }));
    }
}
