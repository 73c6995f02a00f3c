//! Revision resolution via the commits endpoint.

use async_trait::async_trait;
use domain::{CommitResolver, CommitSha, RepositoryId, ResolutionError, RevisionRef};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::client::{upstream_message, GitHubClient};

/// The part of GitHub's commit representation this adapter reads.
#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
}

/// [`CommitResolver`] backed by `GET /repos/{owner}/{repo}/commits/{ref}`.
#[derive(Debug, Clone)]
pub struct GitHubCommitResolver {
    client: GitHubClient,
}

impl GitHubCommitResolver {
    /// Creates a resolver sharing `client`.
    #[must_use]
    pub fn new(client: GitHubClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CommitResolver for GitHubCommitResolver {
    #[tracing::instrument(
        skip_all,
        fields(repository = %repository, reference = %reference),
        err(Display)
    )]
    async fn resolve(
        &self,
        repository: &RepositoryId,
        reference: &RevisionRef,
    ) -> Result<CommitSha, ResolutionError> {
        let url = self
            .client
            .endpoint(&[
                "repos",
                repository.owner(),
                repository.name(),
                "commits",
                reference.as_str(),
            ])
            .map_err(|message| ResolutionError::Transport { message })?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ResolutionError::Transport {
                message: format!("request failed: {e}"),
            })?;

        let status = response.status();
        if status.is_success() {
            let commit = response
                .json::<CommitResponse>()
                .await
                .map_err(|e| ResolutionError::InvalidResponse {
                    message: format!("undecodable commit body: {e}"),
                })?;
            return CommitSha::parse(commit.sha).map_err(|e| ResolutionError::InvalidResponse {
                message: e.to_string(),
            });
        }

        let body = response.bytes().await.map_err(|e| ResolutionError::Transport {
            message: format!("failed reading error body: {e}"),
        })?;
        let message = upstream_message(&body);
        tracing::debug!(status = %status, message = %message, "Commit lookup rejected");

        match status {
            StatusCode::NOT_FOUND => Err(ResolutionError::UnknownRevision {
                repository: repository.clone(),
                reference: reference.clone(),
            }),
            StatusCode::UNPROCESSABLE_ENTITY => Err(ResolutionError::AmbiguousRevision {
                repository: repository.clone(),
                reference: reference.clone(),
                message,
            }),
            _ => Err(ResolutionError::Transport {
                message: format!("unexpected response ({status}): {message}"),
            }),
        }
    }
}
