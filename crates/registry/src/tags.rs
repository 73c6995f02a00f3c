//! Tag lookup and tag writes.

use async_trait::async_trait;
use domain::{
    ImageId, ImageTag, RepositoryId, TagResolutionError, TagResolver, TaggingError, Tagger,
};
use reqwest::StatusCode;

use crate::client::RegistryClient;

fn body_text(body: &[u8]) -> String {
    String::from_utf8_lossy(body).trim().to_string()
}

/// [`TagResolver`] backed by `GET /v1/repositories/{repo}/tags/{tag}`.
#[derive(Debug, Clone)]
pub struct RegistryTagResolver {
    client: RegistryClient,
}

impl RegistryTagResolver {
    /// Creates a resolver sharing `client`.
    #[must_use]
    pub fn new(client: RegistryClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TagResolver for RegistryTagResolver {
    #[tracing::instrument(skip_all, fields(repository = %repository, tag = %tag), err(Display))]
    async fn resolve(
        &self,
        repository: &RepositoryId,
        tag: &ImageTag,
    ) -> Result<ImageId, TagResolutionError> {
        let url = self
            .client
            .tag_url(repository, tag)
            .map_err(|message| TagResolutionError::Transport { message })?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TagResolutionError::Transport {
                message: format!("request failed: {e}"),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(TagResolutionError::TagNotFound {
                repository: repository.clone(),
                tag: tag.clone(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TagResolutionError::Transport {
                message: format!("failed reading response body: {e}"),
            })?;
        if !status.is_success() {
            return Err(TagResolutionError::Transport {
                message: format!("unexpected response ({status}): {}", body_text(&body)),
            });
        }

        let image = serde_json::from_slice::<String>(&body).map_err(|e| {
            TagResolutionError::Transport {
                message: format!("undecodable image id: {e}"),
            }
        })?;
        ImageId::new(image).ok_or_else(|| TagResolutionError::Transport {
            message: "registry returned an empty image id".to_string(),
        })
    }
}

/// [`Tagger`] backed by `PUT /v1/repositories/{repo}/tags/{tag}`.
#[derive(Debug, Clone)]
pub struct RegistryTagger {
    client: RegistryClient,
}

impl RegistryTagger {
    /// Creates a tagger sharing `client`.
    #[must_use]
    pub fn new(client: RegistryClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tagger for RegistryTagger {
    #[tracing::instrument(
        skip_all,
        fields(repository = %repository, image = %image, tag = %tag),
        err(Display)
    )]
    async fn tag(
        &self,
        repository: &RepositoryId,
        image: &ImageId,
        tag: &ImageTag,
    ) -> Result<(), TaggingError> {
        let url = self
            .client
            .tag_url(repository, tag)
            .map_err(|message| TaggingError::Transport { message })?;

        let response = self
            .client
            .put(url)
            .json(image.as_str())
            .send()
            .await
            .map_err(|e| TaggingError::Transport {
                message: format!("request failed: {e}"),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.bytes().await.map_err(|e| TaggingError::Transport {
            message: format!("failed reading error body: {e}"),
        })?;
        Err(TaggingError::Rejected {
            status: status.as_u16(),
            message: body_text(&body),
        })
    }
}
