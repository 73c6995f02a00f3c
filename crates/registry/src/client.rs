//! Shared registry HTTP client and credentials.

use std::str::FromStr;
use std::time::Duration;

use domain::{ImageTag, RepositoryId};
use reqwest::{RequestBuilder, Url};
use thiserror::Error;

/// Quay's public registry root.
pub const DEFAULT_REGISTRY_URL: &str = "https://quay.io";

/// Returned when a credential pair is not `username:password`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialsError {
    /// The value has no `:` separator.
    #[error("registry credentials must be 'username:password'")]
    MissingSeparator,

    /// The username part is empty.
    #[error("registry username must not be empty")]
    EmptyUsername,
}

/// Basic-auth credentials for the registry API.
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    username: String,
    password: String,
}

impl RegistryCredentials {
    /// Creates credentials from their parts.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl FromStr for RegistryCredentials {
    type Err = CredentialsError;

    /// Parses `username:password`. The password may itself contain `:`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (username, password) = s.split_once(':').ok_or(CredentialsError::MissingSeparator)?;
        if username.is_empty() {
            return Err(CredentialsError::EmptyUsername);
        }
        Ok(Self::new(username, password))
    }
}

impl std::fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Connection settings for the registry API.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Registry root (e.g. `https://quay.io`).
    pub base_url: Url,
    /// Credentials attached to every request, when present.
    pub credentials: Option<RegistryCredentials>,
    /// Optional per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

/// HTTP client for the registry's tag endpoints.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Option<RegistryCredentials>,
}

impl RegistryClient {
    /// Creates a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns the underlying error when the HTTP client cannot be
    /// initialised.
    pub fn new(config: RegistryConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder().user_agent("quayd");
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            credentials: config.credentials,
        })
    }

    /// Builds `{base}/v1/repositories/{owner}/{name}/tags/{tag}`.
    pub(crate) fn tag_url(&self, repository: &RepositoryId, tag: &ImageTag) -> Result<Url, String> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| format!("{} cannot be used as a registry root", self.base_url))?
            .pop_if_empty()
            .extend([
                "v1",
                "repositories",
                repository.owner(),
                repository.name(),
                "tags",
                tag.as_str(),
            ]);
        Ok(url)
    }

    pub(crate) fn get(&self, url: Url) -> RequestBuilder {
        self.authenticate(self.http.get(url))
    }

    pub(crate) fn put(&self, url: Url) -> RequestBuilder {
        self.authenticate(self.http.put(url))
    }

    fn authenticate(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(c) => request.basic_auth(&c.username, Some(&c.password)),
            None => request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn parses_username_and_password() {
        let creds: RegistryCredentials = "robot+ci:s3cr:et".parse().expect("valid pair");
        assert_eq!(creds, RegistryCredentials::new("robot+ci", "s3cr:et"));
    }

    #[rstest]
    #[case("robot", CredentialsError::MissingSeparator)]
    #[case(":password", CredentialsError::EmptyUsername)]
    fn rejects_malformed_pairs(#[case] value: &str, #[case] expected: CredentialsError) {
        assert_eq!(value.parse::<RegistryCredentials>(), Err(expected));
    }

    #[test]
    fn debug_output_hides_password() {
        let rendered = format!("{:?}", RegistryCredentials::new("robot", "hunter2"));
        assert!(rendered.contains("robot"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn tag_url_keeps_repository_segments_separate() {
        let client = RegistryClient::new(RegistryConfig {
            base_url: Url::parse(DEFAULT_REGISTRY_URL).expect("valid url"),
            credentials: None,
            timeout: None,
        })
        .expect("client builds");
        let url = client
            .tag_url(
                &RepositoryId::parse("org/app").expect("valid repository"),
                &ImageTag::new("v1").expect("non-empty"),
            )
            .expect("url");
        assert_eq!(url.as_str(), "https://quay.io/v1/repositories/org/app/tags/v1");
    }
}
