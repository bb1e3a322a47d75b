use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A dependency with its resolved registry version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedDependency {
    pub name: String,
    pub version: String,
    /// The semver range written into the generated manifest: `^version`,
    /// or the bare dist-tag when resolution was skipped.
    pub range: String,
}

impl ResolvedDependency {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        let name = name.into();
        let version = version.into();
        let range = if version == "latest" {
            version.clone()
        } else {
            format!("^{version}")
        };
        Self {
            name,
            version,
            range,
        }
    }

    /// Placeholder used in offline mode: no network, pin the dist-tag.
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self::new(name, "latest")
    }
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("http client setup failed: {0}")]
    Build(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("registry returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("invalid response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// Thin JSON client for an npm-style package registry.
#[derive(Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    base_url: String,
}

impl RegistryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RegistryError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RegistryError::Build)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve a package's `latest` dist-tag to a concrete version.
    pub async fn latest_version(&self, package: &str) -> Result<String, RegistryError> {
        let url = format!("{}/{}/latest", self.base_url, package);
        tracing::debug!(package, url = url.as_str(), "resolving latest version");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| RegistryError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body: serde_json::Value =
            response
                .json()
                .await
                .map_err(|source| RegistryError::Request {
                    url: url.clone(),
                    source,
                })?;

        body.get("version")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RegistryError::Decode {
                url,
                reason: "missing 'version' field".to_string(),
            })
    }

    /// Resolve a package into a manifest-ready dependency entry.
    pub async fn resolve(&self, package: &str) -> Result<ResolvedDependency, RegistryError> {
        let version = self.latest_version(package).await?;
        Ok(ResolvedDependency::new(package, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_latest_version_happy_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/vite/latest")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name":"vite","version":"5.2.0"}"#)
            .create_async()
            .await;

        let client =
            RegistryClient::new(&server.url(), Duration::from_secs(2)).unwrap();
        let version = client.latest_version("vite").await.unwrap();
        assert_eq!(version, "5.2.0");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_package_maps_to_status_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/no-such-package/latest")
            .with_status(404)
            .with_body(r#"{"error":"Not found"}"#)
            .create_async()
            .await;

        let client =
            RegistryClient::new(&server.url(), Duration::from_secs(2)).unwrap();
        let err = client.latest_version("no-such-package").await.unwrap_err();
        match err {
            RegistryError::Status { status, .. } => assert_eq!(status, 404),
            other => panic!("expected status error, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_body_without_version_is_a_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/weird/latest")
            .with_status(200)
            .with_body(r#"{"name":"weird"}"#)
            .create_async()
            .await;

        let client =
            RegistryClient::new(&server.url(), Duration::from_secs(2)).unwrap();
        let err = client.latest_version("weird").await.unwrap_err();
        assert!(matches!(err, RegistryError::Decode { .. }));
    }

    #[test]
    fn test_resolved_dependency_range() {
        let dep = ResolvedDependency::new("vite", "5.2.0");
        assert_eq!(dep.range, "^5.2.0");
        let pinned = ResolvedDependency::unresolved("vite");
        assert_eq!(pinned.range, "latest");
    }
}
