//! GitHub-backed package source.

use async_trait::async_trait;
use log::debug;

use crate::http::{FetchError, HttpClient};

use super::{DEFAULT_API_URL, DEFAULT_ARCHIVE_URL, DEFAULT_ORG, Source};

/// GitHub API response types (internal).
mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Repo {
        pub name: String,
    }
}

/// Fetches package archives and listings from a GitHub organization.
///
/// Archives come from the main-branch zip endpoint:
/// `{archive_url}/{org}/{name}/archive/refs/heads/main.zip`.
/// Listings come from `{api_url}/orgs/{org}/repos`.
pub struct GithubSource {
    http_client: HttpClient,
    org: String,
    api_url: String,
    archive_url: String,
}

impl GithubSource {
    /// Create a source for the default organization and endpoints.
    pub fn new(http_client: HttpClient) -> Self {
        Self::with_urls(http_client, DEFAULT_API_URL, DEFAULT_ARCHIVE_URL)
    }

    /// Create a source with custom endpoint bases (tests point these at a
    /// local server).
    pub fn with_urls(http_client: HttpClient, api_url: &str, archive_url: &str) -> Self {
        Self {
            http_client,
            org: DEFAULT_ORG.to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
            archive_url: archive_url.trim_end_matches('/').to_string(),
        }
    }

    fn archive_endpoint(&self, package_name: &str) -> String {
        format!(
            "{}/{}/{}/archive/refs/heads/main.zip",
            self.archive_url, self.org, package_name
        )
    }

    fn listing_endpoint(&self) -> String {
        format!("{}/orgs/{}/repos", self.api_url, self.org)
    }
}

#[async_trait]
impl Source for GithubSource {
    #[tracing::instrument(skip(self))]
    async fn fetch_archive(&self, package_name: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.archive_endpoint(package_name);
        debug!("Fetching package archive from {}...", url);
        self.http_client.get_bytes(&url).await
    }

    #[tracing::instrument(skip(self))]
    async fn list_packages(&self) -> Result<Vec<String>, FetchError> {
        let url = self.listing_endpoint();
        debug!("Fetching repository listing from {}...", url);

        // The listing endpoint either answers or it doesn't; a bad status
        // here is a listing failure, not a missing resource.
        let repos: Vec<api::Repo> = self
            .http_client
            .get_json(&url)
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(repos.into_iter().map(|r| r.name).collect())
    }
}
