//! Remote source abstraction for package archives and listings.
//!
//! Packages live as repositories under one GitHub organization; the source
//! knows how to turn a package name into a branch-archive download and how
//! to enumerate the organization's repositories.

mod github;

use async_trait::async_trait;

use crate::http::FetchError;

pub use github::GithubSource;

/// Default organization hosting the package repositories.
pub const DEFAULT_ORG: &str = "LFF-Linux-Packages";

/// Default GitHub API base URL (repository listing).
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default download base URL (branch archives).
pub const DEFAULT_ARCHIVE_URL: &str = "https://github.com";

/// Trait for remote package sources.
///
/// Abstracting the source keeps the operations testable: unit tests mock
/// it, integration tests point a real [`GithubSource`] at a local server.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Source: Send + Sync {
    /// Download the archive for a named package.
    ///
    /// A non-success response is [`FetchError::NotFound`]; transport
    /// failures are [`FetchError::Network`]. Single attempt, no timeout.
    async fn fetch_archive(&self, package_name: &str) -> Result<Vec<u8>, FetchError>;

    /// List the names of all packages available at the source.
    async fn list_packages(&self) -> Result<Vec<String>, FetchError>;
}
