//! Search action - lists the packages available from the remote source.

use anyhow::Result;
use log::info;

use crate::ops::OpReport;
use crate::source::Source;

pub struct SearchAction<'a, S: Source> {
    source: &'a S,
}

impl<'a, S: Source> SearchAction<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// List every package the remote source offers, one name per line
    /// in the report message.
    pub async fn search(&self) -> Result<OpReport> {
        info!("Searching for available packages...");
        let names = match self.source.list_packages().await {
            Ok(names) => names,
            Err(error) => {
                return Ok(OpReport::failed(format!(
                    "Failed to fetch package list: {}",
                    error
                )));
            }
        };

        if names.is_empty() {
            return Ok(OpReport::no_op("No packages available."));
        }
        Ok(OpReport::success(names.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::FetchError;
    use crate::ops::OpStatus;
    use crate::source::MockSource;

    #[tokio::test]
    async fn test_search_lists_names_in_order() {
        let mut source = MockSource::new();
        source
            .expect_list_packages()
            .returning(|| Ok(vec!["alpha".to_string(), "beta".to_string()]));

        let report = SearchAction::new(&source).search().await.unwrap();

        assert_eq!(report.status, OpStatus::Success);
        assert_eq!(report.message, "alpha\nbeta");
    }

    #[tokio::test]
    async fn test_search_empty_listing() {
        let mut source = MockSource::new();
        source.expect_list_packages().returning(|| Ok(Vec::new()));

        let report = SearchAction::new(&source).search().await.unwrap();

        assert_eq!(report.status, OpStatus::NoOp);
    }

    #[tokio::test]
    async fn test_search_listing_failure() {
        let mut source = MockSource::new();
        source
            .expect_list_packages()
            .returning(|| Err(FetchError::Network("connection refused".to_string())));

        let report = SearchAction::new(&source).search().await.unwrap();

        assert_eq!(report.status, OpStatus::Failed);
        assert!(report.message.contains("Failed to fetch package list"));
    }
}
