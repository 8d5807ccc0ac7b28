//! HTTP client wrapper with error classification.
//!
//! Every request is a single attempt: a hung remote blocks the operation,
//! a failed one surfaces immediately as a [`FetchError`]. No retries.

use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::FetchError;

/// HTTP client for remote package operations.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Performs a GET request and deserializes the JSON response.
    #[tracing::instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        debug!("GET JSON from {}...", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status, url));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| FetchError::Network(format!("Failed to parse JSON response: {}", e)))
    }

    /// Performs a GET request and returns the raw response body.
    #[tracing::instrument(skip(self))]
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!("GET bytes from {}...", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status, url));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(FetchError::from_transport)?;

        debug!("Downloaded {:.2} MB", bytes.len() as f64 / (1024.0 * 1024.0));
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_json_success() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "test", "value": 42}"#)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());

        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct TestResponse {
            name: String,
            value: i32,
        }

        let result: TestResponse = client.get_json(&format!("{}/test", url)).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.name, "test");
        assert_eq!(result.value, 42);
    }

    #[tokio::test]
    async fn test_get_json_not_found() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/test")
            .with_status(404)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let result: Result<serde_json::Value, _> = client.get_json(&format!("{}/test", url)).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_json_invalid_body() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/test")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let result: Result<serde_json::Value, _> = client.get_json(&format!("{}/test", url)).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }

    #[tokio::test]
    async fn test_get_bytes_success() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        let mock = server
            .mock("GET", "/file.zip")
            .with_status(200)
            .with_body("zip bytes")
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let bytes = client
            .get_bytes(&format!("{}/file.zip", url))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(bytes, b"zip bytes");
    }

    #[tokio::test]
    async fn test_get_bytes_not_found_is_single_attempt() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();

        // expect(1): a 404 must not be retried
        let mock = server
            .mock("GET", "/file.zip")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let result = client.get_bytes(&format!("{}/file.zip", url)).await;

        mock.assert_async().await;
        assert!(matches!(result, Err(FetchError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_bytes_transport_error() {
        // Port 1 is never listening; connect fails at the transport level
        let client = HttpClient::new(Client::new());
        let result = client.get_bytes("http://127.0.0.1:1/file.zip").await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }
}
