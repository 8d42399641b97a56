//! Remote JSON-document store (JSONBin-style collaborator).
//!
//! The whole panel list lives in one bin; reads fetch the latest document,
//! writes overwrite it. Callers treat both as best-effort.

use std::time::Duration;

use {
    anyhow::{Context, Result},
    async_trait::async_trait,
    reqwest::header::{HeaderMap, HeaderValue},
};

use crate::{store::PanelStore, types::Panel};

const DEFAULT_BASE_URL: &str = "https://api.jsonbin.io/v3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct RemoteStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    bin_id: String,
}

impl RemoteStore {
    pub fn new(api_key: impl Into<String>, bin_id: impl Into<String>) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, bin_id)
    }

    /// Point the store at a non-default endpoint. Tests use this with a
    /// local mock server.
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        bin_id: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build document store client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            bin_id: bin_id.into(),
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Master-Key",
            HeaderValue::from_str(&self.api_key).context("invalid document store api key")?,
        );
        Ok(headers)
    }
}

#[async_trait]
impl PanelStore for RemoteStore {
    async fn load(&self) -> Result<Vec<Panel>> {
        let url = format!("{}/b/{}/latest", self.base_url, self.bin_id);
        let mut headers = self.headers()?;
        headers.insert("X-Bin-Meta", HeaderValue::from_static("false"));

        let response = self
            .http
            .get(&url)
            .headers(headers)
            .send()
            .await
            .context("document store read failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("document store read rejected: status {status}");
        }

        let panels: Vec<Panel> = response
            .json()
            .await
            .context("document store returned a malformed panel list")?;
        Ok(panels)
    }

    async fn save(&self, panels: &[Panel]) -> Result<()> {
        let url = format!("{}/b/{}", self.base_url, self.bin_id);
        let response = self
            .http
            .put(&url)
            .headers(self.headers()?)
            .json(panels)
            .send()
            .await
            .context("document store write failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("document store write rejected: status {status}");
        }
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_parses_latest_document() {
        let mut server = mockito::Server::new_async().await;
        let panel = Panel::new("farm", 3);
        let body = serde_json::to_string(&[panel.clone()]).unwrap();
        let mock = server
            .mock("GET", "/b/bin123/latest")
            .match_header("X-Master-Key", "key123")
            .match_header("X-Bin-Meta", "false")
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let store = RemoteStore::with_base_url(server.url(), "key123", "bin123").unwrap();
        let panels = store.load().await.unwrap();

        mock.assert_async().await;
        assert_eq!(panels, vec![panel]);
    }

    #[tokio::test]
    async fn load_rejected_status_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/b/bin123/latest")
            .with_status(401)
            .create_async()
            .await;

        let store = RemoteStore::with_base_url(server.url(), "bad-key", "bin123").unwrap();
        assert!(store.load().await.is_err());
    }

    #[tokio::test]
    async fn save_puts_whole_document() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/b/bin123")
            .match_header("X-Master-Key", "key123")
            .match_header("content-type", "application/json")
            .with_status(200)
            .create_async()
            .await;

        let store = RemoteStore::with_base_url(server.url(), "key123", "bin123").unwrap();
        store.save(&[Panel::new("farm", 3)]).await.unwrap();
        mock.assert_async().await;
    }
}
