use crate::error::FetchError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;

#[cfg(test)]
mod mock_fetcher;

#[cfg(test)]
pub use mock_fetcher::{MockFetcher, MockResponse};

/// HTTP Fetcher trait - 頁面與圖片共用同一個介面，測試時可替換
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// 取得頁面 HTML
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;

    /// 取得二進位內容（圖片）
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// HTTP 實作（每個請求只嘗試一次，不重試）
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// 建立新的 HTTP Fetcher
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .context("無法建立 HTTP 客戶端")?;

        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<Response, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

fn network_error(url: &str, e: reqwest::Error) -> FetchError {
    let reason = if e.is_timeout() {
        format!("請求逾時: {}", e)
    } else if e.is_connect() {
        format!("無法連線: {}", e)
    } else {
        e.to_string()
    };

    FetchError::Network {
        url: url.to_string(),
        reason,
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.get(url)
            .await?
            .text()
            .await
            .map_err(|e| network_error(url, e))
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let bytes = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(|e| network_error(url, e))?;

        Ok(bytes.to_vec())
    }
}
