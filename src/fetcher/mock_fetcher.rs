use super::Fetcher;
use crate::error::FetchError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// 預先設定好的回應
#[derive(Debug, Clone)]
pub enum MockResponse {
    Html(String),
    Bytes(Vec<u8>),
    Status(u16),
    Network(String),
}

/// 測試用 Fetcher：依 URL 回傳固定回應，未設定的 URL 回 404
pub struct MockFetcher {
    responses: HashMap<String, MockResponse>,
    requests: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn with(mut self, url: &str, response: MockResponse) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// 某個 URL 被請求的次數
    pub fn request_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }

    pub fn total_requests(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    async fn respond(&self, url: &str) -> Result<&MockResponse, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.responses.get(url) {
            Some(MockResponse::Status(status)) => Err(FetchError::Http {
                url: url.to_string(),
                status: *status,
            }),
            Some(MockResponse::Network(reason)) => Err(FetchError::Network {
                url: url.to_string(),
                reason: reason.clone(),
            }),
            Some(response) => Ok(response),
            None => Err(FetchError::Http {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        match self.respond(url).await? {
            MockResponse::Html(body) => Ok(body.clone()),
            MockResponse::Bytes(bytes) => Ok(String::from_utf8_lossy(bytes).into_owned()),
            _ => unreachable!("錯誤回應已在 respond 處理"),
        }
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        match self.respond(url).await? {
            MockResponse::Html(body) => Ok(body.as_bytes().to_vec()),
            MockResponse::Bytes(bytes) => Ok(bytes.clone()),
            _ => unreachable!("錯誤回應已在 respond 處理"),
        }
    }
}
