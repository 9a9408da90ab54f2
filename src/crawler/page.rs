use crate::error::FetchError;
use crate::fetcher::Fetcher;
use crate::parser::PageParser;
use reqwest::Url;
use std::sync::Arc;

/// 取得單一頁面並找出其中的圖片 URL
pub struct PageFetcher {
    base_url: String,
    fetcher: Arc<dyn Fetcher>,
    parser: Arc<dyn PageParser>,
}

impl PageFetcher {
    pub fn new(base_url: String, fetcher: Arc<dyn Fetcher>, parser: Arc<dyn PageParser>) -> Self {
        Self {
            base_url,
            fetcher,
            parser,
        }
    }

    /// 頁面 URL = base URL + 編號
    pub fn page_url(&self, id: u64) -> String {
        format!("{}{}", self.base_url, id)
    }

    /// 抓取頁面，回傳圖片 URL
    ///
    /// 找不到圖片元素時回傳 `FetchError::NotFound`，呼叫端應視為略過。
    pub async fn fetch(&self, id: u64) -> Result<String, FetchError> {
        let url = self.page_url(id);
        let html = self.fetcher.fetch_text(&url).await?;

        let src = self
            .parser
            .find_image(&html)
            .ok_or_else(|| FetchError::NotFound { url: url.clone() })?;

        resolve_image_url(&url, src.trim())
    }
}

/// 絕對 URL 原樣保留，相對路徑以頁面 URL 為基準補全
fn resolve_image_url(page_url: &str, src: &str) -> Result<String, FetchError> {
    if Url::parse(src).is_ok() {
        return Ok(src.to_string());
    }

    let invalid = |reason: String| FetchError::InvalidUrl {
        url: src.to_string(),
        reason,
    };

    let base = Url::parse(page_url).map_err(|e| invalid(format!("頁面 URL 無效: {}", e)))?;
    base.join(src)
        .map(|u| u.to_string())
        .map_err(|e| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{MockFetcher, MockResponse};
    use crate::parser::{ImageTagParser, DEFAULT_IMAGE_ATTR, DEFAULT_IMAGE_SELECTOR};

    const BASE: &str = "https://example.com/waiting/";

    fn page_fetcher(mock: MockFetcher) -> PageFetcher {
        PageFetcher::new(
            BASE.to_string(),
            Arc::new(mock),
            Arc::new(ImageTagParser::new(DEFAULT_IMAGE_SELECTOR, DEFAULT_IMAGE_ATTR).unwrap()),
        )
    }

    fn page(src: &str) -> MockResponse {
        MockResponse::Html(format!(
            r#"<html><body><img class="article-image" src="{}"></body></html>"#,
            src
        ))
    }

    #[test]
    fn test_page_url() {
        let pages = page_fetcher(MockFetcher::new());
        assert_eq!(pages.page_url(42), "https://example.com/waiting/42");
    }

    #[tokio::test]
    async fn test_absolute_src_verbatim() {
        let src = "https://cdn.example.com/img/abc.jpg?v=2";
        let pages = page_fetcher(MockFetcher::new().with(&format!("{}7", BASE), page(src)));

        assert_eq!(pages.fetch(7).await.unwrap(), src);
    }

    #[tokio::test]
    async fn test_relative_src_resolved() {
        let pages = page_fetcher(
            MockFetcher::new()
                .with(&format!("{}1", BASE), page("/uploads/a.png"))
                .with(&format!("{}2", BASE), page("//cdn.example.com/b.png")),
        );

        assert_eq!(
            pages.fetch(1).await.unwrap(),
            "https://example.com/uploads/a.png"
        );
        assert_eq!(pages.fetch(2).await.unwrap(), "https://cdn.example.com/b.png");
    }

    #[tokio::test]
    async fn test_missing_image_is_not_found() {
        let pages = page_fetcher(MockFetcher::new().with(
            &format!("{}3", BASE),
            MockResponse::Html("<html><img src=\"/logo.png\"></html>".to_string()),
        ));

        let err = pages.fetch(3).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_http_error_passes_through() {
        let pages = page_fetcher(
            MockFetcher::new().with(&format!("{}4", BASE), MockResponse::Status(503)),
        );

        match pages.fetch(4).await.unwrap_err() {
            FetchError::Http { url, status } => {
                assert_eq!(status, 503);
                assert_eq!(url, format!("{}4", BASE));
            }
            other => panic!("預期 HTTP 錯誤，得到 {:?}", other),
        }
    }
}
