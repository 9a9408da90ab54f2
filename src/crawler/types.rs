use crate::parser::{DEFAULT_IMAGE_ATTR, DEFAULT_IMAGE_SELECTOR};
use anyhow::{bail, Result};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://jbzd.com.pl/oczekujace/";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; Bot/1.0)";

/// 爬蟲配置
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// 頁面 URL 前綴，頁面編號直接接在後面
    pub base_url: String,
    /// 並發數量
    pub concurrency: usize,
    /// 請求超時（秒）
    pub timeout_secs: u64,
    pub user_agent: String,
    /// 圖片元素選擇器
    pub image_selector: String,
    /// 圖片 URL 的屬性名稱
    pub image_attr: String,
    /// 進度列更新間隔
    pub progress_interval: Duration,
    /// 是否顯示進度列
    pub show_progress: bool,
    /// 是否寫入 metadata.jsonl
    pub write_manifest: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            concurrency: 5,
            timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            image_selector: DEFAULT_IMAGE_SELECTOR.to_string(),
            image_attr: DEFAULT_IMAGE_ATTR.to_string(),
            progress_interval: Duration::from_secs(1),
            show_progress: true,
            write_manifest: true,
        }
    }
}

impl CrawlerConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_image_selector(mut self, selector: impl Into<String>) -> Self {
        self.image_selector = selector.into();
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn with_manifest(mut self, write_manifest: bool) -> Self {
        self.write_manifest = write_manifest;
        self
    }

    /// 派工前檢查，任何錯誤都會在送出第一個任務前中止
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            bail!("並發數必須大於 0");
        }
        if self.timeout_secs == 0 {
            bail!("請求超時必須大於 0 秒");
        }
        if self.base_url.is_empty() {
            bail!("base URL 不可為空");
        }
        Ok(())
    }
}
