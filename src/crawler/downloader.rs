use crate::error::FetchError;
use crate::fetcher::Fetcher;
use crate::file_manager::FileManager;
use crate::types::{ImageMetadata, SaveOutcome};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// 由圖片 URL 推導檔名：最後一段路徑，去掉 query string 與 fragment
pub fn filename_from_url(url: &str) -> Result<String, FetchError> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let name = path.rsplit('/').next().unwrap_or_default();

    if name.is_empty() || name == "." || name == ".." || name.contains('\\') {
        return Err(FetchError::InvalidUrl {
            url: url.to_string(),
            reason: "無法從 URL 推導檔名".to_string(),
        });
    }

    Ok(name.to_string())
}

/// 檔名的狀態：`true` 表示檔案已在輸出目錄中
type Slot = Arc<Mutex<bool>>;

/// 圖片下載器
///
/// 同一檔名同時只有一個任務在下載，其餘任務等它結束：
/// 成功則視為重複，失敗則由下一個等待者接手重試。
pub struct ImageDownloader {
    fetcher: Arc<dyn Fetcher>,
    file_manager: Arc<FileManager>,
    /// 本次執行遇過的檔名
    slots: Mutex<HashMap<String, Slot>>,
    write_manifest: bool,
}

impl ImageDownloader {
    pub fn new(fetcher: Arc<dyn Fetcher>, file_manager: Arc<FileManager>, write_manifest: bool) -> Self {
        Self {
            fetcher,
            file_manager,
            slots: Mutex::new(HashMap::new()),
            write_manifest,
        }
    }

    /// 下載並儲存單張圖片
    ///
    /// 檔案已存在（本次或先前的執行寫入）時回傳 `Duplicate`，不會發出請求。
    /// 同檔名的任務正在下載時會等它結束；它失敗的話由本任務重新下載。
    pub async fn download(&self, page_id: u64, img_url: &str) -> Result<SaveOutcome, FetchError> {
        let filename = filename_from_url(img_url)?;
        let slot = self.slot(&filename).await;
        let mut present = slot.lock().await;

        if *present {
            debug!(page_id, filename = %filename, "檔名已被其他任務寫入");
            return Ok(SaveOutcome::Duplicate(filename));
        }

        let outcome = self.fetch_and_save(page_id, img_url, &filename).await?;
        *present = true;
        Ok(outcome)
    }

    async fn slot(&self, filename: &str) -> Slot {
        let mut slots = self.slots.lock().await;
        Arc::clone(slots.entry(filename.to_string()).or_default())
    }

    async fn fetch_and_save(
        &self,
        page_id: u64,
        img_url: &str,
        filename: &str,
    ) -> Result<SaveOutcome, FetchError> {
        if self.file_manager.exists(filename).await? {
            return Ok(SaveOutcome::Duplicate(filename.to_string()));
        }

        let bytes = self.fetcher.fetch_bytes(img_url).await?;

        // 目錄外部的程式可能剛好寫入同名檔案
        if !self.file_manager.save_image(filename, &bytes).await? {
            return Ok(SaveOutcome::Duplicate(filename.to_string()));
        }

        if self.write_manifest {
            self.record_metadata(page_id, img_url, filename, &bytes).await;
        }

        Ok(SaveOutcome::Saved(filename.to_string()))
    }

    async fn record_metadata(&self, page_id: u64, url: &str, filename: &str, bytes: &[u8]) {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        let hash = format!("{:x}", hasher.finalize());

        let metadata = ImageMetadata {
            filename: filename.to_string(),
            url: url.to_string(),
            page_id,
            content_hash: hash,
            size_bytes: bytes.len(),
            downloaded_at: Utc::now(),
        };

        if let Err(e) = self.file_manager.append_metadata(&metadata).await {
            warn!(filename = %filename, error = %e, "無法寫入 metadata");
        }
    }
}
