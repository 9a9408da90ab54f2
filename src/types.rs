use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// 單一頁面的處理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// 圖片已下載並儲存
    ImageSaved(String),
    /// 檔名已存在，略過
    DuplicateSkipped(String),
    /// 頁面中沒有目標圖片
    NoImageFound,
    /// 網路 / HTTP / IO 錯誤
    FetchFailed(String),
}

/// 下載器的儲存結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(String),
    Duplicate(String),
}

/// 單張圖片的 metadata（寫入 metadata.jsonl）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// 檔案名稱
    pub filename: String,
    /// 原始 URL
    pub url: String,
    /// 來源頁面編號
    pub page_id: u64,
    /// 內容雜湊 (SHA256)
    pub content_hash: String,
    /// 檔案大小
    pub size_bytes: usize,
    /// 下載時間
    pub downloaded_at: DateTime<Utc>,
}

/// 一次執行的統計結果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// 範圍內的頁面總數
    pub total: usize,
    /// 已完成（不論成功或失敗）
    pub completed: usize,
    pub saved: usize,
    pub duplicates_skipped: usize,
    pub not_found: usize,
    pub failed: usize,
    /// 失敗的頁面編號（已排序，方便手動重跑）
    pub failed_pages: Vec<u64>,
    /// 檔名 -> 重複次數
    pub duplicates: BTreeMap<String, usize>,
    /// 花費時間（秒）
    pub elapsed_secs: f64,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// 記錄單一頁面的結果
    pub fn record(&mut self, page: u64, result: &FetchResult) {
        self.completed += 1;
        match result {
            FetchResult::ImageSaved(_) => self.saved += 1,
            FetchResult::DuplicateSkipped(_) => self.duplicates_skipped += 1,
            FetchResult::NoImageFound => self.not_found += 1,
            FetchResult::FetchFailed(_) => {
                self.failed += 1;
                self.failed_pages.push(page);
            }
        }
    }

    /// 顯示報告
    pub fn print_report(&self) {
        println!("\n╔══════════════════════════════════╗");
        println!("║       📊 爬取統計               ║");
        println!("╠══════════════════════════════════╣");
        println!("║ 總頁數:   {:>20} ║", self.total);
        println!("║ 已完成:   {:>20} ║", self.completed);
        println!("║ 已儲存:   {:>20} ║", self.saved);
        println!("║ 重複略過: {:>20} ║", self.duplicates_skipped);
        println!("║ 無圖片:   {:>20} ║", self.not_found);
        println!("║ 失敗頁面: {:>20} ║", self.failed);
        println!("║ 耗時(秒): {:>20.1} ║", self.elapsed_secs);
        if !self.failed_pages.is_empty() {
            println!("║ 失敗清單: {:?}", self.failed_pages);
        }
        println!("╚══════════════════════════════════╝");
    }
}
