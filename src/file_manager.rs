use crate::error::FetchError;
use crate::types::ImageMetadata;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

pub const DUPLICATES_FILE: &str = "duplicates.json";
pub const METADATA_FILE: &str = "metadata.jsonl";

/// 依啟動時間產生輸出目錄名稱，例如 `images_run_2024-05-01_13-45-00`
pub fn run_dir_name(now: DateTime<Local>) -> String {
    format!("images_run_{}", now.format("%Y-%m-%d_%H-%M-%S"))
}

/// 輸出目錄的檔案操作
pub struct FileManager {
    /// 輸出目錄，圖片直接放在這一層
    root_dir: PathBuf,
    /// metadata.jsonl 的寫入鎖
    manifest_lock: Mutex<()>,
}

impl FileManager {
    /// 建立輸出目錄（已存在則沿用）
    pub fn new(root_dir: impl AsRef<Path>) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();
        fs::create_dir_all(&root_dir)
            .with_context(|| format!("無法建立輸出目錄 {}", root_dir.display()))?;

        Ok(Self {
            root_dir,
            manifest_lock: Mutex::new(()),
        })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// 取得圖片儲存路徑
    pub fn image_path(&self, filename: &str) -> PathBuf {
        self.root_dir.join(filename)
    }

    /// 檔案是否已存在（之前的執行或本次較早的任務寫入）
    pub async fn exists(&self, filename: &str) -> Result<bool, FetchError> {
        let path = self.image_path(filename);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|source| FetchError::Io { path, source })
    }

    /// 以獨佔方式建立並寫入圖片
    ///
    /// 檔案已存在時回傳 `Ok(false)` 且不覆寫；寫到一半失敗會刪除殘檔。
    pub async fn save_image(&self, filename: &str, data: &[u8]) -> Result<bool, FetchError> {
        let path = self.image_path(filename);

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(source) => return Err(FetchError::Io { path, source }),
        };

        if let Err(source) = write_and_flush(&mut file, data).await {
            drop(file);
            let _ = tokio::fs::remove_file(&path).await;
            return Err(FetchError::Io { path, source });
        }

        Ok(true)
    }

    /// Append metadata 到 JSONL 檔案
    pub async fn append_metadata(&self, metadata: &ImageMetadata) -> Result<()> {
        let _guard = self.manifest_lock.lock().await;
        let path = self.root_dir.join(METADATA_FILE);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("無法開啟 metadata.jsonl")?;

        let mut writer = BufWriter::new(file);

        serde_json::to_writer(&mut writer, metadata)
            .context("無法寫入 metadata")?;
        writeln!(writer).context("無法寫入換行符號")?;

        writer.flush().context("無法 flush buffer")?;

        Ok(())
    }

    /// 儲存重複報告（原子性寫入），沒有重複時不建立檔案
    pub fn save_duplicates(&self, duplicates: &BTreeMap<String, usize>) -> Result<Option<PathBuf>> {
        if duplicates.is_empty() {
            return Ok(None);
        }

        let path = self.root_dir.join(DUPLICATES_FILE);
        let temp_path = self.root_dir.join(format!("{}.tmp", DUPLICATES_FILE));

        let file = File::create(&temp_path)
            .context("無法建立暫存檔")?;
        let mut writer = BufWriter::new(file);

        serde_json::to_writer_pretty(&mut writer, duplicates)
            .context("無法寫入 duplicates.json")?;
        writer.flush().context("無法 flush buffer")?;
        drop(writer);

        fs::rename(&temp_path, &path)
            .context("無法更新 duplicates.json")?;

        Ok(Some(path))
    }
}

#[cfg(test)]
impl FileManager {
    /// 讀回 metadata.jsonl，測試用
    pub fn load_all_metadata(&self) -> Result<Vec<ImageMetadata>> {
        use std::io::{BufRead, BufReader};

        let path = self.root_dir.join(METADATA_FILE);

        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&path)
            .context("無法開啟 metadata.jsonl")?;
        let reader = BufReader::new(file);

        let mut metadata_list = Vec::new();
        for line in reader.lines() {
            let line = line.context("讀取行失敗")?;
            if line.trim().is_empty() {
                continue;
            }

            let metadata: ImageMetadata = serde_json::from_str(&line)
                .context("解析 metadata 失敗")?;
            metadata_list.push(metadata);
        }

        Ok(metadata_list)
    }
}

async fn write_and_flush(file: &mut tokio::fs::File, data: &[u8]) -> io::Result<()> {
    file.write_all(data).await?;
    file.flush().await
}
