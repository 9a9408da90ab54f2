use crate::dedup::DuplicateRegistry;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::file_manager::FileManager;
use crate::parser::ImageTagParser;
use crate::progress::{progress_bar, spawn_reporter, ProgressTracker};
use crate::types::{FetchResult, RunSummary, SaveOutcome};
use super::{downloader::ImageDownloader, page::PageFetcher, types::CrawlerConfig};
use anyhow::{anyhow, bail, Context, Result};
use indicatif::ProgressBar;
use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 主爬蟲引擎：固定數量的 worker 從佇列取出頁面編號處理
pub struct CrawlerEngine {
    file_manager: Arc<FileManager>,
    pages: Arc<PageFetcher>,
    downloader: Arc<ImageDownloader>,
    config: CrawlerConfig,
}

impl CrawlerEngine {
    pub fn new(output_dir: impl AsRef<Path>, config: CrawlerConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(config.timeout_secs, &config.user_agent)?);
        Self::with_fetcher(output_dir, config, fetcher)
    }

    pub fn with_fetcher(
        output_dir: impl AsRef<Path>,
        config: CrawlerConfig,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self> {
        config.validate()?;

        let parser = Arc::new(ImageTagParser::new(&config.image_selector, &config.image_attr)?);
        let file_manager = Arc::new(FileManager::new(output_dir)?);
        let pages = Arc::new(PageFetcher::new(
            config.base_url.clone(),
            Arc::clone(&fetcher),
            parser,
        ));
        let downloader = Arc::new(ImageDownloader::new(
            fetcher,
            Arc::clone(&file_manager),
            config.write_manifest,
        ));

        Ok(Self {
            file_manager,
            pages,
            downloader,
            config,
        })
    }

    pub fn file_manager(&self) -> &FileManager {
        &self.file_manager
    }

    /// 處理範圍內每一個頁面，全部結束後才回傳
    pub async fn run(&self, range: RangeInclusive<u64>) -> Result<RunSummary> {
        let (start, end) = range.into_inner();
        if start > end {
            bail!("起始頁 {} 大於結束頁 {}", start, end);
        }
        let total = (end - start)
            .checked_add(1)
            .and_then(|n| usize::try_from(n).ok())
            .context("頁面範圍過大")?;

        let workers = self.config.concurrency.min(total);
        info!(
            start,
            end,
            total,
            concurrency = workers,
            output_dir = %self.file_manager.root_dir().display(),
            "開始爬取"
        );

        let tracker = Arc::new(ProgressTracker::new(total));
        let registry = Arc::new(DuplicateRegistry::new());

        let pb = progress_bar(self.config.show_progress)?;
        let reporter = spawn_reporter(
            Arc::clone(&tracker),
            pb.clone(),
            self.config.progress_interval,
        );

        // 預先填滿的工作佇列，送完即關閉
        let (tx, rx) = flume::unbounded();
        for page in start..=end {
            tx.send(page).map_err(|_| anyhow!("工作佇列已關閉"))?;
        }
        drop(tx);

        let mut tasks = vec![];
        for _ in 0..workers {
            let rx = rx.clone();
            let pages = Arc::clone(&self.pages);
            let downloader = Arc::clone(&self.downloader);
            let registry = Arc::clone(&registry);
            let tracker = Arc::clone(&tracker);
            let pb = pb.clone();

            tasks.push(tokio::spawn(async move {
                let mut results = vec![];
                while let Ok(page) = rx.recv_async().await {
                    let result = process_page(page, &pages, &downloader, &registry, &pb).await;
                    tracker.record_completion();
                    results.push((page, result));
                }
                results
            }));
        }

        let mut summary = RunSummary::new(total);
        for task in tasks {
            match task.await {
                Ok(results) => {
                    for (page, result) in results {
                        summary.record(page, &result);
                    }
                }
                Err(e) => {
                    reporter.abort();
                    pb.abandon();
                    return Err(e).context("worker 異常結束");
                }
            }
        }

        reporter.abort();
        pb.finish_with_message(tracker.render());

        summary.failed_pages.sort_unstable();
        summary.duplicates = registry.snapshot().await;
        summary.elapsed_secs = tracker.estimate().elapsed_secs;

        info!(
            completed = summary.completed,
            saved = summary.saved,
            duplicates = summary.duplicates_skipped,
            failed = summary.failed,
            "爬取完成"
        );

        Ok(summary)
    }
}

/// 單一頁面：抓頁面 -> 找圖片 -> 下載；錯誤只記錄，不中止其他任務
///
/// 警告透過 `pb.suspend` 輸出，避免和進度列搶同一行 stderr。
async fn process_page(
    page: u64,
    pages: &PageFetcher,
    downloader: &ImageDownloader,
    registry: &DuplicateRegistry,
    pb: &ProgressBar,
) -> FetchResult {
    let img_url = match pages.fetch(page).await {
        Ok(url) => url,
        Err(e) if e.is_not_found() => {
            debug!(page, "頁面沒有圖片");
            return FetchResult::NoImageFound;
        }
        Err(e) => {
            pb.suspend(|| warn!(page, url = %e.target(), "❌ {}", e));
            return FetchResult::FetchFailed(e.to_string());
        }
    };

    match downloader.download(page, &img_url).await {
        Ok(SaveOutcome::Saved(filename)) => FetchResult::ImageSaved(filename),
        Ok(SaveOutcome::Duplicate(filename)) => {
            registry.record_collision(&filename).await;
            FetchResult::DuplicateSkipped(filename)
        }
        Err(e) => {
            pb.suspend(|| {
                warn!(page, image_url = %img_url, location = %e.target(), "❌ 下載失敗: {}", e)
            });
            FetchResult::FetchFailed(e.to_string())
        }
    }
}
