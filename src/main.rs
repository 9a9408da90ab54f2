mod types;
mod error;
mod file_manager;
mod fetcher;
mod parser;
mod crawler;
mod dedup;
mod progress;

use crawler::{CrawlerEngine, CrawlerConfig};
use crawler::types::DEFAULT_BASE_URL;
use file_manager::run_dir_name;
use parser::DEFAULT_IMAGE_SELECTOR;
use anyhow::{bail, Result};
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// 依頁面編號範圍下載文章圖片
#[derive(Parser, Debug, Clone)]
#[command(name = "page-image-crawler", about = "依頁面編號範圍下載文章圖片")]
struct Cli {
    /// 起始頁（含）
    start: u64,

    /// 結束頁（含）
    end: u64,

    /// 同時處理的頁面數
    #[arg(long, env = "CRAWLER_CONCURRENCY", default_value_t = 5)]
    concurrency: usize,

    /// 頁面 URL 前綴
    #[arg(long, env = "CRAWLER_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// 輸出目錄，預設為 images_run_<時間>
    #[arg(long, env = "CRAWLER_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// 單一請求超時（秒）
    #[arg(long = "timeout", env = "CRAWLER_TIMEOUT", default_value_t = 10)]
    timeout_secs: u64,

    /// 圖片元素的 CSS 選擇器
    #[arg(long, env = "CRAWLER_SELECTOR", default_value = DEFAULT_IMAGE_SELECTOR)]
    selector: String,

    /// 不顯示進度列
    #[arg(long, short)]
    quiet: bool,

    /// 不寫入 metadata.jsonl
    #[arg(long)]
    no_manifest: bool,
}

impl Cli {
    fn config(&self) -> CrawlerConfig {
        CrawlerConfig::default()
            .with_base_url(self.base_url.clone())
            .with_concurrency(self.concurrency)
            .with_timeout(self.timeout_secs)
            .with_image_selector(self.selector.clone())
            .with_progress(!self.quiet)
            .with_manifest(!self.no_manifest)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    run_crawler(cli).await
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run_crawler(cli: Cli) -> Result<()> {
    println!("=== Page Image Crawler ===\n");

    if cli.start > cli.end {
        bail!("起始頁 {} 大於結束頁 {}", cli.start, cli.end);
    }

    let output_dir = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(run_dir_name(Local::now())));

    let crawler = CrawlerEngine::new(&output_dir, cli.config())?;

    println!("頁面範圍: {} - {}", cli.start, cli.end);
    println!("並發數: {}", cli.concurrency);
    println!("輸出目錄: {}\n", output_dir.display());

    let summary = crawler.run(cli.start..=cli.end).await?;
    summary.print_report();

    match crawler.file_manager().save_duplicates(&summary.duplicates)? {
        Some(path) => println!("✅ 已儲存重複報告到 {}", path.display()),
        None => println!("✅ 沒有重複圖片"),
    }

    Ok(())
}
