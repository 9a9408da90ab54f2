// 子模組
pub mod types;
pub mod page;
pub mod downloader;
pub mod engine;

// 重新導出
pub use types::CrawlerConfig;
pub use engine::CrawlerEngine;
