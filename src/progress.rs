use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

const BAR_LENGTH: usize = 30;

/// 已耗時與預估剩餘時間
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub elapsed_secs: f64,
    pub eta_minutes: u64,
    pub eta_seconds: u64,
}

/// 完成數計數器，所有 worker 共用
#[derive(Debug)]
pub struct ProgressTracker {
    completed: AtomicUsize,
    total: usize,
    started: Instant,
}

impl ProgressTracker {
    pub fn new(total: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
            started: Instant::now(),
        }
    }

    /// 每個任務結束時呼叫一次（不論結果），回傳目前完成數
    pub fn record_completion(&self) -> usize {
        self.completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn estimate(&self) -> Estimate {
        self.estimate_at(self.completed(), self.elapsed())
    }

    /// 平均每頁耗時 × 剩餘頁數；尚未完成任何頁面時 ETA 為 0
    fn estimate_at(&self, completed: usize, elapsed: Duration) -> Estimate {
        let elapsed_secs = elapsed.as_secs_f64();
        if completed == 0 {
            return Estimate {
                elapsed_secs,
                eta_minutes: 0,
                eta_seconds: 0,
            };
        }

        let sec_per_page = elapsed_secs / completed as f64;
        let remaining = self.total.saturating_sub(completed);
        let eta = (sec_per_page * remaining as f64).max(0.0) as u64;

        Estimate {
            elapsed_secs,
            eta_minutes: eta / 60,
            eta_seconds: eta % 60,
        }
    }

    /// 例如 `[█████████---...] 3/10 (30%) | 預估剩餘: 0m 12s`
    pub fn render(&self) -> String {
        self.render_at(self.completed(), self.elapsed())
    }

    fn render_at(&self, completed: usize, elapsed: Duration) -> String {
        let fraction = if self.total == 0 {
            1.0
        } else {
            (completed as f64 / self.total as f64).min(1.0)
        };
        let filled = (BAR_LENGTH as f64 * fraction) as usize;
        let bar = format!("{}{}", "█".repeat(filled), "-".repeat(BAR_LENGTH - filled));

        let estimate = self.estimate_at(completed, elapsed);
        format!(
            "[{}] {}/{} ({:.0}%) | 預估剩餘: {}m {}s",
            bar,
            completed,
            self.total,
            fraction * 100.0,
            estimate.eta_minutes,
            estimate.eta_seconds
        )
    }
}

/// 建立只顯示訊息的進度列，`visible` 為 false 時不輸出
pub fn progress_bar(visible: bool) -> Result<ProgressBar> {
    if !visible {
        return Ok(ProgressBar::hidden());
    }

    let pb = ProgressBar::new(0);
    pb.set_style(ProgressStyle::default_bar().template("{msg}")?);
    Ok(pb)
}

/// 固定間隔讀取計數器並更新進度列，由呼叫端在結束時 abort
pub fn spawn_reporter(
    tracker: Arc<ProgressTracker>,
    pb: ProgressBar,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            pb.set_message(tracker.render());
        }
    })
}
