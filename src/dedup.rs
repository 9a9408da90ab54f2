use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;

/// 檔名重複登記表
///
/// 第一次碰撞建立為 1，之後每次 +1，不會遞減或移除。
#[derive(Debug, Default)]
pub struct DuplicateRegistry {
    counts: Mutex<HashMap<String, usize>>,
}

impl DuplicateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 記錄一次碰撞，回傳該檔名目前的次數
    pub async fn record_collision(&self, filename: &str) -> usize {
        let mut counts = self.counts.lock().await;
        let count = counts.entry(filename.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// 目前狀態的複本（依檔名排序）
    pub async fn snapshot(&self) -> BTreeMap<String, usize> {
        let counts = self.counts.lock().await;
        counts
            .iter()
            .map(|(name, count)| (name.clone(), *count))
            .collect()
    }
}
