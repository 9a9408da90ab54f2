use std::path::PathBuf;
use thiserror::Error;

/// 單一任務層級的錯誤（不會中止整個工作池）
#[derive(Debug, Error)]
pub enum FetchError {
    /// 連線層失敗：逾時、DNS、連線被拒、讀取回應失敗
    #[error("網路錯誤 ({url}): {reason}")]
    Network { url: String, reason: String },

    /// 非 2xx 回應
    #[error("HTTP 錯誤 {status} ({url})")]
    Http { url: String, status: u16 },

    /// 頁面中沒有目標圖片元素，視為略過而非錯誤
    #[error("找不到目標圖片 ({url})")]
    NotFound { url: String },

    /// 無法組出或解析 URL，或無法由 URL 推導檔名
    #[error("無效的 URL ({url}): {reason}")]
    InvalidUrl { url: String, reason: String },

    /// 寫入圖片檔案失敗
    #[error("寫入失敗 ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// 造成此錯誤的 URL（IO 錯誤則為檔案路徑）
    pub fn target(&self) -> String {
        match self {
            FetchError::Network { url, .. }
            | FetchError::Http { url, .. }
            | FetchError::NotFound { url }
            | FetchError::InvalidUrl { url, .. } => url.clone(),
            FetchError::Io { path, .. } => path.display().to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mentions_url() {
        let err = FetchError::Http {
            url: "https://example.com/7".to_string(),
            status: 404,
        };
        let msg = err.to_string();
        assert!(msg.contains("404"));
        assert!(msg.contains("https://example.com/7"));
        assert_eq!(err.target(), "https://example.com/7");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_is_skip() {
        let err = FetchError::NotFound {
            url: "https://example.com/1".to_string(),
        };
        assert!(err.is_not_found());
    }
}
