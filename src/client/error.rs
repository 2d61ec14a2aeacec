// ==========================================
// 团队产能规划 - 外部服务错误类型
// ==========================================

use thiserror::Error;

/// 外部产能服务错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// 网络层失败（连接、超时）
    #[error("网络请求失败: {0}")]
    Transport(String),

    /// 服务端返回非成功状态
    #[error("服务端错误: status={status}, message={message}")]
    Server { status: u16, message: String },

    /// 单项被服务端拒绝（如负责人已变更）
    #[error("工作项被拒绝: work_item_id={work_item_id}, reason={reason}")]
    ItemRejected { work_item_id: String, reason: String },

    /// 响应体无法解析
    #[error("响应解析失败: {0}")]
    Decode(String),
}

impl ServiceError {
    /// 是否为可重试的瞬时错误
    pub fn is_transient(&self) -> bool {
        match self {
            ServiceError::Transport(_) => true,
            ServiceError::Server { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// 可重试的 HTTP 状态码
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ServiceError::Server {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

/// Result 类型别名
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ServiceError::Transport("timeout".into()).is_transient());
        assert!(ServiceError::Server { status: 503, message: String::new() }.is_transient());
        assert!(!ServiceError::Server { status: 404, message: String::new() }.is_transient());
        assert!(!ServiceError::ItemRejected { work_item_id: "T1".into(), reason: "stale".into() }.is_transient());
    }
}
