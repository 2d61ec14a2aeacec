// ==========================================
// 团队产能规划 - API层错误类型
// ==========================================
// 职责: 统一编辑器校验错误、外部服务错误、Repository错误的对外表示
// 分类: 本地校验（不触达网络） / 单项拒绝 / 整体传输失败
// ==========================================

use crate::client::error::ServiceError;
use crate::engine::plan_editor::EditorError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 本地校验错误（同步返回，从不发起网络请求）
    // ==========================================
    #[error("校验失败: {0}")]
    Validation(String),

    #[error("尚未加载再平衡分析")]
    NoAnalysisLoaded,

    /// 同一工作项已有改派请求在途（视为重复操作）
    #[error("工作项改派进行中: work_item_id={0}")]
    ReassignInFlight(String),

    /// 同一团队已有方案提交在途
    #[error("上一次方案提交仍在进行中: team_id={0}")]
    ApplyInProgress(String),

    // ==========================================
    // 远端错误
    // ==========================================
    #[error("工作项被拒绝: work_item_id={work_item_id}, reason={reason}")]
    ItemRejected { work_item_id: String, reason: String },

    #[error("网络请求失败: {0}")]
    Transport(String),

    #[error("服务端错误: status={status}, message={message}")]
    Server { status: u16, message: String },

    /// 响应已到达但无法解析
    #[error("响应解析失败: {0}")]
    Decode(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    Database(String),

    #[error("内部错误: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 是否为本地校验类错误（不可重试）
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ApiError::Validation(_)
                | ApiError::NoAnalysisLoaded
                | ApiError::ReassignInFlight(_)
                | ApiError::ApplyInProgress(_)
        )
    }
}

// ==========================================
// 从 EditorError 转换
// ==========================================
impl From<EditorError> for ApiError {
    fn from(err: EditorError) -> Self {
        match err {
            EditorError::NoPlanLoaded => ApiError::NoAnalysisLoaded,
            other => ApiError::Validation(other.to_string()),
        }
    }
}

// ==========================================
// 从 ServiceError 转换
// ==========================================
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Transport(msg) => ApiError::Transport(msg),
            ServiceError::Server { status, message } => ApiError::Server { status, message },
            ServiceError::ItemRejected { work_item_id, reason } => {
                ApiError::ItemRejected { work_item_id, reason }
            }
            ServiceError::Decode(msg) => ApiError::Decode(msg),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::Database(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => ApiError::Internal(format!("数据库锁获取失败: {}", msg)),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::Validation(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
            other => ApiError::Database(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
