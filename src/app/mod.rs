// ==========================================
// 团队产能规划 - 应用层
// ==========================================
// 职责: 组装配置、数据库、外部服务与规划API
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
