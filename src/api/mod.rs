// ==========================================
// 团队产能规划 - API 层
// ==========================================
// 职责: 提供规划会话接口，供渲染层 / 控制台入口调用
// ==========================================

pub mod error;
pub mod planning_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use planning_api::{ApplyReport, EditorView, LoadOutcome, PlanningApi, TeamPlanningSession};
