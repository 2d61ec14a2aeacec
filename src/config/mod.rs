// ==========================================
// 团队产能规划 - 配置层
// ==========================================
// 职责: 规划参数（config_kv 覆写）与服务连接参数（环境变量）
// ==========================================

pub mod config_manager;
pub mod planner_config;

pub use config_manager::{config_keys, ConfigManager};
pub use planner_config::{PlannerConfig, ServiceConfig};
