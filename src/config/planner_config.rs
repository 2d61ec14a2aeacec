// ==========================================
// 团队产能规划 - 配置结构
// ==========================================
// PlannerConfig: 规划行为参数（可由 config_kv 覆写）
// ServiceConfig: 外部产能服务连接参数（来自环境变量）
// ==========================================

use serde::{Deserialize, Serialize};

/// 超载阈值（利用率百分比，大于即超载）
pub const DEFAULT_OVERLOAD_THRESHOLD_PCT: f64 = 100.0;
/// 低负载阈值（利用率百分比，小于即低负载）
pub const DEFAULT_UNDERUTILIZED_THRESHOLD_PCT: f64 = 70.0;
pub const DEFAULT_HISTORY_PAGE_SIZE: u32 = 20;
pub const DEFAULT_ACTOR: &str = "system";

// ==========================================
// PlannerConfig
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub overload_threshold_pct: f64,
    pub underutilized_threshold_pct: f64,
    pub history_page_size: u32,
    /// 提交完成后是否立即重新拉取快照与分析
    pub auto_reload_after_apply: bool,
    /// 台账中记录的操作人
    pub actor: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            overload_threshold_pct: DEFAULT_OVERLOAD_THRESHOLD_PCT,
            underutilized_threshold_pct: DEFAULT_UNDERUTILIZED_THRESHOLD_PCT,
            history_page_size: DEFAULT_HISTORY_PAGE_SIZE,
            auto_reload_after_apply: true,
            actor: DEFAULT_ACTOR.to_string(),
        }
    }
}

// ==========================================
// ServiceConfig
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    /// 只对幂等查询生效；提交方案从不自动重试
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            api_key: None,
            timeout_ms: 30_000,
            max_retries: 3,
            initial_backoff_ms: 500,
        }
    }
}

impl ServiceConfig {
    /// 从环境变量读取，缺省项使用默认值
    ///
    /// # 环境变量
    /// - CAPACITY_API_URL
    /// - CAPACITY_API_KEY
    /// - CAPACITY_API_TIMEOUT_MS
    /// - CAPACITY_API_MAX_RETRIES
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取（便于测试）
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            base_url: non_empty("CAPACITY_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            api_key: non_empty("CAPACITY_API_KEY"),
            timeout_ms: non_empty("CAPACITY_API_TIMEOUT_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timeout_ms),
            max_retries: non_empty("CAPACITY_API_MAX_RETRIES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_retries),
            initial_backoff_ms: defaults.initial_backoff_ms,
        }
    }
}
