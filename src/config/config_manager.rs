// ==========================================
// 团队产能规划 - 配置管理器
// ==========================================
// 职责: 规划参数的加载、覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::planner_config::PlannerConfig;
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入配置（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有 global 配置
    pub fn get_all(&self) -> Result<HashMap<String, String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let mut stmt = conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map = HashMap::new();
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(config_map)
    }

    /// 组装规划参数（缺省或格式错误时回落到默认值）
    pub fn load_planner_config(&self) -> Result<PlannerConfig, Box<dyn Error>> {
        let defaults = PlannerConfig::default();

        let overload = self.get_config_or_default(
            config_keys::OVERLOAD_THRESHOLD_PCT,
            &defaults.overload_threshold_pct.to_string(),
        )?;
        let underutilized = self.get_config_or_default(
            config_keys::UNDERUTILIZED_THRESHOLD_PCT,
            &defaults.underutilized_threshold_pct.to_string(),
        )?;
        let page_size = self.get_config_or_default(
            config_keys::HISTORY_PAGE_SIZE,
            &defaults.history_page_size.to_string(),
        )?;
        let auto_reload = self.get_config_or_default(config_keys::AUTO_RELOAD_AFTER_APPLY, "true")?;
        let actor = self.get_config_or_default(config_keys::ACTOR, &defaults.actor)?;

        let parse_f64 = |key: &str, raw: &str, fallback: f64| {
            raw.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0).unwrap_or_else(|| {
                tracing::warn!(config_key = key, raw_value = %raw, "配置格式错误，使用默认值");
                fallback
            })
        };

        Ok(PlannerConfig {
            overload_threshold_pct: parse_f64(
                config_keys::OVERLOAD_THRESHOLD_PCT,
                &overload,
                defaults.overload_threshold_pct,
            ),
            underutilized_threshold_pct: parse_f64(
                config_keys::UNDERUTILIZED_THRESHOLD_PCT,
                &underutilized,
                defaults.underutilized_threshold_pct,
            ),
            history_page_size: page_size
                .parse::<u32>()
                .ok()
                .filter(|v| *v > 0)
                .unwrap_or(defaults.history_page_size),
            auto_reload_after_apply: is_true(&auto_reload),
            actor: if actor.trim().is_empty() { defaults.actor } else { actor },
        })
    }
}

fn is_true(v: &str) -> bool {
    matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "y" | "on")
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const OVERLOAD_THRESHOLD_PCT: &str = "overload_threshold_pct";
    pub const UNDERUTILIZED_THRESHOLD_PCT: &str = "underutilized_threshold_pct";
    pub const HISTORY_PAGE_SIZE: &str = "history_page_size";
    pub const AUTO_RELOAD_AFTER_APPLY: &str = "auto_reload_after_apply";
    pub const ACTOR: &str = "actor";
}
