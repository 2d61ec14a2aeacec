// ==========================================
// 团队产能规划 - 再平衡台账数据仓储
// ==========================================
// 红线: 只追加；不提供更新/删除接口（表上另有触发器兜底）
// ==========================================

mod queries;

#[cfg(test)]
mod tests;

use crate::domain::ledger::LedgerEntry;
use crate::domain::plan::SubmissionPayload;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::SecondsFormat;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// LedgerRepository - 台账仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct LedgerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LedgerRepository {
    /// 创建新的台账仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 追加台账记录
    ///
    /// # 参数
    /// - `entry`: 台账记录
    /// - `payload`: 本次提交负载（可选，原样存档供审计）
    ///
    /// # 返回
    /// - `Ok(entry_id)`: 成功插入
    pub fn insert(&self, entry: &LedgerEntry, payload: Option<&SubmissionPayload>) -> RepositoryResult<String> {
        let outcomes_json = serde_json::to_string(&entry.outcomes)?;
        let payload_json = payload.map(serde_json::to_string).transpose()?;

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO rebalance_ledger (
                entry_id, team_id, sprint_id, applied_at, triggered_by,
                total_points_moved, total_moves, manual_override, status,
                outcomes_json, payload_json
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                entry.entry_id,
                entry.team_id,
                entry.sprint_id,
                entry.applied_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                entry.triggered_by,
                entry.total_points_moved,
                entry.total_moves as i64,
                entry.manual_override,
                entry.status.as_str(),
                outcomes_json,
                payload_json,
            ],
        )?;

        Ok(entry.entry_id.clone())
    }
}
