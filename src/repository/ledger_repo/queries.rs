use super::LedgerRepository;
use crate::domain::ledger::{LedgerEntry, MoveOutcome};
use crate::domain::plan::SubmissionPayload;
use crate::domain::types::ApplyStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Result as SqliteResult, Row};

// 原始行（JSON/时间字段在锁外解析）
struct LedgerRow {
    entry_id: String,
    team_id: String,
    sprint_id: Option<String>,
    applied_at: String,
    triggered_by: String,
    total_points_moved: f64,
    total_moves: i64,
    manual_override: bool,
    status: String,
    outcomes_json: Option<String>,
}

const SELECT_COLUMNS: &str = r#"
    SELECT entry_id, team_id, sprint_id, applied_at, triggered_by,
           total_points_moved, total_moves, manual_override, status,
           outcomes_json
    FROM rebalance_ledger
"#;

impl LedgerRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 entry_id 查询单条台账
    pub fn find_by_id(&self, entry_id: &str) -> RepositoryResult<Option<LedgerEntry>> {
        let row = {
            let conn = self.get_conn()?;
            let mut stmt = conn.prepare(&format!("{} WHERE entry_id = ?", SELECT_COLUMNS))?;
            stmt.query_row(params![entry_id], map_row).optional()?
        };
        row.map(into_entry).transpose()
    }

    /// 分页查询团队台账（新到旧）
    pub fn list_by_team(&self, team_id: &str, limit: u32, offset: u32) -> RepositoryResult<Vec<LedgerEntry>> {
        let rows = {
            let conn = self.get_conn()?;
            let mut stmt = conn.prepare(&format!(
                "{} WHERE team_id = ? ORDER BY applied_at DESC, rowid DESC LIMIT ? OFFSET ?",
                SELECT_COLUMNS
            ))?;
            let rows = stmt
                .query_map(params![team_id, limit, offset], map_row)?
                .collect::<SqliteResult<Vec<_>>>()?;
            rows
        };
        rows.into_iter().map(into_entry).collect()
    }

    /// 团队台账总数
    pub fn count_by_team(&self, team_id: &str) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM rebalance_ledger WHERE team_id = ?",
            params![team_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    /// 读取存档的提交负载
    pub fn find_payload(&self, entry_id: &str) -> RepositoryResult<Option<SubmissionPayload>> {
        let raw: Option<Option<String>> = {
            let conn = self.get_conn()?;
            conn.query_row(
                "SELECT payload_json FROM rebalance_ledger WHERE entry_id = ?",
                params![entry_id],
                |row| row.get(0),
            )
            .optional()?
        };
        match raw.flatten() {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

fn map_row(row: &Row) -> SqliteResult<LedgerRow> {
    Ok(LedgerRow {
        entry_id: row.get(0)?,
        team_id: row.get(1)?,
        sprint_id: row.get(2)?,
        applied_at: row.get(3)?,
        triggered_by: row.get(4)?,
        total_points_moved: row.get(5)?,
        total_moves: row.get(6)?,
        manual_override: row.get(7)?,
        status: row.get(8)?,
        outcomes_json: row.get(9)?,
    })
}

fn into_entry(row: LedgerRow) -> RepositoryResult<LedgerEntry> {
    let applied_at = DateTime::parse_from_rfc3339(&row.applied_at)
        .map_err(|e| RepositoryError::FieldValueError {
            field: "applied_at".to_string(),
            message: e.to_string(),
        })?
        .with_timezone(&Utc);

    let status = ApplyStatus::parse(&row.status).ok_or_else(|| RepositoryError::FieldValueError {
        field: "status".to_string(),
        message: format!("未知状态: {}", row.status),
    })?;

    let outcomes: Vec<MoveOutcome> = match row.outcomes_json {
        Some(json) => serde_json::from_str(&json)?,
        None => vec![],
    };

    Ok(LedgerEntry {
        entry_id: row.entry_id,
        team_id: row.team_id,
        sprint_id: row.sprint_id,
        applied_at,
        triggered_by: row.triggered_by,
        total_points_moved: row.total_points_moved,
        total_moves: row.total_moves.max(0) as usize,
        manual_override: row.manual_override,
        status,
        outcomes,
    })
}
