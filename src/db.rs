// ==========================================
// 团队产能规划 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 本地库只存两类数据：配置覆写（config_kv）与再平衡台账（rebalance_ledger）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）
///
/// rebalance_ledger 通过触发器拒绝 UPDATE/DELETE，保证台账只追加
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS rebalance_ledger (
            entry_id TEXT PRIMARY KEY,
            team_id TEXT NOT NULL,
            sprint_id TEXT,
            applied_at TEXT NOT NULL,
            triggered_by TEXT NOT NULL,
            total_points_moved REAL NOT NULL,
            total_moves INTEGER NOT NULL,
            manual_override INTEGER NOT NULL,
            status TEXT NOT NULL,
            outcomes_json TEXT,
            payload_json TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_rebalance_ledger_team_ts
            ON rebalance_ledger (team_id, applied_at DESC);

        CREATE TRIGGER IF NOT EXISTS trg_rebalance_ledger_no_update
            BEFORE UPDATE ON rebalance_ledger
            BEGIN
                SELECT RAISE(ABORT, 'rebalance_ledger is append-only');
            END;

        CREATE TRIGGER IF NOT EXISTS trg_rebalance_ledger_no_delete
            BEFORE DELETE ON rebalance_ledger
            BEGIN
                SELECT RAISE(ABORT, 'rebalance_ledger is append-only');
            END;
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
