use plyworks_sql::SQLStore;

use crate::error::PressError;

/// SQL DDL statements for the press module.
///
/// Document tables store the full JSON in a `data` TEXT column with
/// indexed columns extracted for filtering and conditional updates.
/// `stock_records` is fully column-mapped because its quantity column is
/// mutated by SQL arithmetic inside the approval transaction.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS press_sessions (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        scope_id TEXT NOT NULL,
        operator_id TEXT NOT NULL,
        shift_date TEXT NOT NULL,
        status TEXT NOT NULL,
        approval_status TEXT NOT NULL,
        open_entry_id TEXT,
        open_pause_id TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS press_entries (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        session_id TEXT NOT NULL,
        kind TEXT NOT NULL,
        load_time TEXT NOT NULL,
        unload_time TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS glue_events (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        session_id TEXT NOT NULL,
        time TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS pause_events (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        session_id TEXT NOT NULL,
        kind TEXT NOT NULL,
        start_time TEXT NOT NULL,
        end_time TEXT
    )",
    "CREATE TABLE IF NOT EXISTS daily_logs (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        scope_id TEXT NOT NULL,
        operator_id TEXT NOT NULL,
        log_date TEXT NOT NULL,
        approval_status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE(scope_id, operator_id, log_date)
    )",
    "CREATE TABLE IF NOT EXISTS production_entries (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        scope_id TEXT NOT NULL,
        operator_id TEXT NOT NULL,
        entry_date TEXT NOT NULL,
        daily_log_id TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS stock_records (
        id TEXT PRIMARY KEY,
        scope_id TEXT NOT NULL,
        category_id TEXT NOT NULL,
        thickness_id TEXT NOT NULL,
        size_id TEXT NOT NULL,
        opening_qty INTEGER NOT NULL DEFAULT 0,
        current_qty INTEGER NOT NULL DEFAULT 0,
        active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE(scope_id, category_id, thickness_id, size_id)
    )",
    // One open session per operator, enforced at the store. Operator ids
    // are only unique within a scope, so the key carries both columns.
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_session_operator_open
        ON press_sessions(scope_id, operator_id)
        WHERE status IN ('RUNNING','PAUSED','MAINTENANCE')",
    // Indexes
    "CREATE INDEX IF NOT EXISTS idx_session_scope_date ON press_sessions(scope_id, shift_date)",
    "CREATE INDEX IF NOT EXISTS idx_session_approval ON press_sessions(approval_status)",
    "CREATE INDEX IF NOT EXISTS idx_session_status ON press_sessions(status)",
    "CREATE INDEX IF NOT EXISTS idx_entry_session ON press_entries(session_id)",
    "CREATE INDEX IF NOT EXISTS idx_glue_session ON glue_events(session_id)",
    "CREATE INDEX IF NOT EXISTS idx_pause_session ON pause_events(session_id)",
    "CREATE INDEX IF NOT EXISTS idx_daily_approval ON daily_logs(approval_status)",
    "CREATE INDEX IF NOT EXISTS idx_daily_scope_date ON daily_logs(scope_id, log_date)",
    "CREATE INDEX IF NOT EXISTS idx_prod_scope_date ON production_entries(scope_id, entry_date)",
    "CREATE INDEX IF NOT EXISTS idx_prod_log ON production_entries(daily_log_id)",
];

pub fn init_schema(sql: &dyn SQLStore) -> Result<(), PressError> {
    for stmt in SCHEMA {
        sql.exec(stmt, &[])
            .map_err(|e| PressError::Storage(format!("schema init failed: {e}")))?;
    }
    Ok(())
}
