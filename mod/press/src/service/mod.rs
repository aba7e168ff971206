pub mod schema;

pub mod approval;
pub mod daily;
pub mod entry;
pub mod report;
pub mod session;
pub mod stock;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use plyworks_core::{Actor, Clock};
use plyworks_sql::{Row, SQLError, SQLStore, SqlTx, Value};

use crate::error::PressError;
use crate::model::{ApprovalStatus, PressSession};
use crate::notify::Notifier;

/// Press service: session state machine, entry/pause ledgers, review
/// chain, and the stock ledger, over one SQL store.
pub struct PressService {
    pub(crate) db: Arc<dyn SQLStore>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) notifier: Arc<dyn Notifier>,
}

impl PressService {
    pub fn new(
        db: Arc<dyn SQLStore>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, PressError> {
        schema::init_schema(db.as_ref())?;
        Ok(Self {
            db,
            clock,
            notifier,
        })
    }

    /// Run `f` inside one write transaction, translating the abort dance:
    /// a domain error from `f` rolls everything back and surfaces as-is.
    ///
    /// The store serializes transactions on its connection lock, so a
    /// read-check-write sequence inside `f` cannot interleave with any
    /// other statement.
    pub(crate) fn run_tx<T>(
        &self,
        mut f: impl FnMut(&dyn SqlTx) -> Result<T, PressError>,
    ) -> Result<T, PressError> {
        let mut out: Option<T> = None;
        let mut fail: Option<PressError> = None;
        let res = self.db.with_tx(&mut |tx| match f(tx) {
            Ok(v) => {
                out = Some(v);
                Ok(())
            }
            Err(e) => {
                fail = Some(e);
                Err(SQLError::Aborted("press".into()))
            }
        });
        match res {
            Ok(()) => {
                out.ok_or_else(|| PressError::Internal("transaction returned no result".into()))
            }
            Err(SQLError::Aborted(_)) => {
                Err(fail.unwrap_or_else(|| PressError::Internal("transaction aborted".into())))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get a record by id outside a transaction, deserializing the JSON
    /// `data` column.
    pub(crate) fn fetch_doc<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
    ) -> Result<T, PressError> {
        let rows = self.db.query(
            &format!("SELECT data FROM {table} WHERE id = ?1"),
            &[Value::Text(id.to_string())],
        )?;
        let row = rows
            .first()
            .ok_or_else(|| PressError::NotFound(format!("{table}/{id}")))?;
        parse_data(row)
    }
}

// ---------------------------------------------------------------------------
// Document helpers: JSON `data` column plus indexed columns
// ---------------------------------------------------------------------------

/// Deserialize a record from a row's `data` JSON column.
pub(crate) fn parse_data<T: DeserializeOwned>(row: &Row) -> Result<T, PressError> {
    let json = row
        .get_str("data")
        .ok_or_else(|| PressError::Storage("missing data column".into()))?;
    serde_json::from_str(json).map_err(|e| PressError::Storage(format!("bad record json: {e}")))
}

pub(crate) fn parse_rows<T: DeserializeOwned>(rows: &[Row]) -> Result<Vec<T>, PressError> {
    rows.iter().map(parse_data).collect()
}

/// Insert a record as JSON into a table with indexed columns.
pub(crate) fn insert_doc_tx<T: Serialize>(
    tx: &dyn SqlTx,
    table: &str,
    id: &str,
    record: &T,
    indexes: &[(&str, Value)],
) -> Result<(), PressError> {
    let json =
        serde_json::to_string(record).map_err(|e| PressError::Internal(e.to_string()))?;

    let mut cols = vec!["id", "data"];
    let mut placeholders = vec!["?1".to_string(), "?2".to_string()];
    let mut params = vec![Value::Text(id.to_string()), Value::Text(json)];

    for (i, (col, val)) in indexes.iter().enumerate() {
        cols.push(col);
        placeholders.push(format!("?{}", i + 3));
        params.push(val.clone());
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        cols.join(", "),
        placeholders.join(", "),
    );

    tx.exec(&sql, &params).map_err(|e| {
        let msg = e.to_string();
        if msg.contains("UNIQUE constraint") {
            PressError::Conflict(msg)
        } else {
            PressError::Storage(msg)
        }
    })?;

    Ok(())
}

/// Update a record's JSON data and indexed columns. Returns affected rows.
pub(crate) fn update_doc_tx<T: Serialize>(
    tx: &dyn SqlTx,
    table: &str,
    id: &str,
    record: &T,
    indexes: &[(&str, Value)],
) -> Result<u64, PressError> {
    let (sql, params) = update_statement(table, id, record, indexes, None)?;
    Ok(tx.exec(&sql, &params)?)
}

/// Conditional update: only applies while the row's `approval_status`
/// column still holds `expected`. Returns false when the condition no
/// longer holds, meaning the caller lost a race.
pub(crate) fn update_doc_if_approval_tx<T: Serialize>(
    tx: &dyn SqlTx,
    table: &str,
    id: &str,
    record: &T,
    indexes: &[(&str, Value)],
    expected: ApprovalStatus,
) -> Result<bool, PressError> {
    let (sql, params) = update_statement(table, id, record, indexes, Some(expected))?;
    Ok(tx.exec(&sql, &params)? > 0)
}

fn update_statement<T: Serialize>(
    table: &str,
    id: &str,
    record: &T,
    indexes: &[(&str, Value)],
    expected_approval: Option<ApprovalStatus>,
) -> Result<(String, Vec<Value>), PressError> {
    let json =
        serde_json::to_string(record).map_err(|e| PressError::Internal(e.to_string()))?;

    let mut sets = vec!["data = ?1".to_string()];
    let mut params: Vec<Value> = vec![Value::Text(json)];

    for (i, (col, val)) in indexes.iter().enumerate() {
        sets.push(format!("{} = ?{}", col, i + 2));
        params.push(val.clone());
    }

    let id_idx = params.len() + 1;
    params.push(Value::Text(id.to_string()));

    let mut sql = format!(
        "UPDATE {} SET {} WHERE id = ?{}",
        table,
        sets.join(", "),
        id_idx,
    );

    if let Some(status) = expected_approval {
        sql.push_str(&format!(" AND approval_status = ?{}", id_idx + 1));
        params.push(Value::Text(status.as_str().to_string()));
    }

    Ok((sql, params))
}

/// Get a record by id inside a transaction.
pub(crate) fn get_doc_tx<T: DeserializeOwned>(
    tx: &dyn SqlTx,
    table: &str,
    id: &str,
) -> Result<T, PressError> {
    let rows = tx.query(
        &format!("SELECT data FROM {table} WHERE id = ?1"),
        &[Value::Text(id.to_string())],
    )?;
    let row = rows
        .first()
        .ok_or_else(|| PressError::NotFound(format!("{table}/{id}")))?;
    parse_data(row)
}

// ---------------------------------------------------------------------------
// Indexed-column extraction per entity
// ---------------------------------------------------------------------------

pub(crate) fn opt_text(v: &Option<String>) -> Value {
    match v {
        Some(s) => Value::Text(s.clone()),
        None => Value::Null,
    }
}

pub(crate) fn session_indexes(s: &PressSession) -> Vec<(&'static str, Value)> {
    vec![
        ("scope_id", Value::Text(s.scope_id.clone())),
        ("operator_id", Value::Text(s.operator_id.clone())),
        ("shift_date", Value::Text(s.shift_date.clone())),
        ("status", Value::Text(s.status.as_str().to_string())),
        (
            "approval_status",
            Value::Text(s.approval.status.as_str().to_string()),
        ),
        ("open_entry_id", opt_text(&s.open_entry_id)),
        ("open_pause_id", opt_text(&s.open_pause_id)),
        ("created_at", Value::Text(s.created_at.clone())),
    ]
}

pub(crate) fn entry_indexes(e: &crate::model::PressEntry) -> Vec<(&'static str, Value)> {
    vec![
        ("session_id", Value::Text(e.session_id.clone())),
        ("kind", Value::Text(e.kind.as_str().to_string())),
        ("load_time", Value::Text(e.load_time.clone())),
        ("unload_time", opt_text(&e.unload_time)),
        ("created_at", Value::Text(e.created_at.clone())),
    ]
}

pub(crate) fn glue_indexes(g: &crate::model::GlueEvent) -> Vec<(&'static str, Value)> {
    vec![
        ("session_id", Value::Text(g.session_id.clone())),
        ("time", Value::Text(g.time.clone())),
    ]
}

pub(crate) fn pause_indexes(p: &crate::model::PauseEvent) -> Vec<(&'static str, Value)> {
    vec![
        ("session_id", Value::Text(p.session_id.clone())),
        ("kind", Value::Text(p.kind.as_str().to_string())),
        ("start_time", Value::Text(p.start_time.clone())),
        ("end_time", opt_text(&p.end_time)),
    ]
}

pub(crate) fn daily_log_indexes(l: &crate::model::DailyLog) -> Vec<(&'static str, Value)> {
    vec![
        ("scope_id", Value::Text(l.scope_id.clone())),
        ("operator_id", Value::Text(l.operator_id.clone())),
        ("log_date", Value::Text(l.log_date.clone())),
        (
            "approval_status",
            Value::Text(l.approval.status.as_str().to_string()),
        ),
        ("created_at", Value::Text(l.created_at.clone())),
    ]
}

pub(crate) fn production_entry_indexes(
    p: &crate::model::ProductionEntry,
) -> Vec<(&'static str, Value)> {
    vec![
        ("scope_id", Value::Text(p.scope_id.clone())),
        ("operator_id", Value::Text(p.operator_id.clone())),
        ("entry_date", Value::Text(p.entry_date.clone())),
        ("daily_log_id", opt_text(&p.daily_log_id)),
        ("created_at", Value::Text(p.created_at.clone())),
    ]
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

/// Scope is checked first and fails as NotFound so that units of other
/// tenants are indistinguishable from nonexistent ones.
pub(crate) fn ensure_session_owner(
    actor: &Actor,
    session: &PressSession,
) -> Result<(), PressError> {
    if session.scope_id != actor.scope_id {
        return Err(PressError::NotFound(format!(
            "press_sessions/{}",
            session.id
        )));
    }
    if session.operator_id != actor.id {
        return Err(PressError::Unauthorized(format!(
            "session {} belongs to another operator",
            session.id
        )));
    }
    Ok(())
}

pub(crate) fn ensure_scope(actor: &Actor, scope_id: &str, what: &str) -> Result<(), PressError> {
    if scope_id != actor.scope_id {
        return Err(PressError::NotFound(what.to_string()));
    }
    Ok(())
}

/// Flag a broken stored invariant: logged loudly, never repaired.
pub(crate) fn corrupted(msg: String) -> PressError {
    tracing::error!(%msg, "ledger invariant violated");
    PressError::LedgerCorrupted(msg)
}

pub(crate) fn validate_date(s: &str) -> Result<(), PressError> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| PressError::Validation(format!("invalid date: {s} (expected YYYY-MM-DD)")))
}

// ---------------------------------------------------------------------------
// Test scaffolding shared by the service test modules
// ---------------------------------------------------------------------------
