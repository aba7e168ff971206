//! Daily production logs: free-standing product/quantity entries rolled
//! up into one reviewable unit per operator-day.

use tracing::info;

use plyworks_core::{new_id, Actor, ListResult, Role};
use plyworks_sql::{SqlTx, Value};

use crate::error::PressError;
use crate::model::{
    ApprovalAction, ApprovalStatus, ApproveRequest, CreateProductionEntryRequest, DailyLog,
    DailyLogDetail, DailyLogListQuery, DayView, DayViewQuery, ProductionEntry, RejectRequest,
    SubmitDailyLogRequest,
};
use crate::notify::{Audience, Notification, NotificationKind, UnitRef};
use crate::service::approval::{aggregate_entries, next_approval_state};
use crate::service::{
    daily_log_indexes, ensure_scope, get_doc_tx, insert_doc_tx, parse_data, parse_rows,
    production_entry_indexes, update_doc_if_approval_tx, update_doc_tx, validate_date,
    PressService,
};

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

impl PressService {
    // -----------------------------------------------------------------------
    // Production entries
    // -----------------------------------------------------------------------

    /// Record one product/quantity line for the day. Stays unlinked until
    /// the day is submitted.
    pub fn add_production_entry(
        &self,
        actor: &Actor,
        req: &CreateProductionEntryRequest,
    ) -> Result<ProductionEntry, PressError> {
        if actor.role != Role::Operator {
            return Err(PressError::Unauthorized(format!(
                "role {} cannot record production entries",
                actor.role.as_str()
            )));
        }
        if req.quantity <= 0 {
            return Err(PressError::Validation("quantity must be positive".into()));
        }
        let key = req.key();
        if key.category_id.is_empty() || key.thickness_id.is_empty() || key.size_id.is_empty() {
            return Err(PressError::Validation(
                "product descriptor must be fully specified".into(),
            ));
        }
        let date = match &req.entry_date {
            Some(d) => {
                validate_date(d)?;
                d.clone()
            }
            None => self.clock.today(),
        };

        let now = self.clock.now_rfc3339();
        let entry = ProductionEntry {
            id: new_id(),
            scope_id: actor.scope_id.clone(),
            operator_id: actor.id.clone(),
            entry_date: date.clone(),
            product: key.clone(),
            quantity: req.quantity,
            note: req.note.clone(),
            daily_log_id: None,
            created_at: now,
        };

        self.run_tx(|tx| {
            if let Some(log) = find_log_tx(tx, &actor.scope_id, &actor.id, &date)? {
                if !log.approval.status.is_editable() {
                    return Err(PressError::InvalidApprovalState {
                        action: "addEntry",
                        status: log.approval.status.to_string(),
                    });
                }
            }
            if !self.product_is_active_tx(tx, &actor.scope_id, &key)? {
                return Err(PressError::UnknownProduct(key.label()));
            }
            insert_doc_tx(
                tx,
                "production_entries",
                &entry.id,
                &entry,
                &production_entry_indexes(&entry),
            )?;
            Ok(entry.clone())
        })
    }

    /// Remove an entry. Linked entries go only while the day's log is
    /// editable (rejected).
    pub fn delete_production_entry(
        &self,
        actor: &Actor,
        entry_id: &str,
    ) -> Result<(), PressError> {
        self.run_tx(|tx| {
            let entry: ProductionEntry = get_doc_tx(tx, "production_entries", entry_id)?;
            ensure_scope(actor, &entry.scope_id, &format!("production_entries/{entry_id}"))?;
            if entry.operator_id != actor.id {
                return Err(PressError::Unauthorized(format!(
                    "entry {entry_id} belongs to another operator"
                )));
            }
            if let Some(ref log_id) = entry.daily_log_id {
                let log: DailyLog = get_doc_tx(tx, "daily_logs", log_id)?;
                if !log.approval.status.is_editable() {
                    return Err(PressError::InvalidApprovalState {
                        action: "removeEntry",
                        status: log.approval.status.to_string(),
                    });
                }
            }
            tx.exec(
                "DELETE FROM production_entries WHERE id = ?1",
                &[Value::Text(entry_id.to_string())],
            )?;
            Ok(())
        })
    }

    // -----------------------------------------------------------------------
    // Daily-log review chain
    // -----------------------------------------------------------------------

    /// Submit the operator's day. Creates or reuses the (operator, date)
    /// log and links the day's unlinked entries to it, all in one
    /// transaction. A day with no entries cannot be submitted.
    pub fn submit_daily_log(
        &self,
        actor: &Actor,
        req: &SubmitDailyLogRequest,
    ) -> Result<DailyLogDetail, PressError> {
        let date = match &req.date {
            Some(d) => {
                validate_date(d)?;
                d.clone()
            }
            None => self.clock.today(),
        };
        let now = self.clock.now_rfc3339();

        let detail = self.run_tx(|tx| {
            let existing = find_log_tx(tx, &actor.scope_id, &actor.id, &date)?;
            let is_new = existing.is_none();
            let mut log = match existing {
                Some(log) => log,
                None => DailyLog {
                    id: new_id(),
                    scope_id: actor.scope_id.clone(),
                    operator_id: actor.id.clone(),
                    log_date: date.clone(),
                    note: None,
                    approval: Default::default(),
                    created_at: now.clone(),
                    updated_at: now.clone(),
                },
            };
            let prev = log.approval.status;
            log.approval =
                next_approval_state(&log.approval, ApprovalAction::Submit, actor, None, &now)?;
            if req.note.is_some() {
                log.note = req.note.clone();
            }
            log.updated_at = now.clone();

            // link the day's unlinked entries
            let unlinked: Vec<ProductionEntry> = parse_rows(&tx.query(
                "SELECT data FROM production_entries WHERE scope_id = ?1 \
                 AND operator_id = ?2 AND entry_date = ?3 AND daily_log_id IS NULL",
                &[
                    Value::Text(actor.scope_id.clone()),
                    Value::Text(actor.id.clone()),
                    Value::Text(date.clone()),
                ],
            )?)?;
            for mut entry in unlinked {
                entry.daily_log_id = Some(log.id.clone());
                update_doc_tx(
                    tx,
                    "production_entries",
                    &entry.id,
                    &entry,
                    &production_entry_indexes(&entry),
                )?;
            }

            let entries = linked_entries_tx(tx, &log.id)?;
            if entries.is_empty() {
                return Err(PressError::Validation(format!(
                    "no production entries recorded for {date}"
                )));
            }

            if is_new {
                insert_doc_tx(tx, "daily_logs", &log.id, &log, &daily_log_indexes(&log))?;
            } else if !update_doc_if_approval_tx(
                tx,
                "daily_logs",
                &log.id,
                &log,
                &daily_log_indexes(&log),
                prev,
            )? {
                return Err(PressError::InvalidApprovalState {
                    action: "submit",
                    status: prev.to_string(),
                });
            }
            Ok(DailyLogDetail { log, entries })
        })?;

        self.notifier.notify(Notification {
            kind: NotificationKind::Submitted,
            scope_id: detail.log.scope_id.clone(),
            audience: Audience::Role(Role::Supervisor),
            unit: UnitRef::DailyLog(detail.log.id.clone()),
            title: "daily log submitted".into(),
            body: format!(
                "daily log {} by {} awaits supervisor review",
                detail.log.log_date, detail.log.operator_id
            ),
        });
        info!(
            log = %detail.log.id,
            date = %detail.log.log_date,
            entries = detail.entries.len(),
            "daily log submitted"
        );
        Ok(detail)
    }

    /// First-stage approval.
    pub fn supervisor_approve_daily(
        &self,
        actor: &Actor,
        log_id: &str,
        req: &ApproveRequest,
    ) -> Result<DailyLog, PressError> {
        let updated = self.advance_daily_review(
            actor,
            log_id,
            ApprovalAction::SupervisorApprove,
            req.note.clone(),
        )?;
        self.notifier.notify(Notification {
            kind: NotificationKind::SupervisorApproved,
            scope_id: updated.scope_id.clone(),
            audience: Audience::Role(Role::Manager),
            unit: UnitRef::DailyLog(updated.id.clone()),
            title: "daily log supervisor-approved".into(),
            body: format!("daily log {} awaits manager review", updated.log_date),
        });
        Ok(updated)
    }

    /// Send a daily log back to its operator. The note is mandatory.
    pub fn reject_daily(
        &self,
        actor: &Actor,
        log_id: &str,
        req: &RejectRequest,
    ) -> Result<DailyLog, PressError> {
        if req.note.trim().is_empty() {
            return Err(PressError::Validation("rejection note required".into()));
        }
        let updated = self.advance_daily_review(
            actor,
            log_id,
            ApprovalAction::Reject,
            Some(req.note.clone()),
        )?;
        self.notifier.notify(Notification {
            kind: NotificationKind::Rejected,
            scope_id: updated.scope_id.clone(),
            audience: Audience::User(updated.operator_id.clone()),
            unit: UnitRef::DailyLog(updated.id.clone()),
            title: "daily log rejected".into(),
            body: req.note.clone(),
        });
        Ok(updated)
    }

    /// Final approval: aggregate the log's linked entries and apply the
    /// stock increments in the status-moving transaction.
    pub fn manager_approve_daily(
        &self,
        actor: &Actor,
        log_id: &str,
        req: &ApproveRequest,
    ) -> Result<DailyLog, PressError> {
        let now = self.clock.now_rfc3339();
        let updated = self.run_tx(|tx| {
            let mut log: DailyLog = get_doc_tx(tx, "daily_logs", log_id)?;
            ensure_scope(actor, &log.scope_id, &format!("daily_logs/{log_id}"))?;
            let prev = log.approval.status;
            log.approval = next_approval_state(
                &log.approval,
                ApprovalAction::ManagerApprove,
                actor,
                req.note.clone(),
                &now,
            )?;

            let entries = linked_entries_tx(tx, &log.id)?;
            let totals = aggregate_entries(&entries);
            super::stock::apply_production_tx(tx, &log.scope_id, &totals, &now)?;

            log.updated_at = now.clone();
            if !update_doc_if_approval_tx(
                tx,
                "daily_logs",
                &log.id,
                &log,
                &daily_log_indexes(&log),
                prev,
            )? {
                return Err(PressError::InvalidApprovalState {
                    action: "managerApprove",
                    status: prev.to_string(),
                });
            }
            Ok(log)
        })?;

        self.notifier.notify(Notification {
            kind: NotificationKind::ManagerApproved,
            scope_id: updated.scope_id.clone(),
            audience: Audience::User(updated.operator_id.clone()),
            unit: UnitRef::DailyLog(updated.id.clone()),
            title: "daily log approved".into(),
            body: format!("daily log {} is fully approved", updated.log_date),
        });
        info!(log = %updated.id, "daily log manager-approved, stock applied");
        Ok(updated)
    }

    fn advance_daily_review(
        &self,
        actor: &Actor,
        log_id: &str,
        action: ApprovalAction,
        note: Option<String>,
    ) -> Result<DailyLog, PressError> {
        let now = self.clock.now_rfc3339();
        self.run_tx(|tx| {
            let mut log: DailyLog = get_doc_tx(tx, "daily_logs", log_id)?;
            ensure_scope(actor, &log.scope_id, &format!("daily_logs/{log_id}"))?;
            let prev = log.approval.status;
            log.approval = next_approval_state(&log.approval, action, actor, note.clone(), &now)?;
            log.updated_at = now.clone();
            if !update_doc_if_approval_tx(
                tx,
                "daily_logs",
                &log.id,
                &log,
                &daily_log_indexes(&log),
                prev,
            )? {
                return Err(PressError::InvalidApprovalState {
                    action: action.as_str(),
                    status: prev.to_string(),
                });
            }
            Ok(log)
        })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The operator's day: entries recorded for the date plus the log
    /// status if the day was submitted.
    pub fn day_view(&self, actor: &Actor, query: &DayViewQuery) -> Result<DayView, PressError> {
        if actor.role != Role::Operator {
            return Err(PressError::Unauthorized(format!(
                "role {} has no production day view",
                actor.role.as_str()
            )));
        }
        let date = match &query.date {
            Some(d) => {
                validate_date(d)?;
                d.clone()
            }
            None => self.clock.today(),
        };

        let log = self
            .db
            .query(
                "SELECT data FROM daily_logs WHERE scope_id = ?1 \
                 AND operator_id = ?2 AND log_date = ?3",
                &[
                    Value::Text(actor.scope_id.clone()),
                    Value::Text(actor.id.clone()),
                    Value::Text(date.clone()),
                ],
            )?
            .first()
            .map(parse_data)
            .transpose()?;
        let entries = parse_rows(&self.db.query(
            "SELECT data FROM production_entries WHERE scope_id = ?1 \
             AND operator_id = ?2 AND entry_date = ?3 ORDER BY created_at ASC",
            &[
                Value::Text(actor.scope_id.clone()),
                Value::Text(actor.id.clone()),
                Value::Text(date.clone()),
            ],
        )?)?;

        Ok(DayView { date, log, entries })
    }

    /// A log with its linked entries.
    pub fn daily_log_detail(
        &self,
        actor: &Actor,
        log_id: &str,
    ) -> Result<DailyLogDetail, PressError> {
        let log: DailyLog = self.fetch_doc("daily_logs", log_id)?;
        ensure_scope(actor, &log.scope_id, &format!("daily_logs/{log_id}"))?;
        if actor.role == Role::Operator && log.operator_id != actor.id {
            return Err(PressError::Unauthorized(format!(
                "daily log {log_id} belongs to another operator"
            )));
        }
        let entries = parse_rows(&self.db.query(
            "SELECT data FROM production_entries WHERE daily_log_id = ?1 \
             ORDER BY created_at ASC",
            &[Value::Text(log.id.clone())],
        )?)?;
        Ok(DailyLogDetail { log, entries })
    }

    /// Daily logs of the scope, filtered and paginated. Operators are
    /// pinned to their own logs.
    pub fn list_daily_logs(
        &self,
        actor: &Actor,
        query: &DailyLogListQuery,
    ) -> Result<ListResult<DailyLog>, PressError> {
        let mut where_clauses = vec!["scope_id = ?1".to_string()];
        let mut params = vec![Value::Text(actor.scope_id.clone())];
        let mut idx = 2;

        let operator_filter = if actor.role == Role::Operator {
            Some(actor.id.clone())
        } else {
            query.operator_id.clone()
        };
        if let Some(op) = operator_filter {
            where_clauses.push(format!("operator_id = ?{idx}"));
            params.push(Value::Text(op));
            idx += 1;
        }
        if let Some(ref from) = query.from {
            validate_date(from)?;
            where_clauses.push(format!("log_date >= ?{idx}"));
            params.push(Value::Text(from.clone()));
            idx += 1;
        }
        if let Some(ref to) = query.to {
            validate_date(to)?;
            where_clauses.push(format!("log_date <= ?{idx}"));
            params.push(Value::Text(to.clone()));
            idx += 1;
        }
        if let Some(ref approval) = query.approval {
            let status = ApprovalStatus::from_str(approval).ok_or_else(|| {
                PressError::Validation(format!("unknown approval status: {approval}"))
            })?;
            where_clauses.push(format!("approval_status = ?{idx}"));
            params.push(Value::Text(status.as_str().to_string()));
            idx += 1;
        }

        let where_sql = where_clauses.join(" AND ");

        let count_rows = self.db.query(
            &format!("SELECT COUNT(*) as cnt FROM daily_logs WHERE {where_sql}"),
            &params,
        )?;
        let total = count_rows
            .first()
            .and_then(|r| r.get_i64("cnt"))
            .unwrap_or(0) as usize;

        let page_size = query
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let page = query.page.unwrap_or(1).max(1);
        let mut select_params = params;
        select_params.push(Value::Integer(page_size as i64));
        select_params.push(Value::Integer(((page - 1) * page_size) as i64));

        let rows = self.db.query(
            &format!(
                "SELECT data FROM daily_logs WHERE {where_sql} \
                 ORDER BY log_date DESC, created_at DESC LIMIT ?{idx} OFFSET ?{}",
                idx + 1
            ),
            &select_params,
        )?;

        Ok(ListResult {
            items: parse_rows(&rows)?,
            total,
        })
    }
}

fn find_log_tx(
    tx: &dyn SqlTx,
    scope_id: &str,
    operator_id: &str,
    date: &str,
) -> Result<Option<DailyLog>, PressError> {
    tx.query(
        "SELECT data FROM daily_logs WHERE scope_id = ?1 \
         AND operator_id = ?2 AND log_date = ?3",
        &[
            Value::Text(scope_id.to_string()),
            Value::Text(operator_id.to_string()),
            Value::Text(date.to_string()),
        ],
    )?
    .first()
    .map(parse_data)
    .transpose()
}

fn linked_entries_tx(tx: &dyn SqlTx, log_id: &str) -> Result<Vec<ProductionEntry>, PressError> {
    parse_rows(&tx.query(
        "SELECT data FROM production_entries WHERE daily_log_id = ?1 \
         ORDER BY created_at ASC",
        &[Value::Text(log_id.to_string())],
    )?)
}
