//! Derived session reports. Everything here is computed from the ledgers
//! on demand; nothing is stored.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};

use plyworks_core::Actor;

use crate::error::PressError;
use crate::model::{
    EntryKind, EntryReport, PauseKind, ProductTotal, SessionReport,
};
use crate::service::{corrupted, PressService};

impl PressService {
    /// Timings, totals, and consumption for one session.
    pub fn session_report(
        &self,
        actor: &Actor,
        session_id: &str,
    ) -> Result<SessionReport, PressError> {
        let detail = self.session_detail(actor, session_id)?;

        let open_count = detail.entries.iter().filter(|e| e.is_open()).count();
        if open_count > 1 {
            return Err(corrupted(format!(
                "session {} has {} open entries",
                detail.session.id, open_count
            )));
        }

        // Running totals accumulate completed COOK per (thickness, size).
        let mut running: BTreeMap<(String, String), i64> = BTreeMap::new();
        let mut entries = Vec::with_capacity(detail.entries.len());
        let mut prev_unload: Option<String> = None;
        let mut cook_count = 0;
        let mut repress_count = 0;

        for entry in &detail.entries {
            match entry.kind {
                EntryKind::Cook => cook_count += 1,
                EntryKind::Repress => repress_count += 1,
            }

            let cook_secs = match &entry.unload_time {
                Some(unload) => Some(secs_between(&entry.load_time, unload)?),
                None => None,
            };
            let cooling_gap_secs = match &prev_unload {
                Some(prev) => Some(secs_between(prev, &entry.load_time)?),
                None => None,
            };
            let running_total = if entry.kind == EntryKind::Cook && !entry.is_open() {
                let slot = running
                    .entry((entry.product.thickness_id.clone(), entry.product.size_id.clone()))
                    .or_insert(0);
                *slot += entry.quantity;
                Some(*slot)
            } else {
                None
            };

            prev_unload = entry.unload_time.clone();
            entries.push(EntryReport {
                entry: entry.clone(),
                cook_secs,
                cooling_gap_secs,
                running_total,
            });
        }

        let totals = running
            .into_iter()
            .map(|((thickness_id, size_id), quantity)| ProductTotal {
                thickness_id,
                size_id,
                quantity,
            })
            .collect();

        let glue_barrels = detail.glue_events.iter().map(|g| g.barrels).sum();

        let now = self.clock.now_rfc3339();
        let mut pause_secs = 0;
        let mut maintenance_secs = 0;
        for pause in &detail.pauses {
            let end = pause.end_time.as_deref().unwrap_or(&now);
            let secs = secs_between(&pause.start_time, end)?;
            match pause.kind {
                PauseKind::Pause => pause_secs += secs,
                PauseKind::Maintenance => maintenance_secs += secs,
            }
        }

        Ok(SessionReport {
            session: detail.session,
            entries,
            totals,
            glue_barrels,
            pause_secs,
            maintenance_secs,
            cook_count,
            repress_count,
        })
    }
}

fn parse_ts(s: &str) -> Result<DateTime<FixedOffset>, PressError> {
    DateTime::parse_from_rfc3339(s)
        .map_err(|_| corrupted(format!("unparseable timestamp in ledger: {s}")))
}

fn secs_between(from: &str, to: &str) -> Result<i64, PressError> {
    Ok((parse_ts(to)? - parse_ts(from)?).num_seconds())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        GlueRequest, LoadRequest, PauseRequest, SelectProductRequest, StartSessionRequest,
        UnloadRequest,
    };
    use crate::service::testutil::{operator, packing_4mm, seed_product, supervisor, test_service};

    #[test]
    fn report_computes_timings_and_totals() {
        let (svc, clock, _) = test_service();
        let op = operator("op1");
        seed_product(&svc, &packing_4mm(), 0);

        let s = svc.start_session(&op, &StartSessionRequest::default()).unwrap();
        svc.select_product(
            &op,
            &s.id,
            &SelectProductRequest {
                category_id: "packing".into(),
                thickness_id: "4mm".into(),
                size_id: "8x4".into(),
            },
        )
        .unwrap();
        svc.add_glue(&op, &s.id, &GlueRequest { barrels: 2 }).unwrap();

        // first cook: 30 min in the press
        let e1 = svc.load(&op, &s.id, &LoadRequest::default()).unwrap();
        clock.advance_secs(1800);
        svc.unload(&op, &e1.id, &UnloadRequest::default()).unwrap();

        // 5 min cooling gap, then a short cook unloaded at 8
        clock.advance_secs(300);
        let e2 = svc.load(&op, &s.id, &LoadRequest::default()).unwrap();
        clock.advance_secs(1200);
        svc.unload(&op, &e2.id, &UnloadRequest { quantity: Some(8) })
            .unwrap();

        // a repress pass
        let e3 = svc
            .load(
                &op,
                &s.id,
                &LoadRequest {
                    kind: EntryKind::Repress,
                },
            )
            .unwrap();
        clock.advance_secs(600);
        svc.unload(&op, &e3.id, &UnloadRequest::default()).unwrap();

        // 10 min pause
        svc.pause_session(&op, &s.id, PauseKind::Pause, &PauseRequest::default())
            .unwrap();
        clock.advance_secs(600);
        svc.resume_session(&op, &s.id).unwrap();
        svc.stop_session(&op, &s.id).unwrap();

        let report = svc.session_report(&op, &s.id).unwrap();
        assert_eq!(report.entries.len(), 3);

        assert_eq!(report.entries[0].cook_secs, Some(1800));
        assert_eq!(report.entries[0].cooling_gap_secs, None);
        assert_eq!(report.entries[0].running_total, Some(10));

        assert_eq!(report.entries[1].cook_secs, Some(1200));
        assert_eq!(report.entries[1].cooling_gap_secs, Some(300));
        assert_eq!(report.entries[1].running_total, Some(18));

        // repress: counted, never totalled
        assert_eq!(report.entries[2].running_total, None);
        assert_eq!(report.entries[2].cooling_gap_secs, Some(0));

        assert_eq!(report.totals.len(), 1);
        assert_eq!(report.totals[0].thickness_id, "4mm");
        assert_eq!(report.totals[0].quantity, 18);

        assert_eq!(report.glue_barrels, 2);
        assert_eq!(report.pause_secs, 600);
        assert_eq!(report.maintenance_secs, 0);
        assert_eq!(report.cook_count, 2);
        assert_eq!(report.repress_count, 1);
    }

    #[test]
    fn open_entry_has_no_cook_time_or_total() {
        let (svc, clock, _) = test_service();
        let op = operator("op1");
        seed_product(&svc, &packing_4mm(), 0);

        let s = svc.start_session(&op, &StartSessionRequest::default()).unwrap();
        svc.select_product(
            &op,
            &s.id,
            &SelectProductRequest {
                category_id: "packing".into(),
                thickness_id: "4mm".into(),
                size_id: "8x4".into(),
            },
        )
        .unwrap();
        svc.load(&op, &s.id, &LoadRequest::default()).unwrap();
        clock.advance_secs(60);

        let report = svc.session_report(&op, &s.id).unwrap();
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].cook_secs, None);
        assert_eq!(report.entries[0].running_total, None);
        assert!(report.totals.is_empty());
        assert_eq!(report.cook_count, 1);
    }

    #[test]
    fn open_pause_accrues_to_now() {
        let (svc, clock, _) = test_service();
        let op = operator("op1");
        let s = svc.start_session(&op, &StartSessionRequest::default()).unwrap();
        svc.pause_session(&op, &s.id, PauseKind::Maintenance, &PauseRequest::default())
            .unwrap();
        clock.advance_secs(240);

        let report = svc.session_report(&op, &s.id).unwrap();
        assert_eq!(report.maintenance_secs, 240);
        assert_eq!(report.pause_secs, 0);
    }

    #[test]
    fn supervisor_can_pull_any_report_in_scope() {
        let (svc, _clock, _) = test_service();
        let op = operator("op1");
        let s = svc.start_session(&op, &StartSessionRequest::default()).unwrap();
        svc.stop_session(&op, &s.id).unwrap();

        svc.session_report(&supervisor("sup1"), &s.id).unwrap();
        let err = svc.session_report(&operator("op2"), &s.id).unwrap_err();
        assert!(matches!(err, PressError::Unauthorized(_)));
    }
}
