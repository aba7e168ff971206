//! Entry ledger: load, unload, and post-hoc correction.

use tracing::info;

use plyworks_core::{new_id, Actor};

use crate::error::PressError;
use crate::model::{
    ApprovalStatus, CorrectEntryRequest, LoadRequest, PressEntry, PressSession, SessionStatus,
    UnloadRequest,
};
use crate::service::{
    corrupted, ensure_session_owner, entry_indexes, get_doc_tx, insert_doc_tx, session_indexes,
    update_doc_tx, PressService,
};

impl PressService {
    /// Load material into the press, opening a new entry. Requires a
    /// RUNNING session with a selected product and no open entry.
    pub fn load(
        &self,
        actor: &Actor,
        session_id: &str,
        req: &LoadRequest,
    ) -> Result<PressEntry, PressError> {
        let now = self.clock.now_rfc3339();
        let kind = req.kind;
        let entry = self.run_tx(|tx| {
            let mut s: PressSession = get_doc_tx(tx, "press_sessions", session_id)?;
            ensure_session_owner(actor, &s)?;
            if s.status != SessionStatus::Running {
                return Err(PressError::InvalidTransition {
                    action: "load",
                    status: s.status.to_string(),
                });
            }
            let product = s.product.clone().ok_or(PressError::ProductNotSelected)?;
            if s.open_entry_id.is_some() {
                return Err(PressError::EntryAlreadyOpen(s.id.clone()));
            }

            let entry = PressEntry {
                id: new_id(),
                session_id: s.id.clone(),
                kind,
                product,
                quantity: s.daylights,
                load_time: now.clone(),
                unload_time: None,
                created_at: now.clone(),
                updated_at: now.clone(),
            };
            insert_doc_tx(tx, "press_entries", &entry.id, &entry, &entry_indexes(&entry))?;

            s.open_entry_id = Some(entry.id.clone());
            s.updated_at = now.clone();
            update_doc_tx(tx, "press_sessions", &s.id, &s, &session_indexes(&s))?;
            Ok(entry)
        })?;

        info!(
            session = %entry.session_id,
            entry = %entry.id,
            kind = %entry.kind,
            quantity = entry.quantity,
            "material loaded"
        );
        Ok(entry)
    }

    /// Unload the press, closing the entry. Has no session-status
    /// precondition so an entry left dangling by a stop can still be
    /// closed afterwards.
    pub fn unload(
        &self,
        actor: &Actor,
        entry_id: &str,
        req: &UnloadRequest,
    ) -> Result<PressEntry, PressError> {
        if let Some(q) = req.quantity {
            if q <= 0 {
                return Err(PressError::Validation("quantity must be positive".into()));
            }
        }
        let now = self.clock.now_rfc3339();
        let entry = self.run_tx(|tx| {
            let mut entry: PressEntry = get_doc_tx(tx, "press_entries", entry_id)?;
            let mut s: PressSession = get_doc_tx(tx, "press_sessions", &entry.session_id)?;
            ensure_session_owner(actor, &s)?;
            if entry.unload_time.is_some() {
                return Err(PressError::EntryNotOpen(entry.id.clone()));
            }

            if let Some(q) = req.quantity {
                entry.quantity = q;
            }
            entry.unload_time = Some(now.clone());
            entry.updated_at = now.clone();
            update_doc_tx(tx, "press_entries", &entry.id, &entry, &entry_indexes(&entry))?;

            match s.open_entry_id.as_deref() {
                Some(open) if open == entry.id => {
                    s.open_entry_id = None;
                    s.updated_at = now.clone();
                    update_doc_tx(tx, "press_sessions", &s.id, &s, &session_indexes(&s))?;
                }
                Some(_) => {
                    return Err(corrupted(format!(
                        "session {} open entry ref does not match entry {}",
                        s.id, entry.id
                    )));
                }
                // stop left the entry dangling; closing it is the recovery
                None => {}
            }
            Ok(entry)
        })?;

        info!(
            session = %entry.session_id,
            entry = %entry.id,
            quantity = entry.quantity,
            "material unloaded"
        );
        Ok(entry)
    }

    /// Correct a recorded entry's quantity or product. Allowed until the
    /// owning session is manager-approved.
    pub fn correct_entry(
        &self,
        actor: &Actor,
        entry_id: &str,
        req: &CorrectEntryRequest,
    ) -> Result<PressEntry, PressError> {
        if req.quantity.is_none() && req.product.is_none() {
            return Err(PressError::Validation("nothing to correct".into()));
        }
        if let Some(q) = req.quantity {
            if q <= 0 {
                return Err(PressError::Validation("quantity must be positive".into()));
            }
        }
        let now = self.clock.now_rfc3339();
        let entry = self.run_tx(|tx| {
            let mut entry: PressEntry = get_doc_tx(tx, "press_entries", entry_id)?;
            let s: PressSession = get_doc_tx(tx, "press_sessions", &entry.session_id)?;
            ensure_session_owner(actor, &s)?;
            if s.approval.status == ApprovalStatus::ManagerApproved {
                return Err(PressError::InvalidApprovalState {
                    action: "correctEntry",
                    status: s.approval.status.to_string(),
                });
            }
            if let Some(ref key) = req.product {
                if !self.product_is_active_tx(tx, &s.scope_id, key)? {
                    return Err(PressError::UnknownProduct(key.label()));
                }
                entry.product = key.clone();
            }
            if let Some(q) = req.quantity {
                entry.quantity = q;
            }
            entry.updated_at = now.clone();
            update_doc_tx(tx, "press_entries", &entry.id, &entry, &entry_indexes(&entry))?;
            Ok(entry)
        })?;

        info!(entry = %entry.id, "entry corrected");
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        EntryKind, PauseKind, PauseRequest, ProductKey, SelectProductRequest, StartSessionRequest,
    };
    use crate::service::testutil::{operator, packing_4mm, seed_product, test_service};

    fn running_session(
        svc: &PressService,
        op: &plyworks_core::Actor,
    ) -> crate::model::PressSession {
        seed_product(svc, &packing_4mm(), 0);
        let s = svc.start_session(op, &StartSessionRequest::default()).unwrap();
        svc.select_product(
            op,
            &s.id,
            &SelectProductRequest {
                category_id: "packing".into(),
                thickness_id: "4mm".into(),
                size_id: "8x4".into(),
            },
        )
        .unwrap()
    }

    #[test]
    fn load_unload_cycle() {
        let (svc, clock, _) = test_service();
        let op = operator("op1");
        let s = running_session(&svc, &op);

        let entry = svc.load(&op, &s.id, &LoadRequest::default()).unwrap();
        assert_eq!(entry.kind, EntryKind::Cook);
        assert_eq!(entry.quantity, 10);
        assert!(entry.is_open());

        // second load while one is open
        let err = svc.load(&op, &s.id, &LoadRequest::default()).unwrap_err();
        assert!(matches!(err, PressError::EntryAlreadyOpen(_)));

        clock.advance_secs(1800);
        let entry = svc.unload(&op, &entry.id, &UnloadRequest::default()).unwrap();
        assert!(!entry.is_open());
        assert_eq!(entry.quantity, 10);

        let detail = svc.session_detail(&op, &s.id).unwrap();
        assert!(detail.session.open_entry_id.is_none());

        // unload again
        let err = svc
            .unload(&op, &entry.id, &UnloadRequest::default())
            .unwrap_err();
        assert!(matches!(err, PressError::EntryNotOpen(_)));
    }

    #[test]
    fn load_requires_running_and_product() {
        let (svc, _clock, _) = test_service();
        let op = operator("op1");
        let s = svc.start_session(&op, &StartSessionRequest::default()).unwrap();

        let err = svc.load(&op, &s.id, &LoadRequest::default()).unwrap_err();
        assert!(matches!(err, PressError::ProductNotSelected));

        seed_product(&svc, &packing_4mm(), 0);
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
        svc.pause_session(&op, &s.id, PauseKind::Pause, &PauseRequest::default())
            .unwrap();
        let err = svc.load(&op, &s.id, &LoadRequest::default()).unwrap_err();
        assert!(matches!(
            err,
            PressError::InvalidTransition {
                action: "load",
                ..
            }
        ));
    }

    #[test]
    fn unload_quantity_override() {
        let (svc, _clock, _) = test_service();
        let op = operator("op1");
        let s = running_session(&svc, &op);

        let entry = svc.load(&op, &s.id, &LoadRequest::default()).unwrap();
        let entry = svc
            .unload(&op, &entry.id, &UnloadRequest { quantity: Some(8) })
            .unwrap();
        assert_eq!(entry.quantity, 8);

        let entry2 = svc.load(&op, &s.id, &LoadRequest::default()).unwrap();
        let err = svc
            .unload(&op, &entry2.id, &UnloadRequest { quantity: Some(0) })
            .unwrap_err();
        assert!(matches!(err, PressError::Validation(_)));
    }

    #[test]
    fn dangling_entry_closes_after_stop() {
        let (svc, _clock, _) = test_service();
        let op = operator("op1");
        let s = running_session(&svc, &op);

        let entry = svc.load(&op, &s.id, &LoadRequest::default()).unwrap();
        let s = svc.stop_session(&op, &s.id).unwrap();
        // stop leaves the entry ref in place
        assert_eq!(s.open_entry_id.as_deref(), Some(entry.id.as_str()));

        let entry = svc.unload(&op, &entry.id, &UnloadRequest::default()).unwrap();
        assert!(!entry.is_open());
    }

    #[test]
    fn repress_entries_are_tracked() {
        let (svc, _clock, _) = test_service();
        let op = operator("op1");
        let s = running_session(&svc, &op);

        let entry = svc
            .load(
                &op,
                &s.id,
                &LoadRequest {
                    kind: EntryKind::Repress,
                },
            )
            .unwrap();
        assert_eq!(entry.kind, EntryKind::Repress);
        svc.unload(&op, &entry.id, &UnloadRequest::default()).unwrap();

        let detail = svc.session_detail(&op, &s.id).unwrap();
        assert_eq!(detail.entries.len(), 1);
        assert_eq!(detail.entries[0].kind, EntryKind::Repress);
    }

    #[test]
    fn correct_entry_quantity_and_product() {
        let (svc, _clock, _) = test_service();
        let op = operator("op1");
        let s = running_session(&svc, &op);
        seed_product(&svc, &ProductKey::new("packing", "6mm", "8x4"), 0);

        let entry = svc.load(&op, &s.id, &LoadRequest::default()).unwrap();
        let entry = svc.unload(&op, &entry.id, &UnloadRequest::default()).unwrap();

        let err = svc
            .correct_entry(&op, &entry.id, &CorrectEntryRequest::default())
            .unwrap_err();
        assert!(matches!(err, PressError::Validation(_)));

        let err = svc
            .correct_entry(
                &op,
                &entry.id,
                &CorrectEntryRequest {
                    quantity: None,
                    product: Some(ProductKey::new("no", "such", "product")),
                },
            )
            .unwrap_err();
        assert!(matches!(err, PressError::UnknownProduct(_)));

        let entry = svc
            .correct_entry(
                &op,
                &entry.id,
                &CorrectEntryRequest {
                    quantity: Some(9),
                    product: Some(ProductKey::new("packing", "6mm", "8x4")),
                },
            )
            .unwrap();
        assert_eq!(entry.quantity, 9);
        assert_eq!(entry.product.thickness_id, "6mm");
    }

    #[test]
    fn other_operator_cannot_touch_entries() {
        let (svc, _clock, _) = test_service();
        let op = operator("op1");
        let s = running_session(&svc, &op);
        let entry = svc.load(&op, &s.id, &LoadRequest::default()).unwrap();

        let err = svc
            .unload(&operator("op2"), &entry.id, &UnloadRequest::default())
            .unwrap_err();
        assert!(matches!(err, PressError::Unauthorized(_)));
    }
}
