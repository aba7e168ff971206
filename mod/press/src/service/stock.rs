//! Stock ledger: per-product on-hand quantities, incremented exactly
//! once per production unit by the final-approval transaction.

use std::collections::BTreeMap;

use tracing::info;

use plyworks_core::{new_id, Actor, Role};
use plyworks_sql::{Row, SqlTx, Value};

use crate::error::PressError;
use crate::model::{CreateStockRecordRequest, ProductKey, StockListQuery, StockRecord};
use crate::service::PressService;

impl PressService {
    /// Register the stock record for a product. Managers and owners only.
    pub fn create_stock_record(
        &self,
        actor: &Actor,
        req: &CreateStockRecordRequest,
    ) -> Result<StockRecord, PressError> {
        if !matches!(actor.role, Role::Manager | Role::Owner) {
            return Err(PressError::Unauthorized(format!(
                "role {} cannot manage stock records",
                actor.role.as_str()
            )));
        }
        if req.category_id.is_empty() || req.thickness_id.is_empty() || req.size_id.is_empty() {
            return Err(PressError::Validation(
                "product descriptor must be fully specified".into(),
            ));
        }
        if req.opening_qty < 0 {
            return Err(PressError::Validation(
                "opening quantity must not be negative".into(),
            ));
        }

        let now = self.clock.now_rfc3339();
        let record = StockRecord {
            id: new_id(),
            scope_id: actor.scope_id.clone(),
            category_id: req.category_id.clone(),
            thickness_id: req.thickness_id.clone(),
            size_id: req.size_id.clone(),
            opening_qty: req.opening_qty,
            current_qty: req.opening_qty,
            active: req.active,
            created_at: now.clone(),
            updated_at: now,
        };

        self.run_tx(|tx| {
            let res = tx.exec(
                "INSERT INTO stock_records \
                 (id, scope_id, category_id, thickness_id, size_id, \
                  opening_qty, current_qty, active, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                &[
                    Value::Text(record.id.clone()),
                    Value::Text(record.scope_id.clone()),
                    Value::Text(record.category_id.clone()),
                    Value::Text(record.thickness_id.clone()),
                    Value::Text(record.size_id.clone()),
                    Value::Integer(record.opening_qty),
                    Value::Integer(record.current_qty),
                    Value::Integer(record.active as i64),
                    Value::Text(record.created_at.clone()),
                    Value::Text(record.updated_at.clone()),
                ],
            );
            match res {
                Ok(_) => Ok(record.clone()),
                Err(e) if e.to_string().contains("UNIQUE constraint") => {
                    Err(PressError::Conflict(format!(
                        "stock record for product {} already exists",
                        record.product().label()
                    )))
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Flip a stock record's active flag. Inactive records stop matching
    /// product lookups and stock increments; history referencing them is
    /// untouched.
    pub fn set_stock_active(
        &self,
        actor: &Actor,
        stock_id: &str,
        active: bool,
    ) -> Result<StockRecord, PressError> {
        if !matches!(actor.role, Role::Manager | Role::Owner) {
            return Err(PressError::Unauthorized(format!(
                "role {} cannot manage stock records",
                actor.role.as_str()
            )));
        }
        let now = self.clock.now_rfc3339();
        self.run_tx(|tx| {
            let rows = tx.query(
                "SELECT id, scope_id, category_id, thickness_id, size_id, \
                 opening_qty, current_qty, active, created_at, updated_at \
                 FROM stock_records WHERE id = ?1",
                &[Value::Text(stock_id.to_string())],
            )?;
            let mut record = match rows.first() {
                Some(row) => row_to_stock(row)?,
                None => return Err(PressError::NotFound(format!("stock_records/{stock_id}"))),
            };
            if record.scope_id != actor.scope_id {
                return Err(PressError::NotFound(format!("stock_records/{stock_id}")));
            }
            record.active = active;
            record.updated_at = now.clone();
            tx.exec(
                "UPDATE stock_records SET active = ?1, updated_at = ?2 WHERE id = ?3",
                &[
                    Value::Integer(active as i64),
                    Value::Text(now.clone()),
                    Value::Text(stock_id.to_string()),
                ],
            )?;
            Ok(record)
        })
    }

    /// Stock records of the scope, in catalog order.
    pub fn list_stock(
        &self,
        actor: &Actor,
        query: &StockListQuery,
    ) -> Result<Vec<StockRecord>, PressError> {
        let mut sql = String::from(
            "SELECT id, scope_id, category_id, thickness_id, size_id, \
             opening_qty, current_qty, active, created_at, updated_at \
             FROM stock_records WHERE scope_id = ?1",
        );
        let mut params = vec![Value::Text(actor.scope_id.clone())];
        if let Some(active) = query.active {
            sql.push_str(" AND active = ?2");
            params.push(Value::Integer(active as i64));
        }
        sql.push_str(" ORDER BY category_id ASC, thickness_id ASC, size_id ASC");

        let rows = self.db.query(&sql, &params)?;
        rows.iter().map(row_to_stock).collect()
    }

    /// Active products of a scope, used by the operator board.
    pub(crate) fn list_active_products(
        &self,
        scope_id: &str,
    ) -> Result<Vec<StockRecord>, PressError> {
        let rows = self.db.query(
            "SELECT id, scope_id, category_id, thickness_id, size_id, \
             opening_qty, current_qty, active, created_at, updated_at \
             FROM stock_records WHERE scope_id = ?1 AND active = 1 \
             ORDER BY category_id ASC, thickness_id ASC, size_id ASC",
            &[Value::Text(scope_id.to_string())],
        )?;
        rows.iter().map(row_to_stock).collect()
    }

    /// Whether the product has an active stock record in the scope.
    pub(crate) fn product_is_active_tx(
        &self,
        tx: &dyn SqlTx,
        scope_id: &str,
        key: &ProductKey,
    ) -> Result<bool, PressError> {
        let rows = tx.query(
            "SELECT id FROM stock_records WHERE scope_id = ?1 \
             AND category_id = ?2 AND thickness_id = ?3 AND size_id = ?4 \
             AND active = 1",
            &[
                Value::Text(scope_id.to_string()),
                Value::Text(key.category_id.clone()),
                Value::Text(key.thickness_id.clone()),
                Value::Text(key.size_id.clone()),
            ],
        )?;
        Ok(!rows.is_empty())
    }
}

/// Apply aggregated production quantities to the stock ledger inside the
/// final-approval transaction. A product with no active stock record
/// fails the whole transaction.
pub(crate) fn apply_production_tx(
    tx: &dyn SqlTx,
    scope_id: &str,
    totals: &BTreeMap<ProductKey, i64>,
    now: &str,
) -> Result<(), PressError> {
    for (key, qty) in totals {
        let affected = tx.exec(
            "UPDATE stock_records SET current_qty = current_qty + ?1, updated_at = ?2 \
             WHERE scope_id = ?3 AND category_id = ?4 AND thickness_id = ?5 \
             AND size_id = ?6 AND active = 1",
            &[
                Value::Integer(*qty),
                Value::Text(now.to_string()),
                Value::Text(scope_id.to_string()),
                Value::Text(key.category_id.clone()),
                Value::Text(key.thickness_id.clone()),
                Value::Text(key.size_id.clone()),
            ],
        )?;
        if affected == 0 {
            return Err(PressError::UnknownProduct(key.label()));
        }
        info!(product = %key.label(), qty, "stock incremented");
    }
    Ok(())
}

fn row_to_stock(row: &Row) -> Result<StockRecord, PressError> {
    let text = |col: &str| -> Result<String, PressError> {
        row.get_str(col)
            .map(|s| s.to_string())
            .ok_or_else(|| PressError::Storage(format!("stock record missing column {col}")))
    };
    let int = |col: &str| -> Result<i64, PressError> {
        row.get_i64(col)
            .ok_or_else(|| PressError::Storage(format!("stock record missing column {col}")))
    };
    Ok(StockRecord {
        id: text("id")?,
        scope_id: text("scope_id")?,
        category_id: text("category_id")?,
        thickness_id: text("thickness_id")?,
        size_id: text("size_id")?,
        opening_qty: int("opening_qty")?,
        current_qty: int("current_qty")?,
        active: int("active")? != 0,
        created_at: text("created_at")?,
        updated_at: text("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testutil::{manager, operator, packing_4mm, seed_product, test_service};
    use plyworks_core::Clock;

    #[test]
    fn create_and_list() {
        let (svc, _clock, _) = test_service();
        seed_product(&svc, &packing_4mm(), 120);
        seed_product(&svc, &ProductKey::new("shuttering", "12mm", "8x4"), 0);

        let all = svc
            .list_stock(&manager("mgr1"), &StockListQuery::default())
            .unwrap();
        assert_eq!(all.len(), 2);
        // catalog order
        assert_eq!(all[0].category_id, "packing");
        assert_eq!(all[0].opening_qty, 120);
        assert_eq!(all[0].current_qty, 120);
    }

    #[test]
    fn duplicate_product_conflicts() {
        let (svc, _clock, _) = test_service();
        seed_product(&svc, &packing_4mm(), 0);

        let err = svc
            .create_stock_record(
                &manager("mgr1"),
                &CreateStockRecordRequest {
                    category_id: "packing".into(),
                    thickness_id: "4mm".into(),
                    size_id: "8x4".into(),
                    opening_qty: 5,
                    active: true,
                },
            )
            .unwrap_err();
        assert!(matches!(err, PressError::Conflict(_)));
    }

    #[test]
    fn operators_cannot_create_stock() {
        let (svc, _clock, _) = test_service();
        let err = svc
            .create_stock_record(
                &operator("op1"),
                &CreateStockRecordRequest {
                    category_id: "packing".into(),
                    thickness_id: "4mm".into(),
                    size_id: "8x4".into(),
                    opening_qty: 0,
                    active: true,
                },
            )
            .unwrap_err();
        assert!(matches!(err, PressError::Unauthorized(_)));
    }

    #[test]
    fn active_filter() {
        let (svc, _clock, _) = test_service();
        seed_product(&svc, &packing_4mm(), 0);
        svc.create_stock_record(
            &manager("mgr1"),
            &CreateStockRecordRequest {
                category_id: "retired".into(),
                thickness_id: "6mm".into(),
                size_id: "6x4".into(),
                opening_qty: 0,
                active: false,
            },
        )
        .unwrap();

        let active_only = svc
            .list_stock(
                &manager("mgr1"),
                &StockListQuery {
                    active: Some(true),
                },
            )
            .unwrap();
        assert_eq!(active_only.len(), 1);
        assert_eq!(active_only[0].category_id, "packing");
    }

    #[test]
    fn apply_production_increments_and_rejects_unknown() {
        let (svc, clock, _) = test_service();
        seed_product(&svc, &packing_4mm(), 100);

        let mut totals = BTreeMap::new();
        totals.insert(packing_4mm(), 18);
        let now = clock.now_rfc3339();
        svc.run_tx(|tx| apply_production_tx(tx, "plant1", &totals, &now))
            .unwrap();

        let stock = svc
            .list_stock(&manager("mgr1"), &StockListQuery::default())
            .unwrap();
        assert_eq!(stock[0].current_qty, 118);

        // unknown product sorts after packing, so its failure must roll
        // back the increment already applied in the same batch
        totals.insert(ProductKey::new("zz-unknown", "1mm", "1x1"), 5);
        let err = svc
            .run_tx(|tx| apply_production_tx(tx, "plant1", &totals, &now))
            .unwrap_err();
        assert!(matches!(err, PressError::UnknownProduct(_)));

        let stock = svc
            .list_stock(&manager("mgr1"), &StockListQuery::default())
            .unwrap();
        assert_eq!(stock[0].current_qty, 118);
    }

    #[test]
    fn deactivate_hides_product_from_lookup() {
        let (svc, _clock, _) = test_service();
        let rec = seed_product(&svc, &packing_4mm(), 0);

        let rec = svc
            .set_stock_active(&manager("mgr1"), &rec.id, false)
            .unwrap();
        assert!(!rec.active);

        let active = svc.list_active_products("plant1").unwrap();
        assert!(active.is_empty());

        let other_scope = plyworks_core::Actor::new("mgr-x", Role::Manager, "plant2");
        let err = svc
            .set_stock_active(&other_scope, &rec.id, true)
            .unwrap_err();
        assert!(matches!(err, PressError::NotFound(_)));
    }

    #[test]
    fn scopes_are_isolated() {
        let (svc, _clock, _) = test_service();
        seed_product(&svc, &packing_4mm(), 10);

        let other = plyworks_core::Actor::new("mgr-x", Role::Manager, "plant2");
        let theirs = svc.list_stock(&other, &StockListQuery::default()).unwrap();
        assert!(theirs.is_empty());
    }
}
