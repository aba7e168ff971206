use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ProductKey
// ---------------------------------------------------------------------------

/// Product descriptor: opaque catalog references owned by an external
/// catalog service. The press module never interprets them, it only
/// matches them against stock records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductKey {
    pub category_id: String,
    pub thickness_id: String,
    pub size_id: String,
}

impl ProductKey {
    pub fn new(
        category_id: impl Into<String>,
        thickness_id: impl Into<String>,
        size_id: impl Into<String>,
    ) -> Self {
        Self {
            category_id: category_id.into(),
            thickness_id: thickness_id.into(),
            size_id: size_id.into(),
        }
    }

    /// Short label for log and error messages.
    pub fn label(&self) -> String {
        format!("{}/{}/{}", self.category_id, self.thickness_id, self.size_id)
    }
}

// ---------------------------------------------------------------------------
// StockRecord: maps 1:1 to SQL columns
// ---------------------------------------------------------------------------

/// On-hand inventory for one product of one scope.
///
/// `current_qty` is mutated only by the final-approval transaction, and
/// only by addition. All fields map directly to SQL columns; no JSON blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    pub id: String,
    pub scope_id: String,
    pub category_id: String,
    pub thickness_id: String,
    pub size_id: String,
    pub opening_qty: i64,
    pub current_qty: i64,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl StockRecord {
    pub fn product(&self) -> ProductKey {
        ProductKey::new(&self.category_id, &self.thickness_id, &self.size_id)
    }
}

// ---------------------------------------------------------------------------
// API request / query types
// ---------------------------------------------------------------------------

/// Body for `POST /stock` — register a product's stock record.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStockRecordRequest {
    pub category_id: String,
    pub thickness_id: String,
    pub size_id: String,

    #[serde(default)]
    pub opening_qty: i64,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Query parameters for `GET /stock`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockListQuery {
    /// If true, only records marked active.
    #[serde(default)]
    pub active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_key_label() {
        let key = ProductKey::new("packing", "4mm", "8x4");
        assert_eq!(key.label(), "packing/4mm/8x4");
    }

    #[test]
    fn create_request_defaults() {
        let json = r#"{"categoryId":"c1","thicknessId":"t1","sizeId":"s1"}"#;
        let req: CreateStockRecordRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.opening_qty, 0);
        assert!(req.active);
    }

    #[test]
    fn stock_record_product() {
        let rec = StockRecord {
            id: "r1".into(),
            scope_id: "plant1".into(),
            category_id: "c1".into(),
            thickness_id: "t1".into(),
            size_id: "s1".into(),
            opening_qty: 100,
            current_qty: 100,
            active: true,
            created_at: "2026-01-01T00:00:00+00:00".into(),
            updated_at: "2026-01-01T00:00:00+00:00".into(),
        };
        assert_eq!(rec.product(), ProductKey::new("c1", "t1", "s1"));
    }
}
