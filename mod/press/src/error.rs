use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use plyworks_core::ServiceError;
use plyworks_sql::SQLError;

/// Stable error codes for the press module.
///
/// These extend the generic codes in `plyworks_core::error_code` with the
/// domain's own fault vocabulary. Clients match on the code, never on the
/// message.
pub mod error_code {
    pub const ALREADY_RUNNING: &str = "ALREADY_RUNNING";
    pub const NO_ACTIVE_SESSION: &str = "NO_ACTIVE_SESSION";
    pub const PRODUCT_NOT_SELECTED: &str = "PRODUCT_NOT_SELECTED";
    pub const ENTRY_ALREADY_OPEN: &str = "ENTRY_ALREADY_OPEN";
    pub const ENTRY_NOT_OPEN: &str = "ENTRY_NOT_OPEN";
    pub const INVALID_TRANSITION: &str = "INVALID_TRANSITION";
    pub const INVALID_APPROVAL_STATE: &str = "INVALID_APPROVAL_STATE";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const UNKNOWN_PRODUCT: &str = "UNKNOWN_PRODUCT";
    pub const LEDGER_CORRUPTED: &str = "LEDGER_CORRUPTED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const INTERNAL: &str = "INTERNAL";
}

/// Domain error of the press module.
///
/// Every variant except `LedgerCorrupted`, `Storage` and `Internal` is a
/// recoverable, caller-visible fault: the operation failed cleanly with no
/// partial state change. `LedgerCorrupted` means a stored invariant does
/// not hold: a prior bug, surfaced loudly and never silently repaired.
#[derive(Error, Debug)]
pub enum PressError {
    /// Operator already has a session in an open status.
    #[error("operator {0} already has an open session")]
    AlreadyRunning(String),

    /// Operator has no session in an open status.
    #[error("operator {0} has no open session")]
    NoActiveSession(String),

    /// Load attempted without a fully specified product descriptor.
    #[error("no product selected for the session")]
    ProductNotSelected,

    /// Load attempted while an entry is still in the press.
    #[error("session {0} already has an open entry")]
    EntryAlreadyOpen(String),

    /// Unload attempted on an entry that is already closed.
    #[error("entry {0} is not open")]
    EntryNotOpen(String),

    /// Session action not allowed from the current lifecycle status.
    #[error("cannot {action} a session in status {status}")]
    InvalidTransition {
        action: &'static str,
        status: String,
    },

    /// Review-chain action not allowed from the current approval status,
    /// including double-approval races.
    #[error("cannot {action} in approval status {status}")]
    InvalidApprovalState {
        action: &'static str,
        status: String,
    },

    /// Actor lacks the role the action requires, or does not own the unit.
    #[error("{0}")]
    Unauthorized(String),

    /// Production applied against a product with no active stock record.
    #[error("no active stock record for product {0}")]
    UnknownProduct(String),

    /// A stored invariant does not hold. Indicates a prior bug.
    #[error("ledger corrupted: {0}")]
    LedgerCorrupted(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Storage(String),

    #[error("{0}")]
    Internal(String),
}

impl PressError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyRunning(_) => error_code::ALREADY_RUNNING,
            Self::NoActiveSession(_) => error_code::NO_ACTIVE_SESSION,
            Self::ProductNotSelected => error_code::PRODUCT_NOT_SELECTED,
            Self::EntryAlreadyOpen(_) => error_code::ENTRY_ALREADY_OPEN,
            Self::EntryNotOpen(_) => error_code::ENTRY_NOT_OPEN,
            Self::InvalidTransition { .. } => error_code::INVALID_TRANSITION,
            Self::InvalidApprovalState { .. } => error_code::INVALID_APPROVAL_STATE,
            Self::Unauthorized(_) => error_code::PERMISSION_DENIED,
            Self::UnknownProduct(_) => error_code::UNKNOWN_PRODUCT,
            Self::LedgerCorrupted(_) => error_code::LEDGER_CORRUPTED,
            Self::NotFound(_) => error_code::NOT_FOUND,
            Self::Conflict(_) => error_code::ALREADY_EXISTS,
            Self::Validation(_) => error_code::VALIDATION_FAILED,
            Self::Storage(_) => error_code::STORAGE_ERROR,
            Self::Internal(_) => error_code::INTERNAL,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AlreadyRunning(_)
            | Self::EntryAlreadyOpen(_)
            | Self::EntryNotOpen(_)
            | Self::InvalidTransition { .. }
            | Self::InvalidApprovalState { .. }
            | Self::UnknownProduct(_)
            | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NoActiveSession(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ProductNotSelected | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::LedgerCorrupted(_) | Self::Storage(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for PressError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}

impl From<SQLError> for PressError {
    fn from(e: SQLError) -> Self {
        PressError::Storage(e.to_string())
    }
}

impl From<ServiceError> for PressError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound(m) => PressError::NotFound(m),
            ServiceError::Conflict(m) => PressError::Conflict(m),
            ServiceError::Validation(m) => PressError::Validation(m),
            ServiceError::Unauthorized(m) | ServiceError::PermissionDenied(m) => {
                PressError::Unauthorized(m)
            }
            ServiceError::Storage(m) => PressError::Storage(m),
            ServiceError::Internal(m) => PressError::Internal(m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_class_maps_to_409() {
        let errs = [
            PressError::AlreadyRunning("op1".into()),
            PressError::EntryAlreadyOpen("s1".into()),
            PressError::EntryNotOpen("e1".into()),
            PressError::InvalidTransition {
                action: "pause",
                status: "STOPPED".into(),
            },
            PressError::InvalidApprovalState {
                action: "managerApprove",
                status: "SUBMITTED".into(),
            },
            PressError::UnknownProduct("c1/t1/s1".into()),
        ];
        for e in errs {
            assert_eq!(e.status_code(), StatusCode::CONFLICT, "{e}");
        }
    }

    #[test]
    fn code_stability() {
        assert_eq!(
            PressError::AlreadyRunning("x".into()).error_code(),
            "ALREADY_RUNNING"
        );
        assert_eq!(
            PressError::InvalidApprovalState {
                action: "submit",
                status: "SUBMITTED".into()
            }
            .error_code(),
            "INVALID_APPROVAL_STATE"
        );
        assert_eq!(
            PressError::LedgerCorrupted("two open entries".into()).error_code(),
            "LEDGER_CORRUPTED"
        );
    }

    #[test]
    fn unauthorized_is_403() {
        let e = PressError::Unauthorized("role OPERATOR cannot managerApprove".into());
        assert_eq!(e.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn ledger_corruption_is_500() {
        let e = PressError::LedgerCorrupted("session s1 has two open entries".into());
        assert_eq!(e.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn message_includes_context() {
        let e = PressError::InvalidTransition {
            action: "load",
            status: "PAUSED".into(),
        };
        assert_eq!(e.to_string(), "cannot load a session in status PAUSED");
    }
}
