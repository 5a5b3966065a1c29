use rust_decimal::Decimal;
use serde::Serialize;

/// Error type returned by every service operation in the crate.
///
/// Validation and stock-sufficiency failures are raised before any mutation;
/// a `Database` error during commit means the whole transaction rolled back
/// and no partial effect is observable.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(
        #[from]
        #[serde(skip)]
        sea_orm::error::DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate record: {0}")]
    DuplicateRecord(String),

    #[error("Insufficient stock for {sku}: requested {requested}, available {available}")]
    InsufficientStock {
        sku: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Nothing to release: {0}")]
    NothingToRelease(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("Event error: {0}")]
    Event(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn db_error(err: sea_orm::error::DbErr) -> Self {
        ServiceError::Database(err)
    }

    /// Quantity still missing after exhausting what was available.
    pub fn shortfall(&self) -> Option<Decimal> {
        match self {
            ServiceError::InsufficientStock {
                requested,
                available,
                ..
            } => Some(*requested - *available),
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::Validation(err.to_string())
    }
}
