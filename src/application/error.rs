use thiserror::Error;

use crate::domain::NumberError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Service already exists: {0}")]
    ServiceAlreadyExists(String),

    #[error("Bill not found: {0}")]
    BillNotFound(String),

    #[error("Bill line not found: {0}")]
    LineNotFound(String),

    #[error("No billing address on file for: {0}")]
    ProfileNotFound(String),

    #[error("Invalid quantity {0}: must be at least 1")]
    InvalidQuantity(i64),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Cannot assign bill number: {0}")]
    Numbering(#[from] NumberError),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
