//! Delivery error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Malformed input (empty event type or email id)
    #[error("Validation error: {0}")]
    Validation(String),

    /// No record for the given id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Local database error
    #[error("Database error: {0}")]
    Database(#[from] partyhaus_database::DatabaseError),

    /// Supabase REST error
    #[error("Supabase error: {0}")]
    Supabase(#[from] supabase_client::SupabaseError),

    /// Resend rejected the send
    #[error("Resend API error ({status}): {message}")]
    Resend { status: u16, message: String },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias using DeliveryError.
pub type DeliveryResult<T> = Result<T, DeliveryError>;
