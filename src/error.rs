use std::time::Duration;

use crate::model::ListingId;

/// All errors that can occur while updating a listing.
#[derive(thiserror::Error, Debug)]
pub enum ListingError {
    /// The referenced listing does not exist.
    #[error("listing {listing_id} not found")]
    NotFound { listing_id: ListingId },

    /// The requester does not own the listing's sponsor or hackathon.
    #[error("user {user_id} may not update listing {listing_id}")]
    Forbidden {
        listing_id: ListingId,
        user_id: String,
    },

    /// The update payload is malformed or carries no allowed field.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The listing changed between read and commit.
    #[error("listing {listing_id} changed concurrently: expected version {expected}, found {actual}")]
    ConcurrencyConflict {
        listing_id: ListingId,
        expected: u64,
        actual: u64,
    },

    /// The backing store is unreachable or rejected the write.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// The update did not complete within the request timeout.
    #[error("update of listing {listing_id} timed out after {timeout:?}")]
    Timeout {
        listing_id: ListingId,
        timeout: Duration,
    },

    /// A configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Webhook delivery failed (network, DNS, TLS, non-success status).
    #[error("webhook delivery to {url} failed: {source}")]
    Webhook { url: String, source: reqwest::Error },

    /// Failed to parse a JSON payload.
    #[error("failed to parse payload: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ListingError>;
