mod memory;

use std::future::Future;

pub use memory::MemoryStore;

use crate::error::Result;
use crate::model::{Listing, ListingId, ListingUpdate, Submission};
use crate::reconcile::WinnerPlan;

/// Everything that has to become visible together when a listing is updated.
#[derive(Debug, Clone)]
pub struct ListingCommit {
    pub listing_id: ListingId,
    /// Version read before the plan was computed.
    pub expected_version: u64,
    pub plan: WinnerPlan,
    pub update: ListingUpdate,
}

/// Persistence for listings and their submissions.
///
/// `commit` must be atomic: the version check, the winner clears and the
/// listing write either all happen or none do. A version mismatch is
/// reported as [`ListingError::ConcurrencyConflict`](crate::ListingError::ConcurrencyConflict).
pub trait ListingStore: Send + Sync {
    fn find_listing(&self, id: &ListingId) -> impl Future<Output = Result<Option<Listing>>> + Send;

    fn submissions(&self, listing_id: &ListingId)
        -> impl Future<Output = Result<Vec<Submission>>> + Send;

    fn commit(&self, commit: ListingCommit) -> impl Future<Output = Result<Listing>> + Send;
}
