use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{ListingError, Result};
use crate::model::{Listing, ListingId, Submission};
use crate::store::{ListingCommit, ListingStore};

#[derive(Debug, Default)]
struct State {
    listings: HashMap<ListingId, Listing>,
    submissions: Vec<Submission>,
}

/// In-process [`ListingStore`].
///
/// A commit holds the write lock from the version check until the listing is
/// written back, so readers never observe a half-applied plan.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_listing(&self, listing: Listing) {
        self.state
            .write()
            .await
            .listings
            .insert(listing.id.clone(), listing);
    }

    pub async fn insert_submission(&self, submission: Submission) {
        self.state.write().await.submissions.push(submission);
    }
}

impl ListingStore for MemoryStore {
    async fn find_listing(&self, id: &ListingId) -> Result<Option<Listing>> {
        Ok(self.state.read().await.listings.get(id).cloned())
    }

    async fn submissions(&self, listing_id: &ListingId) -> Result<Vec<Submission>> {
        Ok(self
            .state
            .read()
            .await
            .submissions
            .iter()
            .filter(|s| &s.listing_id == listing_id)
            .cloned()
            .collect())
    }

    async fn commit(&self, commit: ListingCommit) -> Result<Listing> {
        if commit.plan.listing_id != commit.listing_id {
            return Err(ListingError::InvalidInput(format!(
                "plan for listing {} committed against listing {}",
                commit.plan.listing_id, commit.listing_id
            )));
        }

        if let Some(foreign) = commit
            .plan
            .clear
            .iter()
            .find(|c| c.listing_id != commit.listing_id)
        {
            return Err(ListingError::InvalidInput(format!(
                "clear of {} on listing {} committed against listing {}",
                foreign.position, foreign.listing_id, commit.listing_id
            )));
        }

        let mut state = self.state.write().await;
        let State {
            listings,
            submissions,
        } = &mut *state;

        let listing =
            listings
                .get_mut(&commit.listing_id)
                .ok_or_else(|| ListingError::NotFound {
                    listing_id: commit.listing_id.clone(),
                })?;

        if listing.version != commit.expected_version {
            return Err(ListingError::ConcurrencyConflict {
                listing_id: commit.listing_id,
                expected: commit.expected_version,
                actual: listing.version,
            });
        }

        let mut cleared = 0;
        for submission in submissions.iter_mut() {
            let occupied = commit
                .plan
                .clear
                .iter()
                .any(|c| submission.holds(&commit.listing_id, c.position));
            if occupied {
                submission.clear_winner();
                cleared += 1;
            }
        }

        commit.update.apply_to(listing);
        listing.total_winners_selected = commit.plan.total_winners_selected;
        listing.version += 1;
        listing.updated_at = Utc::now();

        debug!(
            listing_id = %listing.id,
            version = listing.version,
            cleared,
            "committed listing update"
        );
        Ok(listing.clone())
    }
}
