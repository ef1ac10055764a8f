use serde::{Deserialize, Serialize};

use crate::model::{ListingId, SubmissionId, WinnerPosition};

/// A talent's entry against a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: SubmissionId,
    pub listing_id: ListingId,
    pub user_id: String,
    pub is_winner: bool,
    /// Only meaningful while `is_winner` is set.
    pub winner_position: Option<WinnerPosition>,
}

impl Submission {
    pub fn new(
        id: impl Into<SubmissionId>,
        listing_id: impl Into<ListingId>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            listing_id: listing_id.into(),
            user_id: user_id.into(),
            is_winner: false,
            winner_position: None,
        }
    }

    pub fn winner(mut self, position: WinnerPosition) -> Self {
        self.is_winner = true;
        self.winner_position = Some(position);
        self
    }

    pub fn holds(&self, listing_id: &ListingId, position: WinnerPosition) -> bool {
        self.is_winner && &self.listing_id == listing_id && self.winner_position == Some(position)
    }

    pub fn clear_winner(&mut self) {
        self.is_winner = false;
        self.winner_position = None;
    }
}
