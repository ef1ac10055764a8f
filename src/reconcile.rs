//! Winner-slot reconciliation.
//!
//! When a sponsor edits a listing's reward structure, winners sitting on tiers
//! that no longer exist have to lose their winner status, and the listing's
//! cached `total_winners_selected` has to follow the new tier count. This
//! module only computes that plan; the store applies it atomically together
//! with the listing update.

use serde::Serialize;

use crate::model::{ListingId, Rewards, WinnerPosition};

/// Instruction to strip winner status from whoever holds `position` on
/// `listing_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearWinner {
    pub listing_id: ListingId,
    pub position: WinnerPosition,
}

/// Mutations needed to keep winner assignments consistent with a new reward
/// structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerPlan {
    pub listing_id: ListingId,
    pub clear: Vec<ClearWinner>,
    pub total_winners_selected: u32,
}

impl WinnerPlan {
    /// Positions to clear, in rank order.
    pub fn positions(&self) -> impl Iterator<Item = WinnerPosition> + '_ {
        self.clear.iter().map(|c| c.position)
    }

    pub fn clears_anything(&self) -> bool {
        !self.clear.is_empty()
    }
}

/// Compute the winner plan for `listing_id` given its persisted
/// `old_total` and the `proposed` rewards (absent counts as no tiers).
///
/// Positions ranked `new_total + 1 ..= old_total` are cleared; growing or
/// keeping the tier count clears nothing.
pub fn reconcile_winners(
    listing_id: &ListingId,
    old_total: u32,
    proposed: Option<&Rewards>,
) -> WinnerPlan {
    let new_total = proposed.map_or(0, Rewards::len) as u32;

    let clear = if new_total < old_total {
        WinnerPosition::ranks_between(new_total + 1, old_total)
            .map(|position| ClearWinner {
                listing_id: listing_id.clone(),
                position,
            })
            .collect()
    } else {
        Vec::new()
    };

    WinnerPlan {
        listing_id: listing_id.clone(),
        clear,
        total_winners_selected: new_total,
    }
}
