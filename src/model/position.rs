use serde::{Deserialize, Serialize};
use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{EnumIter, EnumString, FromRepr};

/// Ordinal reward tier a winning submission occupies.
///
/// Variants are declared in rank order, so the derived `Ord` is the ranking
/// and `rank()` is 1-based.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    FromRepr,
    strum_macros::EnumCount,
    strum_macros::Display,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum WinnerPosition {
    First = 1,
    Second,
    Third,
    Fourth,
    Fifth,
}

impl WinnerPosition {
    /// Number of reward tiers a listing can carry.
    pub const MAX: usize = Self::COUNT;

    pub fn rank(self) -> u32 {
        self as u32
    }

    pub fn from_rank(rank: u32) -> Option<Self> {
        u8::try_from(rank).ok().and_then(Self::from_repr)
    }

    /// Positions whose rank lies in `from..=to`, in rank order.
    pub fn ranks_between(from: u32, to: u32) -> impl Iterator<Item = Self> {
        Self::iter().filter(move |p| (from..=to).contains(&p.rank()))
    }
}
