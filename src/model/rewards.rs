use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ListingError, Result};
use crate::model::WinnerPosition;

/// A listing's reward structure: the amount paid out at each winner position.
///
/// Deserialization rejects unknown position labels, duplicate labels and
/// non-numeric amounts. Structural rules that need the whole mapping are
/// checked by [`Rewards::validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Rewards(BTreeMap<WinnerPosition, f64>);

impl Rewards {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reward tiers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, position: WinnerPosition) -> Option<f64> {
        self.0.get(&position).copied()
    }

    pub fn contains(&self, position: WinnerPosition) -> bool {
        self.0.contains_key(&position)
    }

    pub fn iter(&self) -> impl Iterator<Item = (WinnerPosition, f64)> + '_ {
        self.0.iter().map(|(p, a)| (*p, *a))
    }

    /// Sum of every tier's amount.
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    /// Check that tiers are contiguous from `first` and every amount is a
    /// positive finite number.
    pub fn validate(&self) -> Result<()> {
        let contiguous = self
            .0
            .keys()
            .map(|p| p.rank())
            .eq(1..=self.0.len() as u32);
        if !contiguous {
            return Err(ListingError::InvalidInput(format!(
                "reward positions must run from first without gaps, got [{}]",
                itertools::join(self.0.keys(), ", ")
            )));
        }

        if let Some((position, amount)) = self
            .iter()
            .find(|(_, amount)| !amount.is_finite() || *amount <= 0.0)
        {
            return Err(ListingError::InvalidInput(format!(
                "reward for {position} must be a positive amount, got {amount}"
            )));
        }

        Ok(())
    }
}

impl FromIterator<(WinnerPosition, f64)> for Rewards {
    fn from_iter<I: IntoIterator<Item = (WinnerPosition, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'de> Deserialize<'de> for Rewards {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RewardsVisitor;

        impl<'de> Visitor<'de> for RewardsVisitor {
            type Value = Rewards;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of winner positions to reward amounts")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Rewards, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut tiers = BTreeMap::new();
                while let Some((position, amount)) = map.next_entry::<WinnerPosition, f64>()? {
                    if tiers.insert(position, amount).is_some() {
                        return Err(de::Error::custom(format!(
                            "duplicate reward position `{position}`"
                        )));
                    }
                }
                Ok(Rewards(tiers))
            }
        }

        deserializer.deserialize_map(RewardsVisitor)
    }
}
