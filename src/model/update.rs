use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::error::Category;

use crate::error::{ListingError, Result};
use crate::model::{Listing, ListingType, Region, Rewards};

/// Sponsor-supplied fields for an update request.
///
/// Only these fields can be changed by a sponsor; anything else in the
/// incoming payload is ignored during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub skills: Option<Vec<String>>,
    #[serde(rename = "type")]
    pub listing_type: Option<ListingType>,
    pub region: Option<Region>,
    pub deadline: Option<DateTime<Utc>>,
    pub rewards: Option<Rewards>,
    pub reward_amount: Option<f64>,
    pub token: Option<String>,
    pub compensation_type: Option<String>,
    pub min_reward_ask: Option<f64>,
    pub max_reward_ask: Option<f64>,
    pub is_published: Option<bool>,
    pub is_private: Option<bool>,
}

impl ListingUpdate {
    /// Parse a raw JSON request body.
    ///
    /// Well-formed JSON with the wrong shape (unknown or duplicate reward
    /// positions, non-numeric amounts, mistyped fields) is invalid input;
    /// unparseable JSON stays a [`ListingError::Json`].
    pub fn from_json(body: &str) -> Result<Self> {
        serde_json::from_str(body).map_err(|err| match err.classify() {
            Category::Data => ListingError::InvalidInput(err.to_string()),
            _ => ListingError::Json(err),
        })
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Reject updates that carry nothing or carry a malformed reward structure.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(ListingError::InvalidInput(
                "no valid fields provided for update".to_owned(),
            ));
        }
        if let Some(rewards) = &self.rewards {
            rewards.validate()?;
        }
        check_reward_ask(self.min_reward_ask, self.max_reward_ask)
    }

    /// Checks that only hold once the update is merged with the stored listing.
    pub fn validate_against(&self, listing: &Listing) -> Result<()> {
        check_reward_ask(
            self.min_reward_ask.or(listing.min_reward_ask),
            self.max_reward_ask.or(listing.max_reward_ask),
        )
    }

    /// Copy every provided field onto `listing`.
    ///
    /// `total_winners_selected` is not touched here; it comes from the
    /// reconciliation plan committed alongside this update.
    pub fn apply_to(&self, listing: &mut Listing) {
        macro_rules! set {
            ($from:ident => $to:ident; $($field:ident),* $(,)?) => {
                $(if let Some(value) = &$from.$field {
                    $to.$field = value.clone();
                })*
            };
        }
        macro_rules! set_opt {
            ($from:ident => $to:ident; $($field:ident),* $(,)?) => {
                $(if let Some(value) = &$from.$field {
                    $to.$field = Some(value.clone());
                })*
            };
        }

        let update = self;
        set!(
            update => listing;
            title,
            slug,
            description,
            skills,
            listing_type,
            region,
            rewards,
            is_published,
            is_private,
        );
        set_opt!(
            update => listing;
            deadline,
            reward_amount,
            token,
            compensation_type,
            min_reward_ask,
            max_reward_ask,
        );
    }
}

fn check_reward_ask(min: Option<f64>, max: Option<f64>) -> Result<()> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(ListingError::InvalidInput(format!(
            "minimum reward ask {min} exceeds maximum {max}"
        ))),
        _ => Ok(()),
    }
}
