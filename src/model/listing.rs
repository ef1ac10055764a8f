use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{EnumIter, EnumString};

use crate::model::{HackathonId, ListingId, Rewards, SponsorId};

/// The kind of opportunity a listing represents.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    strum_macros::Display,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    #[default]
    Bounty,
    Project,
    Hackathon,
    Grant,
}

/// Lifecycle status set by the platform.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    strum_macros::Display,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    #[default]
    Open,
    Review,
    Closed,
}

/// Publication state as shown to talents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum DraftStatus {
    Draft,
    Published,
    Closed,
}

/// What a talent can do with their entry on a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubmissionAction {
    Submit,
    Edit,
    Submitted,
}

/// Geographic restriction on who may submit.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    strum_macros::Display,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum Region {
    #[default]
    Global,
    India,
    Vietnam,
    Germany,
    Turkey,
    Mexico,
    UnitedKingdom,
    Nigeria,
    Singapore,
    Brazil,
}

impl Region {
    /// Whether a user located at `location` may take part.
    ///
    /// Regional listings require a known location naming the same region;
    /// spaces and underscores in the location are treated as hyphens.
    pub fn is_eligible(self, location: Option<&str>) -> bool {
        if self == Region::Global {
            return true;
        }
        location
            .map(|l| l.trim().replace([' ', '_'], "-"))
            .and_then(|l| l.parse::<Region>().ok())
            .is_some_and(|r| r == self)
    }
}

/// A sponsor-owned opportunity accepting submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: ListingId,
    pub sponsor_id: SponsorId,
    pub hackathon_id: Option<HackathonId>,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub skills: Vec<String>,
    #[serde(rename = "type")]
    pub listing_type: ListingType,
    pub status: ListingStatus,
    pub is_published: bool,
    pub is_private: bool,
    pub is_winners_announced: bool,
    pub deadline: Option<DateTime<Utc>>,
    pub region: Region,
    pub rewards: Rewards,
    pub reward_amount: Option<f64>,
    pub token: Option<String>,
    pub compensation_type: Option<String>,
    pub min_reward_ask: Option<f64>,
    pub max_reward_ask: Option<f64>,
    /// Number of reward tiers at the last save.
    pub total_winners_selected: u32,
    /// Bumped on every commit; used to detect concurrent edits.
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Create an unpublished listing with no rewards.
    pub fn new(
        id: impl Into<ListingId>,
        sponsor_id: impl Into<SponsorId>,
        listing_type: ListingType,
        title: impl Into<String>,
    ) -> Self {
        let title = title.into();
        Self {
            id: id.into(),
            sponsor_id: sponsor_id.into(),
            hackathon_id: None,
            slug: slugify(&title),
            title,
            description: String::new(),
            skills: Vec::new(),
            listing_type,
            status: ListingStatus::Open,
            is_published: false,
            is_private: false,
            is_winners_announced: false,
            deadline: None,
            region: Region::Global,
            rewards: Rewards::new(),
            reward_amount: None,
            token: None,
            compensation_type: None,
            min_reward_ask: None,
            max_reward_ask: None,
            total_winners_selected: 0,
            version: 0,
            updated_at: Utc::now(),
        }
    }

    /// Replace the reward structure, keeping the cached tier count in step.
    pub fn with_rewards(mut self, rewards: Rewards) -> Self {
        self.total_winners_selected = rewards.len() as u32;
        self.reward_amount = Some(rewards.total());
        self.rewards = rewards;
        self
    }

    pub fn draft_status(&self) -> DraftStatus {
        match (self.status, self.is_published) {
            (ListingStatus::Closed, _) => DraftStatus::Closed,
            (_, false) => DraftStatus::Draft,
            (_, true) => DraftStatus::Published,
        }
    }

    pub fn is_deadline_over(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| deadline <= now)
    }

    /// Submissions are closed once the deadline passes or winners are out.
    pub fn is_submission_window_closed(&self, now: DateTime<Utc>) -> bool {
        self.is_deadline_over(now) || self.is_winners_announced
    }

    pub fn submission_action(&self, has_submitted: bool, now: DateTime<Utc>) -> SubmissionAction {
        match (has_submitted, self.is_submission_window_closed(now)) {
            (true, false) => SubmissionAction::Edit,
            (true, true) => SubmissionAction::Submitted,
            (false, _) => SubmissionAction::Submit,
        }
    }

    /// Whether a new entry from a user at `location` would be accepted.
    pub fn accepts_submissions(&self, location: Option<&str>, now: DateTime<Utc>) -> bool {
        self.draft_status() == DraftStatus::Published
            && !self.is_submission_window_closed(now)
            && self.region.is_eligible(location)
    }
}

fn slugify(title: &str) -> String {
    title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
