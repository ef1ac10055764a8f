use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }
    };
}

string_id!(
    /// Unique identifier of a listing.
    ListingId
);
string_id!(
    /// Unique identifier of a submission.
    SubmissionId
);
string_id!(
    /// Identifier of the sponsor that owns a listing.
    SponsorId
);
string_id!(
    /// Identifier of a hackathon a listing may belong to.
    HackathonId
);

/// The authenticated identity performing a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Requester {
    pub user_id: String,
    pub current_sponsor_id: Option<SponsorId>,
    pub hackathon_id: Option<HackathonId>,
}

impl Requester {
    pub fn sponsor(user_id: impl Into<String>, sponsor_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            current_sponsor_id: Some(SponsorId::new(sponsor_id)),
            hackathon_id: None,
        }
    }
}
