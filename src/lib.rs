pub use config::ServiceConfig;
pub use error::{ListingError, Result};
pub use model::*;
pub use reconcile::{reconcile_winners, ClearWinner, WinnerPlan};
pub use service::ListingService;
pub use store::{ListingCommit, ListingStore, MemoryStore};
pub use webhook::WebhookNotifier;

pub mod config;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod service;
pub mod store;
pub mod webhook;
