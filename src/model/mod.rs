mod common;
mod listing;
mod position;
mod rewards;
mod submission;
mod update;

pub use common::*;
pub use listing::*;
pub use position::*;
pub use rewards::*;
pub use submission::*;
pub use update::*;
