//! Challenge Progress
//!
//! Goal progress aggregation, leaderboard computation, and roster
//! management for challenges.

#![warn(missing_docs)]

pub mod engine;
pub mod error;
pub mod roster;

pub use engine::{aggregate_progress, category_score, ChallengeProgressEngine};
pub use error::ChallengeError;
pub use roster::{create_challenge, join, leave, ChallengeSpec};
