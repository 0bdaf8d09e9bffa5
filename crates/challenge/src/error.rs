//! Challenge error type.

use fitsync_core::{GoalId, MemberId, UserId};

/// Errors from challenge operations. Validation happens before any
/// mutation, so a returned error means the aggregate is untouched.
#[derive(Debug, thiserror::Error)]
pub enum ChallengeError {
    /// Unknown goal ID
    #[error("goal not found: {0}")]
    GoalNotFound(GoalId),

    /// Unknown member ID
    #[error("member not found: {0}")]
    MemberNotFound(MemberId),

    /// Roster is at capacity
    #[error("challenge is full ({max} members)")]
    Full {
        /// The capacity cap
        max: usize,
    },

    /// The user is already on the roster
    #[error("user {0} already joined")]
    AlreadyJoined(UserId),

    /// End date does not follow the start date
    #[error("challenge end must be after start")]
    InvalidWindow,
}
