//! Challenge model - goals, members, and the leaderboard projection.

use serde::{Deserialize, Serialize};

use crate::id::{ChallengeId, GoalId, MemberId, UserId};
use crate::Time;

/// A challenge groups measurable goals with the members pursuing them.
///
/// Invariants: `ends_at > starts_at` and `members.len() <= max_members`,
/// both enforced by the roster layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    /// Unique identifier
    pub id: ChallengeId,

    /// Challenge name
    pub name: String,

    /// Detailed description
    pub description: String,

    /// What kind of activity is measured
    pub category: ChallengeCategory,

    /// When the challenge starts
    pub starts_at: Time,

    /// When the challenge ends
    pub ends_at: Time,

    /// Goals contributing equally to member progress
    pub goals: Vec<ChallengeGoal>,

    /// Current roster
    pub members: Vec<ChallengeMember>,

    /// Capacity cap
    pub max_members: usize,

    /// When created
    pub created_at: Time,
}

impl Challenge {
    /// Look up a goal by ID.
    pub fn goal(&self, id: GoalId) -> Option<&ChallengeGoal> {
        self.goals.iter().find(|g| g.id == id)
    }

    /// Look up a goal by ID, mutably.
    pub fn goal_mut(&mut self, id: GoalId) -> Option<&mut ChallengeGoal> {
        self.goals.iter_mut().find(|g| g.id == id)
    }

    /// Look up a member by ID.
    pub fn member(&self, id: MemberId) -> Option<&ChallengeMember> {
        self.members.iter().find(|m| m.id == id)
    }

    /// Look up a member by ID, mutably.
    pub fn member_mut(&mut self, id: MemberId) -> Option<&mut ChallengeMember> {
        self.members.iter_mut().find(|m| m.id == id)
    }

    /// Look up a member by owning user.
    pub fn member_by_user(&self, user_id: &UserId) -> Option<&ChallengeMember> {
        self.members.iter().find(|m| &m.user_id == user_id)
    }

    /// Whether the roster is at capacity.
    pub fn is_full(&self) -> bool {
        self.members.len() >= self.max_members
    }
}

/// Challenge category, which also selects the leaderboard score projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChallengeCategory {
    /// Step count
    Steps,
    /// Workout sessions
    Workouts,
    /// Meals logged
    Meals,
    /// Weight change
    Weight,
    /// User-defined
    Custom,
}

impl ChallengeCategory {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeCategory::Steps => "steps",
            ChallengeCategory::Workouts => "workouts",
            ChallengeCategory::Meals => "meals",
            ChallengeCategory::Weight => "weight",
            ChallengeCategory::Custom => "custom",
        }
    }
}

/// A measurable target within a challenge. Owned exclusively by one
/// challenge; contributes equally to member progress regardless of size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeGoal {
    /// Unique identifier
    pub id: GoalId,

    /// Target value to reach
    pub target_value: f64,

    /// Current value
    pub current_value: f64,

    /// Unit label ("steps", "kg", ...)
    pub unit: String,

    /// Whether `current_value >= target_value`
    pub completed: bool,
}

impl ChallengeGoal {
    /// Create a fresh goal at zero progress.
    pub fn new(target_value: f64, unit: impl Into<String>) -> Self {
        Self {
            id: GoalId::new(),
            target_value,
            current_value: 0.0,
            unit: unit.into(),
            completed: false,
        }
    }
}

/// A member of a challenge. `progress` and `rank` are derived by the
/// progress engine and never set directly by callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeMember {
    /// Unique identifier
    pub id: MemberId,

    /// Owning user
    pub user_id: UserId,

    /// Name shown on the leaderboard
    pub display_name: String,

    /// When the member joined
    pub joined_at: Time,

    /// Aggregate progress, 0-100
    pub progress: u8,

    /// Leaderboard rank, 1-based; 0 until first ranked
    pub rank: u32,

    /// Whether this member administers the challenge
    pub admin: bool,
}

impl ChallengeMember {
    /// Create a new non-admin member with no progress.
    pub fn new(user_id: UserId, display_name: impl Into<String>, joined_at: Time) -> Self {
        Self {
            id: MemberId::new(),
            user_id,
            display_name: display_name.into(),
            joined_at,
            progress: 0,
            rank: 0,
            admin: false,
        }
    }
}

/// A read-only leaderboard row: a member plus the category score.
/// Always rebuilt from members, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// The member this row projects
    pub member_id: MemberId,

    /// Name shown on the leaderboard
    pub display_name: String,

    /// Rank, 1-based and contiguous
    pub rank: u32,

    /// Aggregate progress, 0-100
    pub progress: u8,

    /// Category-specific display score derived from progress
    pub score: u64,
}
