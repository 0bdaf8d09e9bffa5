//! FitSync core data models.
//!
//! This crate defines the fundamental data structures shared by the
//! reminder-scheduling and challenge-progress services.

#![warn(missing_docs)]

// Core identities
mod id;

// Reminders
mod reminder;
mod settings;

// Challenges
mod challenge;

// Re-exports
pub use id::*;

// Reminder
pub use reminder::{Frequency, Recurrence, Reminder, ReminderKind, ReminderPriority};
pub use settings::{QuietHours, ReminderSettings, SettingsError, SettingsPatch};

// Challenge
pub use challenge::{
    Challenge, ChallengeCategory, ChallengeGoal, ChallengeMember, LeaderboardEntry,
};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
