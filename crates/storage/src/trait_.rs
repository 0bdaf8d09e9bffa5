//! Storage trait abstraction.

use async_trait::async_trait;
use fitsync_core::{Challenge, ChallengeId, Reminder, ReminderId, ReminderSettings, UserId};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Storage abstraction for FitSync data.
///
/// This trait allows different storage backends to be plugged in. The core
/// services treat it as an external collaborator: a real backend may be
/// eventually consistent, so callers must not assume read-your-write
/// semantics beyond a single backend instance.
#[async_trait]
pub trait Storage: Send + Sync {
    // === Reminder operations ===

    /// Save a reminder (create or update).
    async fn save_reminder(&mut self, reminder: &Reminder) -> Result<()>;

    /// Load a reminder by ID.
    async fn load_reminder(&self, id: ReminderId) -> Result<Option<Reminder>>;

    /// List reminders, optionally restricted to one user.
    async fn list_reminders(&self, user: Option<&UserId>) -> Result<Vec<Reminder>>;

    /// Delete a reminder.
    async fn delete_reminder(&mut self, id: ReminderId) -> Result<()>;

    // === Challenge operations ===

    /// Save a challenge (create or update).
    async fn save_challenge(&mut self, challenge: &Challenge) -> Result<()>;

    /// Load a challenge by ID.
    async fn load_challenge(&self, id: ChallengeId) -> Result<Option<Challenge>>;

    /// List all challenges.
    async fn list_challenges(&self) -> Result<Vec<Challenge>>;

    /// Delete a challenge.
    async fn delete_challenge(&mut self, id: ChallengeId) -> Result<()>;

    // === Settings ===

    /// Load the settings singleton.
    async fn load_settings(&self) -> Result<ReminderSettings>;

    /// Replace the settings singleton.
    async fn save_settings(&mut self, settings: &ReminderSettings) -> Result<()>;
}
