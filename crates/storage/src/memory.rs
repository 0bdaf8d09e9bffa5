//! In-memory storage backend.
//!
//! Mirrors the product's mocked persistence/network layer: hash maps with
//! an optional artificial delay per operation, plus JSON snapshot
//! import/export for seeding fixtures.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use fitsync_core::{Challenge, ChallengeId, Reminder, ReminderId, ReminderSettings, UserId};

use super::{Result, Storage, StorageError};

/// In-memory storage backend.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    reminders: HashMap<ReminderId, Reminder>,
    challenges: HashMap<ChallengeId, Challenge>,
    settings: ReminderSettings,
    latency: Option<Duration>,
}

/// Serializable snapshot of the whole store.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    reminders: Vec<Reminder>,
    challenges: Vec<Challenge>,
    settings: ReminderSettings,
}

impl MemoryStorage {
    /// Create an empty store with default settings and no latency.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an artificial delay to every operation, approximating a remote
    /// backend.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Serialize the whole store to a JSON snapshot.
    pub fn export(&self) -> Result<String> {
        let snapshot = Snapshot {
            reminders: self.reminders.values().cloned().collect(),
            challenges: self.challenges.values().cloned().collect(),
            settings: self.settings.clone(),
        };
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Build a store from a JSON snapshot.
    pub fn import(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        debug!(
            reminders = snapshot.reminders.len(),
            challenges = snapshot.challenges.len(),
            "imported storage snapshot"
        );
        Ok(Self {
            reminders: snapshot.reminders.into_iter().map(|r| (r.id, r)).collect(),
            challenges: snapshot
                .challenges
                .into_iter()
                .map(|c| (c.id, c))
                .collect(),
            settings: snapshot.settings,
            latency: None,
        })
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn save_reminder(&mut self, reminder: &Reminder) -> Result<()> {
        self.simulate_latency().await;
        self.reminders.insert(reminder.id, reminder.clone());
        Ok(())
    }

    async fn load_reminder(&self, id: ReminderId) -> Result<Option<Reminder>> {
        self.simulate_latency().await;
        Ok(self.reminders.get(&id).cloned())
    }

    async fn list_reminders(&self, user: Option<&UserId>) -> Result<Vec<Reminder>> {
        self.simulate_latency().await;
        let mut reminders: Vec<Reminder> = self
            .reminders
            .values()
            .filter(|r| user.map_or(true, |u| &r.user_id == u))
            .cloned()
            .collect();
        reminders.sort_by_key(|r| r.created_at);
        Ok(reminders)
    }

    async fn delete_reminder(&mut self, id: ReminderId) -> Result<()> {
        self.simulate_latency().await;
        self.reminders
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(format!("reminder {id}")))
    }

    async fn save_challenge(&mut self, challenge: &Challenge) -> Result<()> {
        self.simulate_latency().await;
        self.challenges.insert(challenge.id, challenge.clone());
        Ok(())
    }

    async fn load_challenge(&self, id: ChallengeId) -> Result<Option<Challenge>> {
        self.simulate_latency().await;
        Ok(self.challenges.get(&id).cloned())
    }

    async fn list_challenges(&self) -> Result<Vec<Challenge>> {
        self.simulate_latency().await;
        let mut challenges: Vec<Challenge> = self.challenges.values().cloned().collect();
        challenges.sort_by_key(|c| c.created_at);
        Ok(challenges)
    }

    async fn delete_challenge(&mut self, id: ChallengeId) -> Result<()> {
        self.simulate_latency().await;
        self.challenges
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(format!("challenge {id}")))
    }

    async fn load_settings(&self) -> Result<ReminderSettings> {
        self.simulate_latency().await;
        Ok(self.settings.clone())
    }

    async fn save_settings(&mut self, settings: &ReminderSettings) -> Result<()> {
        self.simulate_latency().await;
        self.settings = settings.clone();
        Ok(())
    }
}
