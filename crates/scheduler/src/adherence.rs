//! Medicine-dose adherence statistics.
//!
//! Bookkeeping for what happened to each scheduled dose of a medicine
//! reminder. The adherence rate counts taken against taken-plus-missed;
//! doses the user explicitly skipped are excluded.

use serde::{Deserialize, Serialize};

use fitsync_core::{ReminderId, Time};

/// Outcome of a single scheduled dose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoseOutcome {
    /// Acknowledged and taken
    Taken,
    /// Never acknowledged
    Missed,
    /// Explicitly skipped by the user
    Skipped,
}

/// One scheduled dose and what happened to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoseRecord {
    /// Reminder the dose belongs to
    pub reminder_id: ReminderId,

    /// When the dose was due
    pub due: Time,

    /// What happened
    pub outcome: DoseOutcome,

    /// When the outcome was recorded
    pub recorded_at: Time,
}

/// Aggregate adherence numbers over a set of dose records.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AdherenceStats {
    /// Records counted
    pub total: usize,

    /// Doses taken
    pub taken: usize,

    /// Doses missed
    pub missed: usize,

    /// Doses skipped
    pub skipped: usize,

    /// `taken / (taken + missed)`; `None` when nothing counts toward it
    pub rate: Option<f32>,
}

/// Append-only log of dose outcomes.
#[derive(Debug, Clone, Default)]
pub struct AdherenceLog {
    records: Vec<DoseRecord>,
}

impl AdherenceLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a dose.
    pub fn record(
        &mut self,
        reminder_id: ReminderId,
        due: Time,
        outcome: DoseOutcome,
        recorded_at: Time,
    ) {
        self.records.push(DoseRecord {
            reminder_id,
            due,
            outcome,
            recorded_at,
        });
    }

    /// All recorded doses.
    pub fn records(&self) -> &[DoseRecord] {
        &self.records
    }

    /// Aggregate stats over doses due at or after `since` (all when `None`).
    pub fn stats(&self, since: Option<Time>) -> AdherenceStats {
        self.compute(|record| since.map_or(true, |s| record.due >= s))
    }

    /// Aggregate stats for a single reminder.
    pub fn stats_for(&self, reminder_id: ReminderId, since: Option<Time>) -> AdherenceStats {
        self.compute(|record| {
            record.reminder_id == reminder_id && since.map_or(true, |s| record.due >= s)
        })
    }

    fn compute(&self, keep: impl Fn(&DoseRecord) -> bool) -> AdherenceStats {
        let mut stats = AdherenceStats::default();

        for record in self.records.iter().filter(|r| keep(r)) {
            stats.total += 1;
            match record.outcome {
                DoseOutcome::Taken => stats.taken += 1,
                DoseOutcome::Missed => stats.missed += 1,
                DoseOutcome::Skipped => stats.skipped += 1,
            }
        }

        let counted = stats.taken + stats.missed;
        if counted > 0 {
            stats.rate = Some(stats.taken as f32 / counted as f32);
        }
        stats
    }
}
