//! Reminder Scheduling
//!
//! Timer queue, delivery loop, quiet-hour suppression, and medicine
//! adherence statistics.

#![warn(missing_docs)]

pub mod adherence;
pub mod service;
pub mod state;

pub use adherence::{AdherenceLog, AdherenceStats, DoseOutcome, DoseRecord};
pub use service::ReminderScheduler;
pub use state::{
    Notification, PastDuePolicy, ReminderSpec, SchedulerError, SchedulerState,
};
