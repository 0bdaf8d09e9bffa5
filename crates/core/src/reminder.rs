//! Reminder model - one-time and recurring notifications.

use chrono::Months;
use serde::{Deserialize, Serialize};

use crate::id::{ReminderId, UserId};
use crate::Time;

/// A reminder is a scheduled notification, optionally tied to a domain
/// entity (challenge, medicine, etc.) and optionally recurring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    /// Unique identifier
    pub id: ReminderId,

    /// Owning user
    pub user_id: UserId,

    /// Short title shown in the notification
    pub title: String,

    /// Notification body
    pub message: String,

    /// What the reminder is about
    pub kind: ReminderKind,

    /// When the current occurrence is due
    pub scheduled_at: Time,

    /// Recurrence descriptor, if any
    pub recurrence: Option<Recurrence>,

    /// Disabled reminders are kept in the collection but never armed
    pub enabled: bool,

    /// Delivery priority
    pub priority: ReminderPriority,

    /// How many times the current occurrence has been snoozed
    pub snooze_count: u32,

    /// Last successful (non-suppressed) delivery
    pub last_triggered: Option<Time>,

    /// When created
    pub created_at: Time,
}

impl Reminder {
    /// Create a new enabled, non-recurring reminder due at `scheduled_at`.
    pub fn new(
        user_id: UserId,
        title: impl Into<String>,
        message: impl Into<String>,
        kind: ReminderKind,
        scheduled_at: Time,
    ) -> Self {
        Self {
            id: ReminderId::new(),
            user_id,
            title: title.into(),
            message: message.into(),
            kind,
            scheduled_at,
            recurrence: None,
            enabled: true,
            priority: ReminderPriority::Medium,
            snooze_count: 0,
            last_triggered: None,
            created_at: chrono::Utc::now(),
        }
    }
}

/// What a reminder is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReminderKind {
    /// Challenge check-in
    Challenge,
    /// Workout session
    Workout,
    /// Meal logging
    Meal,
    /// Medicine dose
    Medicine,
    /// Water intake
    Water,
    /// User-defined
    Custom,
}

impl ReminderKind {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderKind::Challenge => "challenge",
            ReminderKind::Workout => "workout",
            ReminderKind::Meal => "meal",
            ReminderKind::Medicine => "medicine",
            ReminderKind::Water => "water",
            ReminderKind::Custom => "custom",
        }
    }
}

/// Delivery priority of a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReminderPriority {
    /// Low priority
    Low,
    /// Normal priority
    Medium,
    /// High priority
    High,
}

impl Default for ReminderPriority {
    fn default() -> Self {
        ReminderPriority::Medium
    }
}

/// How often a recurring reminder repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    /// Every N days
    Daily,
    /// Every N weeks
    Weekly,
    /// Every N calendar months
    Monthly,
}

/// Recurrence descriptor: repeat every `interval` units of `frequency`,
/// optionally until `end_date`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recurrence {
    /// Unit of repetition
    pub frequency: Frequency,

    /// Repeat every N units. Zero is normalized to 1.
    pub interval: u32,

    /// No occurrence is scheduled past this point
    pub end_date: Option<Time>,
}

impl Recurrence {
    /// Create a recurrence with no end date.
    pub fn new(frequency: Frequency, interval: u32) -> Self {
        Self {
            frequency,
            interval: interval.max(1),
            end_date: None,
        }
    }

    /// Set the end date.
    pub fn until(mut self, end_date: Time) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Compute the occurrence after `from`.
    ///
    /// Returns `None` when the advanced time would exceed `end_date`
    /// (the reminder lineage ends) or the calendar arithmetic overflows.
    pub fn next_after(&self, from: Time) -> Option<Time> {
        let interval = self.interval.max(1);
        let next = match self.frequency {
            Frequency::Daily => {
                from.checked_add_signed(chrono::Duration::days(interval as i64))?
            }
            Frequency::Weekly => {
                from.checked_add_signed(chrono::Duration::weeks(interval as i64))?
            }
            Frequency::Monthly => from.checked_add_months(Months::new(interval))?,
        };

        match self.end_date {
            Some(end) if next > end => None,
            _ => Some(next),
        }
    }
}
