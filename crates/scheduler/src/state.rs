//! Scheduler state - the reminder collection, timer queue, and settings.
//!
//! All operations take `now` explicitly, so the state can be driven by the
//! real delivery loop in [`crate::service`] or stepped manually in tests.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

use serde::Serialize;
use tracing::debug;

use fitsync_core::{
    Recurrence, Reminder, ReminderId, ReminderKind, ReminderPriority, ReminderSettings,
    SettingsPatch, Time, UserId,
};

/// Errors from scheduler operations.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// Unknown reminder ID
    #[error("reminder not found: {0}")]
    NotFound(ReminderId),

    /// The configured snooze cap has been reached
    #[error("snooze limit reached ({limit})")]
    SnoozeLimitReached {
        /// The cap from settings
        limit: u32,
    },
}

/// What to do with a reminder whose scheduled time has already passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PastDuePolicy {
    /// Accept the reminder but never arm it.
    #[default]
    Drop,
    /// Arm it for immediate delivery.
    FireImmediately,
}

/// Specification for scheduling a reminder.
#[derive(Debug, Clone)]
pub struct ReminderSpec {
    /// Owning user
    pub user_id: UserId,
    /// Notification title
    pub title: String,
    /// Notification body
    pub message: String,
    /// What the reminder is about
    pub kind: ReminderKind,
    /// When the reminder is due
    pub scheduled_at: Time,
    /// Recurrence descriptor, if any
    pub recurrence: Option<Recurrence>,
    /// Delivery priority
    pub priority: ReminderPriority,
    /// Whether the reminder should be armed at all
    pub enabled: bool,
}

impl ReminderSpec {
    /// Create an enabled, non-recurring, medium-priority spec.
    pub fn new(
        user_id: UserId,
        title: impl Into<String>,
        message: impl Into<String>,
        kind: ReminderKind,
        scheduled_at: Time,
    ) -> Self {
        Self {
            user_id,
            title: title.into(),
            message: message.into(),
            kind,
            scheduled_at,
            recurrence: None,
            priority: ReminderPriority::Medium,
            enabled: true,
        }
    }

    /// Set the recurrence descriptor.
    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    /// Set the delivery priority.
    pub fn with_priority(mut self, priority: ReminderPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Create the reminder disabled (stored but never armed).
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// A notification ready for delivery to a sink.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    /// The reminder that fired
    pub reminder_id: ReminderId,
    /// Notification title
    pub title: String,
    /// Notification body
    pub message: String,
    /// What the reminder is about
    pub kind: ReminderKind,
    /// Delivery priority
    pub priority: ReminderPriority,
    /// Sound toggle from settings at fire time
    pub sound: bool,
    /// Vibration toggle from settings at fire time
    pub vibration: bool,
    /// When the reminder fired
    pub fired_at: Time,
}

/// Arm state of a tracked reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArmState {
    /// A live timer-queue entry with this generation exists.
    Armed(u64),
    /// No pending occurrence.
    Disarmed,
}

#[derive(Debug)]
struct Tracked {
    reminder: Reminder,
    state: ArmState,
}

/// Timer-queue entry. Entries are invalidated by bumping the owning
/// reminder's armed generation and skipped lazily when popped.
#[derive(Debug, Clone, Copy)]
struct DueEntry {
    due: Time,
    generation: u64,
    id: ReminderId,
}

impl Ord for DueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.generation).cmp(&(other.due, other.generation))
    }
}

impl PartialOrd for DueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for DueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DueEntry {}

/// Owned scheduler state: reminders, a min-heap of due times, and the
/// settings singleton. One timer queue serves every reminder; there is no
/// per-reminder OS timer.
pub struct SchedulerState {
    reminders: HashMap<ReminderId, Tracked>,
    queue: BinaryHeap<Reverse<DueEntry>>,
    settings: ReminderSettings,
    past_due: PastDuePolicy,
    next_generation: u64,
}

impl SchedulerState {
    /// Create empty state with the given settings.
    pub fn new(settings: ReminderSettings) -> Self {
        Self {
            reminders: HashMap::new(),
            queue: BinaryHeap::new(),
            settings,
            past_due: PastDuePolicy::default(),
            next_generation: 0,
        }
    }

    /// Set the past-due policy.
    pub fn with_past_due_policy(mut self, policy: PastDuePolicy) -> Self {
        self.past_due = policy;
        self
    }

    /// Current settings.
    pub fn settings(&self) -> &ReminderSettings {
        &self.settings
    }

    /// Merge a partial settings update. Takes effect for arm and fire
    /// decisions made after this call; already-armed timers keep their
    /// due times.
    pub fn update_settings(&mut self, patch: SettingsPatch) {
        self.settings.apply(patch);
    }

    /// Number of reminders in the collection (armed or not).
    pub fn len(&self) -> usize {
        self.reminders.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }

    /// Look up a reminder.
    pub fn get(&self, id: ReminderId) -> Option<&Reminder> {
        self.reminders.get(&id).map(|t| &t.reminder)
    }

    /// All reminders, ordered by scheduled time.
    pub fn list(&self) -> Vec<Reminder> {
        let mut reminders: Vec<Reminder> = self
            .reminders
            .values()
            .map(|t| t.reminder.clone())
            .collect();
        reminders.sort_by_key(|r| r.scheduled_at);
        reminders
    }

    /// Accept a reminder: assign identity and creation timestamp, then arm
    /// it unless it is disabled or past due under [`PastDuePolicy::Drop`].
    pub fn schedule(&mut self, spec: ReminderSpec, now: Time) -> Reminder {
        let mut reminder = Reminder {
            id: ReminderId::new(),
            user_id: spec.user_id,
            title: spec.title,
            message: spec.message,
            kind: spec.kind,
            scheduled_at: spec.scheduled_at,
            recurrence: spec.recurrence,
            enabled: spec.enabled,
            priority: spec.priority,
            snooze_count: 0,
            last_triggered: None,
            created_at: now,
        };

        let due = if !reminder.enabled {
            None
        } else if reminder.scheduled_at >= now {
            Some(reminder.scheduled_at)
        } else {
            match self.past_due {
                PastDuePolicy::Drop => {
                    debug!(reminder = %reminder.id, "past-due reminder accepted but not armed");
                    None
                }
                PastDuePolicy::FireImmediately => {
                    reminder.scheduled_at = now;
                    Some(now)
                }
            }
        };

        let id = reminder.id;
        self.reminders.insert(
            id,
            Tracked {
                reminder: reminder.clone(),
                state: ArmState::Disarmed,
            },
        );
        if let Some(due) = due {
            self.arm(id, due);
        }

        reminder
    }

    /// Disarm and remove a reminder. Idempotent: an unknown ID is a no-op
    /// and returns `false`.
    pub fn cancel(&mut self, id: ReminderId) -> bool {
        // The heap entry (if any) goes stale and is skipped when popped.
        self.reminders.remove(&id).is_some()
    }

    /// Push a reminder's scheduled time forward by the configured snooze
    /// delay and re-arm it.
    pub fn snooze(&mut self, id: ReminderId, now: Time) -> Result<Reminder, SchedulerError> {
        let minutes = self.settings.default_snooze_minutes;
        let cap = self.settings.max_snoozes;

        let tracked = self
            .reminders
            .get_mut(&id)
            .ok_or(SchedulerError::NotFound(id))?;

        if let Some(limit) = cap {
            if tracked.reminder.snooze_count >= limit {
                return Err(SchedulerError::SnoozeLimitReached { limit });
            }
        }

        tracked.reminder.snooze_count += 1;
        tracked.reminder.scheduled_at = now + chrono::Duration::minutes(minutes as i64);
        let due = tracked.reminder.scheduled_at;
        let enabled = tracked.reminder.enabled;
        let snapshot = tracked.reminder.clone();

        if enabled {
            self.arm(id, due);
        }
        Ok(snapshot)
    }

    /// Clear every pending timer without removing reminders from the
    /// collection. Intended for teardown, not cancellation.
    pub fn disarm_all(&mut self) {
        self.queue.clear();
        for tracked in self.reminders.values_mut() {
            tracked.state = ArmState::Disarmed;
        }
    }

    /// Earliest live due time, if any. Pops stale entries off the top of
    /// the queue as a side effect.
    pub fn next_due(&mut self) -> Option<Time> {
        while let Some(Reverse(entry)) = self.queue.peek().copied() {
            if self.is_live(&entry) {
                return Some(entry.due);
            }
            self.queue.pop();
        }
        None
    }

    /// Fire every reminder due at or before `now`.
    ///
    /// Deliveries inside quiet hours are suppressed: dropped, not queued,
    /// and `last_triggered` is left untouched. Recurring reminders advance
    /// to their next occurrence either way; a lineage ends when advancing
    /// would pass the recurrence end date.
    pub fn fire_due(&mut self, now: Time) -> Vec<Notification> {
        let settings = self.settings.clone();
        let mut fired = Vec::new();

        loop {
            let entry = match self.queue.peek() {
                Some(Reverse(entry)) if entry.due <= now => *entry,
                _ => break,
            };
            self.queue.pop();

            let mut rearm = None;
            {
                let Some(tracked) = self.reminders.get_mut(&entry.id) else {
                    continue; // cancelled
                };
                if tracked.state != ArmState::Armed(entry.generation) {
                    continue; // superseded by snooze or disarm
                }
                tracked.state = ArmState::Disarmed;

                if !tracked.reminder.enabled {
                    continue;
                }

                if settings.is_quiet(now) {
                    debug!(reminder = %entry.id, "delivery suppressed by quiet hours");
                } else {
                    tracked.reminder.last_triggered = Some(now);
                    fired.push(Notification {
                        reminder_id: tracked.reminder.id,
                        title: tracked.reminder.title.clone(),
                        message: tracked.reminder.message.clone(),
                        kind: tracked.reminder.kind,
                        priority: tracked.reminder.priority,
                        sound: settings.sound,
                        vibration: settings.vibration,
                        fired_at: now,
                    });
                }

                if let Some(recurrence) = tracked.reminder.recurrence {
                    match recurrence.next_after(tracked.reminder.scheduled_at) {
                        Some(next) => {
                            // The same entity advances; no new reminder is created.
                            tracked.reminder.scheduled_at = next;
                            tracked.reminder.snooze_count = 0;
                            rearm = Some(next);
                        }
                        None => {
                            debug!(reminder = %entry.id, "recurrence lineage ended");
                        }
                    }
                }
            }
            if let Some(due) = rearm {
                self.arm(entry.id, due);
            }
        }

        fired
    }

    fn arm(&mut self, id: ReminderId, due: Time) {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.queue.push(Reverse(DueEntry { due, generation, id }));
        if let Some(tracked) = self.reminders.get_mut(&id) {
            tracked.state = ArmState::Armed(generation);
        }
    }

    fn is_live(&self, entry: &DueEntry) -> bool {
        self.reminders
            .get(&entry.id)
            .map(|t| t.state == ArmState::Armed(entry.generation))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use fitsync_core::{Frequency, QuietHours};

    fn at(h: u32, m: u32) -> Time {
        Utc.with_ymd_and_hms(2024, 3, 10, h, m, 0).unwrap()
    }

    fn next_day(h: u32, m: u32) -> Time {
        Utc.with_ymd_and_hms(2024, 3, 11, h, m, 0).unwrap()
    }

    fn spec(title: &str, due: Time) -> ReminderSpec {
        ReminderSpec::new(
            UserId::new("user-1"),
            title,
            "time to move",
            ReminderKind::Workout,
            due,
        )
    }

    fn quiet_night() -> ReminderSettings {
        ReminderSettings {
            quiet_hours: Some(QuietHours::parse("22:00", "07:00").unwrap()),
            ..Default::default()
        }
    }

    #[test]
    fn test_schedule_and_fire() {
        let mut state = SchedulerState::new(ReminderSettings::default());
        let now = at(7, 0);
        let reminder = state.schedule(spec("stretch", at(8, 0)), now);

        assert_eq!(state.next_due(), Some(at(8, 0)));
        assert!(state.fire_due(at(7, 59)).is_empty());

        let fired = state.fire_due(at(8, 0));
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].reminder_id, reminder.id);
        assert_eq!(fired[0].title, "stretch");
        assert!(fired[0].sound);

        let stored = state.get(reminder.id).unwrap();
        assert_eq!(stored.last_triggered, Some(at(8, 0)));
        // Non-recurring: nothing left to fire.
        assert_eq!(state.next_due(), None);
    }

    #[test]
    fn test_quiet_hours_suppress_delivery() {
        let mut state = SchedulerState::new(quiet_night());
        let reminder = state.schedule(spec("late", at(23, 0)), at(21, 0));

        let fired = state.fire_due(at(23, 0));
        assert!(fired.is_empty());
        // Dropped silently: no lastTriggered update either.
        assert!(state.get(reminder.id).unwrap().last_triggered.is_none());
    }

    #[test]
    fn test_quiet_hours_window_spans_midnight() {
        let mut state = SchedulerState::new(quiet_night());
        state.schedule(spec("early", at(6, 30)), at(6, 0));
        assert!(state.fire_due(at(6, 30)).is_empty());

        state.schedule(spec("morning", at(8, 0)), at(7, 30));
        assert_eq!(state.fire_due(at(8, 0)).len(), 1);
    }

    #[test]
    fn test_daily_recurrence_advances_same_entity() {
        let mut state = SchedulerState::new(quiet_night());
        let reminder = state.schedule(
            spec("daily check-in", at(8, 0))
                .with_recurrence(Recurrence::new(Frequency::Daily, 1)),
            at(7, 30),
        );

        // 08:00 is outside quiet hours: delivered.
        let fired = state.fire_due(at(8, 0));
        assert_eq!(fired.len(), 1);

        // The same entity advanced by exactly one day and is re-armed.
        let stored = state.get(reminder.id).unwrap();
        assert_eq!(stored.scheduled_at, next_day(8, 0));
        assert_eq!(state.len(), 1);
        assert_eq!(state.next_due(), Some(next_day(8, 0)));
    }

    #[test]
    fn test_recurrence_advances_even_when_suppressed() {
        let mut state = SchedulerState::new(quiet_night());
        let reminder = state.schedule(
            spec("nightly", at(23, 0))
                .with_recurrence(Recurrence::new(Frequency::Daily, 1)),
            at(22, 30),
        );

        assert!(state.fire_due(at(23, 0)).is_empty());
        let stored = state.get(reminder.id).unwrap();
        assert!(stored.last_triggered.is_none());
        assert_eq!(stored.scheduled_at, next_day(23, 0));
        assert_eq!(state.next_due(), Some(next_day(23, 0)));
    }

    #[test]
    fn test_recurrence_end_date_stops_rearming() {
        let mut state = SchedulerState::new(ReminderSettings::default());
        let reminder = state.schedule(
            spec("short-lived", at(8, 0))
                .with_recurrence(Recurrence::new(Frequency::Daily, 1).until(at(20, 0))),
            at(7, 0),
        );

        assert_eq!(state.fire_due(at(8, 0)).len(), 1);
        // Advancing to tomorrow would pass the end date: lineage ends,
        // but the reminder stays in the collection.
        assert_eq!(state.next_due(), None);
        assert!(state.get(reminder.id).is_some());
    }

    #[test]
    fn test_past_due_dropped_by_default() {
        let mut state = SchedulerState::new(ReminderSettings::default());
        let reminder = state.schedule(spec("yesterday", at(6, 0)), at(9, 0));

        // Accepted but never armed.
        assert!(state.get(reminder.id).is_some());
        assert_eq!(state.next_due(), None);
        assert!(state.fire_due(at(23, 59)).is_empty());
    }

    #[test]
    fn test_past_due_fire_immediately_policy() {
        let mut state = SchedulerState::new(ReminderSettings::default())
            .with_past_due_policy(PastDuePolicy::FireImmediately);
        let reminder = state.schedule(spec("yesterday", at(6, 0)), at(9, 0));

        assert_eq!(state.get(reminder.id).unwrap().scheduled_at, at(9, 0));
        let fired = state.fire_due(at(9, 0));
        assert_eq!(fired.len(), 1);
    }

    #[test]
    fn test_disabled_reminder_never_armed() {
        let mut state = SchedulerState::new(ReminderSettings::default());
        state.schedule(spec("off", at(10, 0)).disabled(), at(9, 0));

        assert_eq!(state.len(), 1);
        assert_eq!(state.next_due(), None);
        assert!(state.fire_due(at(10, 0)).is_empty());
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut state = SchedulerState::new(ReminderSettings::default());
        let reminder = state.schedule(spec("gone", at(10, 0)), at(9, 0));

        assert!(state.cancel(reminder.id));
        assert!(!state.cancel(reminder.id));
        assert_eq!(state.next_due(), None);
        assert!(state.fire_due(at(10, 0)).is_empty());
    }

    #[test]
    fn test_snooze_pushes_forward_and_counts() {
        let mut state = SchedulerState::new(ReminderSettings::default());
        let reminder = state.schedule(spec("snoozy", at(10, 0)), at(9, 0));

        let snoozed = state.snooze(reminder.id, at(10, 0)).unwrap();
        assert_eq!(snoozed.snooze_count, 1);
        assert_eq!(snoozed.scheduled_at, at(10, 10));

        // The original 10:00 entry is stale; only 10:10 fires.
        assert!(state.fire_due(at(10, 0)).is_empty());
        assert_eq!(state.fire_due(at(10, 10)).len(), 1);
    }

    #[test]
    fn test_snooze_unknown_id() {
        let mut state = SchedulerState::new(ReminderSettings::default());
        let err = state.snooze(ReminderId::new(), at(9, 0)).unwrap_err();
        assert!(matches!(err, SchedulerError::NotFound(_)));
    }

    #[test]
    fn test_snooze_cap_enforced_when_configured() {
        let settings = ReminderSettings {
            max_snoozes: Some(2),
            ..Default::default()
        };
        let mut state = SchedulerState::new(settings);
        let reminder = state.schedule(spec("capped", at(10, 0)), at(9, 0));

        assert!(state.snooze(reminder.id, at(10, 0)).is_ok());
        assert!(state.snooze(reminder.id, at(10, 5)).is_ok());
        let err = state.snooze(reminder.id, at(10, 10)).unwrap_err();
        assert!(matches!(err, SchedulerError::SnoozeLimitReached { limit: 2 }));
        assert_eq!(state.get(reminder.id).unwrap().snooze_count, 2);
    }

    #[test]
    fn test_snooze_uncapped_by_default() {
        let mut state = SchedulerState::new(ReminderSettings::default());
        let reminder = state.schedule(spec("forever", at(10, 0)), at(9, 0));

        for i in 0..10 {
            let snoozed = state.snooze(reminder.id, at(10, i)).unwrap();
            assert_eq!(snoozed.snooze_count, i + 1);
        }
    }

    #[test]
    fn test_update_settings_applies_to_later_fires() {
        let mut state = SchedulerState::new(ReminderSettings::default());
        state.schedule(spec("one", at(12, 30)), at(12, 0));
        state.schedule(spec("two", at(13, 30)), at(12, 0));

        // Make 13:00-14:00 quiet after both were armed.
        state.update_settings(SettingsPatch {
            quiet_hours: Some(Some(QuietHours::parse("13:00", "14:00").unwrap())),
            ..Default::default()
        });

        assert_eq!(state.fire_due(at(12, 30)).len(), 1);
        assert!(state.fire_due(at(13, 30)).is_empty());
    }

    #[test]
    fn test_disarm_all_keeps_collection() {
        let mut state = SchedulerState::new(ReminderSettings::default());
        state.schedule(spec("a", at(10, 0)), at(9, 0));
        state.schedule(spec("b", at(11, 0)), at(9, 0));

        state.disarm_all();
        assert_eq!(state.len(), 2);
        assert_eq!(state.next_due(), None);
        assert!(state.fire_due(at(12, 0)).is_empty());
    }

    #[test]
    fn test_multiple_due_fire_in_one_pass() {
        let mut state = SchedulerState::new(ReminderSettings::default());
        state.schedule(spec("a", at(10, 0)), at(9, 0));
        state.schedule(spec("b", at(10, 30)), at(9, 0));
        state.schedule(spec("c", at(11, 0)), at(9, 0));

        let fired = state.fire_due(at(10, 30));
        assert_eq!(fired.len(), 2);
        assert_eq!(state.next_due(), Some(at(11, 0)));
    }
}
