//! Async reminder scheduling service.
//!
//! One driver loop serves every reminder: it sleeps until the earliest due
//! time, fires whatever is due, and forwards notifications over a channel.
//! Consumers (UI alerts, OS notifications, push) sit on the receiving end,
//! so the core never touches a concrete delivery mechanism.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, watch, Mutex, Notify};
use tracing::{debug, warn};

use fitsync_core::{Reminder, ReminderId, ReminderSettings, SettingsPatch};

use crate::state::{
    Notification, PastDuePolicy, ReminderSpec, SchedulerError, SchedulerState,
};

/// Notification channel capacity. Delivery is best-effort: when the
/// consumer falls this far behind, further notifications are dropped.
const NOTIFICATION_BUFFER: usize = 64;

/// Handle to the reminder scheduling service.
///
/// Cloneable; every clone shares the same state and driver loop. All
/// mutations serialize through one mutex, so the handle is safe to use
/// from multiple tasks.
#[derive(Clone)]
pub struct ReminderScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<SchedulerState>,
    wake: Notify,
    shutdown: watch::Sender<bool>,
}

impl ReminderScheduler {
    /// Create the scheduler and spawn its driver loop.
    ///
    /// Returns the handle and the notification stream. Dropping the
    /// receiver does not stop the loop; notifications are then discarded.
    pub fn spawn(
        settings: ReminderSettings,
        policy: PastDuePolicy,
    ) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(NOTIFICATION_BUFFER);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let inner = Arc::new(Inner {
            state: Mutex::new(SchedulerState::new(settings).with_past_due_policy(policy)),
            wake: Notify::new(),
            shutdown: shutdown_tx,
        });

        tokio::spawn(run_loop(inner.clone(), tx, shutdown_rx));
        (Self { inner }, rx)
    }

    /// Schedule a reminder. Returns the stored entity with its assigned
    /// identity and creation timestamp.
    pub async fn schedule(&self, spec: ReminderSpec) -> Reminder {
        let reminder = self.inner.state.lock().await.schedule(spec, Utc::now());
        self.inner.wake.notify_one();
        reminder
    }

    /// Cancel a reminder. Idempotent; returns whether it existed.
    pub async fn cancel(&self, id: ReminderId) -> bool {
        let existed = self.inner.state.lock().await.cancel(id);
        self.inner.wake.notify_one();
        existed
    }

    /// Snooze a reminder by the configured delay.
    pub async fn snooze(&self, id: ReminderId) -> Result<Reminder, SchedulerError> {
        let result = self.inner.state.lock().await.snooze(id, Utc::now());
        self.inner.wake.notify_one();
        result
    }

    /// Merge a partial settings update; affects subsequent fires only.
    pub async fn update_settings(&self, patch: SettingsPatch) {
        self.inner.state.lock().await.update_settings(patch);
        self.inner.wake.notify_one();
    }

    /// Look up a reminder.
    pub async fn get(&self, id: ReminderId) -> Option<Reminder> {
        self.inner.state.lock().await.get(id).cloned()
    }

    /// All reminders, ordered by scheduled time.
    pub async fn list(&self) -> Vec<Reminder> {
        self.inner.state.lock().await.list()
    }

    /// Stop the driver loop and clear every pending timer, keeping the
    /// reminder collection intact. Teardown, not cancellation.
    pub async fn cleanup(&self) {
        self.inner.state.lock().await.disarm_all();
        let _ = self.inner.shutdown.send(true);
        self.inner.wake.notify_one();
    }
}

async fn run_loop(
    inner: Arc<Inner>,
    tx: mpsc::Sender<Notification>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        if *shutdown.borrow() {
            break;
        }

        let next = inner.state.lock().await.next_due();
        match next {
            Some(due) => {
                let now = Utc::now();
                if due <= now {
                    let fired = inner.state.lock().await.fire_due(now);
                    for notification in fired {
                        debug!(reminder = %notification.reminder_id, "reminder fired");
                        if let Err(err) = tx.try_send(notification) {
                            warn!("notification dropped: {err}");
                        }
                    }
                    continue;
                }

                let wait = (due - now).to_std().unwrap_or_default();
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {}
                    _ = inner.wake.notified() => {}
                    _ = shutdown.changed() => {}
                }
            }
            None => {
                tokio::select! {
                    _ = inner.wake.notified() => {}
                    _ = shutdown.changed() => {}
                }
            }
        }
    }
    debug!("reminder scheduler loop stopped");
}
