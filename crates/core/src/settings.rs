//! Process-wide reminder delivery settings.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::Time;

/// Errors that can occur while building settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Quiet-hours boundary was not a valid HH:MM time
    #[error("invalid quiet-hours time '{0}': expected HH:MM")]
    InvalidTime(String),
}

/// A time-of-day window during which notifications are suppressed.
///
/// The window is half-open: `start` is inside, `end` is outside. A start
/// later than the end means the window spans midnight (22:00-07:00
/// suppresses from 22:00 through 06:59 the next day).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    /// First suppressed minute
    pub start: NaiveTime,

    /// First minute past the window
    pub end: NaiveTime,
}

impl QuietHours {
    /// Parse a window from "HH:MM" boundary strings.
    pub fn parse(start: &str, end: &str) -> Result<Self, SettingsError> {
        let parse = |s: &str| {
            NaiveTime::parse_from_str(s, "%H:%M")
                .map_err(|_| SettingsError::InvalidTime(s.to_string()))
        };
        Ok(Self {
            start: parse(start)?,
            end: parse(end)?,
        })
    }

    /// Whether the given time of day falls inside the window.
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.start == self.end {
            // Empty window
            false
        } else if self.start < self.end {
            self.start <= t && t < self.end
        } else {
            // Spans midnight
            t >= self.start || t < self.end
        }
    }
}

/// Process-wide reminder settings, read by the scheduler at fire time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    /// Play a sound on delivery
    pub sound: bool,

    /// Vibrate on delivery
    pub vibration: bool,

    /// Suppression window, if configured
    pub quiet_hours: Option<QuietHours>,

    /// How far a snooze pushes the scheduled time
    pub default_snooze_minutes: u32,

    /// Maximum snoozes per occurrence; `None` means uncapped
    pub max_snoozes: Option<u32>,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            sound: true,
            vibration: true,
            quiet_hours: None,
            default_snooze_minutes: 10,
            max_snoozes: None,
        }
    }
}

impl ReminderSettings {
    /// Merge a partial update into these settings.
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(sound) = patch.sound {
            self.sound = sound;
        }
        if let Some(vibration) = patch.vibration {
            self.vibration = vibration;
        }
        if let Some(quiet_hours) = patch.quiet_hours {
            self.quiet_hours = quiet_hours;
        }
        if let Some(minutes) = patch.default_snooze_minutes {
            self.default_snooze_minutes = minutes;
        }
        if let Some(max_snoozes) = patch.max_snoozes {
            self.max_snoozes = max_snoozes;
        }
    }

    /// Whether the given instant falls inside quiet hours.
    pub fn is_quiet(&self, at: Time) -> bool {
        self.quiet_hours
            .map(|window| window.contains(at.time()))
            .unwrap_or(false)
    }
}

/// A partial settings update. `None` fields are left untouched; the
/// nested options allow clearing `quiet_hours` and `max_snoozes`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsPatch {
    /// New sound toggle
    pub sound: Option<bool>,

    /// New vibration toggle
    pub vibration: Option<bool>,

    /// New quiet-hours window (or `Some(None)` to clear it)
    pub quiet_hours: Option<Option<QuietHours>>,

    /// New snooze delay in minutes
    pub default_snooze_minutes: Option<u32>,

    /// New snooze cap (or `Some(None)` to remove the cap)
    pub max_snoozes: Option<Option<u32>>,
}
