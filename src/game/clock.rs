//! World calendar.
//!
//! One game minute passes every [`TICKS_PER_MINUTE`] ticks unless an
//! external authority owns the clock.

use serde::{Deserialize, Serialize};

use crate::game::state::WorldState;

/// Ticks per game minute.
pub const TICKS_PER_MINUTE: u32 = 4;
/// Minutes per hour.
pub const MINUTES_PER_HOUR: u32 = 60;
/// Hours per day.
pub const HOURS_PER_DAY: u32 = 24;
/// Days per month (days are 1-based).
pub const DAYS_PER_MONTH: u32 = 28;
/// Months per year (months are 1-based).
pub const MONTHS_PER_YEAR: u32 = 13;

/// Who advances the world clock.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockAuthority {
    /// The stepper advances the calendar.
    #[default]
    Local,
    /// Time is set externally; the stepper leaves the calendar alone.
    External,
}

/// Whether the clock ticks over on `tick`.
#[inline]
pub fn is_minute_tick(tick: u32) -> bool {
    tick % TICKS_PER_MINUTE == 0
}

impl WorldState {
    /// Advance one minute, carrying into hour, day, month and year.
    pub fn advance_minute(&mut self) {
        self.minute = self.minute.wrapping_add(1);
        if self.minute < MINUTES_PER_HOUR {
            return;
        }
        self.minute = 0;
        self.hour = self.hour.wrapping_add(1);
        if self.hour < HOURS_PER_DAY {
            return;
        }
        self.hour = 0;
        self.day = self.day.wrapping_add(1);
        if self.day <= DAYS_PER_MONTH {
            return;
        }
        self.day = 1;
        self.month = self.month.wrapping_add(1);
        if self.month <= MONTHS_PER_YEAR {
            return;
        }
        self.month = 1;
        self.year = self.year.wrapping_add(1);
    }

    /// Coarse label for the hour.
    pub fn time_of_day(&self) -> &'static str {
        match self.hour {
            0..=4 => "Midnight",
            5..=7 => "Dawn",
            8..=11 => "Morning",
            12..=16 => "Afternoon",
            17..=19 => "Dusk",
            _ => "Night",
        }
    }
}
