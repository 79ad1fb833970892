//! Decoded sleep session

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One night as recorded by the watch
///
/// Produced by any of the three decoders and never modified afterwards.
/// Wake moments keep the order in which the device reported them; folding
/// them across midnight is left to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepSession {
    date: Option<NaiveDate>,
    alarm: Option<NaiveTime>,
    window_minutes: u16,
    bedtime: Option<NaiveTime>,
    moments: Vec<NaiveTime>,
}

impl SleepSession {
    /// Constructs a session
    ///
    /// # Arguments
    ///
    /// * `date` - The night's calendar date, if known
    /// * `alarm` - The alarm time, if set
    /// * `window_minutes` - The smart-alarm window in minutes, 0 when disabled
    /// * `bedtime` - When the wearer went to bed, if known
    /// * `moments` - Wake moments in device order
    pub fn new(
        date: Option<NaiveDate>,
        alarm: Option<NaiveTime>,
        window_minutes: u16,
        bedtime: Option<NaiveTime>,
        moments: Vec<NaiveTime>,
    ) -> Self {
        Self {
            date,
            alarm,
            window_minutes,
            bedtime,
            moments,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn alarm(&self) -> Option<NaiveTime> {
        self.alarm
    }

    pub fn window_minutes(&self) -> u16 {
        self.window_minutes
    }

    pub fn has_window(&self) -> bool {
        self.window_minutes > 0
    }

    pub fn bedtime(&self) -> Option<NaiveTime> {
        self.bedtime
    }

    pub fn moments(&self) -> &[NaiveTime] {
        &self.moments
    }

    pub fn into_moments(self) -> Vec<NaiveTime> {
        self.moments
    }
}

fn fmt_optional<T: fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}

impl fmt::Display for SleepSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "date={} alarm={} window={} toBed={} moments={}",
            fmt_optional(&self.date),
            fmt_optional(&self.alarm),
            self.window_minutes,
            fmt_optional(&self.bedtime),
            self.moments.len()
        )
    }
}
