//! Next-alarm parsing and resolution
//!
//! The device reports its next alarm as a short "weekday + time-of-day"
//! string, either 12-hour (`"Fri 6:00 AM"`) or 24-hour (`"Fri 06:00"`).
//! The format is detected by the presence of "am"/"pm" (case-insensitive).
//!
//! Resolution anchors the alarm to the current week: the date is today
//! advanced by `(alarm_weekday - today_weekday + 7) % 7` days. An alarm on
//! today's weekday always resolves to today, even if its time has passed.

use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime, Weekday};

use super::errors::DomainError;

/// A parsed alarm: weekday and time-of-day, without a date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmTime {
    pub weekday: Weekday,
    pub time: NaiveTime,
}

impl AlarmTime {
    /// Anchor the alarm to the week containing `now`
    pub fn resolve(&self, now: NaiveDateTime) -> NaiveDateTime {
        let alarm_day = i64::from(self.weekday.num_days_from_sunday());
        let today = i64::from(now.weekday().num_days_from_sunday());
        let days_ahead = (alarm_day - today + 7) % 7;

        (now.date() + Duration::days(days_ahead)).and_time(self.time)
    }
}

/// Parse a raw next-alarm string
///
/// # Errors
/// Returns [`DomainError::InvalidAlarm`] if the string matches neither format
pub fn parse_alarm(raw: &str) -> Result<AlarmTime, DomainError> {
    let invalid = || DomainError::InvalidAlarm(raw.to_string());

    let lowered = raw.trim().to_ascii_lowercase();
    let twelve_hour = lowered.contains("am") || lowered.contains("pm");

    let mut tokens = lowered.split_whitespace();
    let weekday: Weekday = tokens
        .next()
        .ok_or_else(invalid)?
        .parse()
        .map_err(|_| invalid())?;
    let clock = tokens.next().ok_or_else(invalid)?;

    let (clock, meridiem) = if twelve_hour {
        match tokens.next() {
            Some(m) => (clock, m),
            // "6:00am" with no separating space
            None if clock.len() > 2 => clock.split_at(clock.len() - 2),
            None => return Err(invalid()),
        }
    } else {
        (clock, "")
    };

    if tokens.next().is_some() {
        return Err(invalid());
    }

    let (hour, minute) = clock.split_once(':').ok_or_else(invalid)?;
    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;

    let hour = match meridiem {
        "" => hour,
        "am" if (1..=12).contains(&hour) => hour % 12,
        "pm" if (1..=12).contains(&hour) => hour % 12 + 12,
        _ => return Err(invalid()),
    };

    let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)?;
    Ok(AlarmTime { weekday, time })
}

/// Resolve a raw next-alarm string to an absolute local instant
///
/// Returns `None` for missing, empty or malformed input. Malformed input is
/// logged at warn level.
pub fn resolve_next_alarm(raw: Option<&str>, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match parse_alarm(raw) {
        Ok(alarm) => Some(alarm.resolve(now)),
        Err(e) => {
            tracing::warn!(raw = %raw, error = %e, "Couldn't parse next alarm string");
            None
        }
    }
}
