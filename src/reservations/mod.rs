//! Reservation store - the table availability the tools operate on.
//!
//! The book is a fixed grid of dates (a horizon starting at a given day) by
//! time slots (evenly spaced from the opening time). The key space is decided
//! at construction and never changes; only the value at a key moves between
//! empty and reserved.

mod book;

pub use book::{DaySlots, ReservationBook};

use chrono::{Days, NaiveDate, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Wire format for dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Wire format for slot times.
pub const TIME_FORMAT: &str = "%H:%M";

const MINUTES_PER_DAY: u64 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReservationError {
    #[error("Invalid date '{0}': expected a YYYY-MM-DD date within the booking horizon")]
    InvalidDate(String),

    #[error("Invalid time slot '{0}': expected one of the HH:MM slots of the day")]
    InvalidTimeSlot(String),

    #[error("Invalid party size {0}: must be a positive number of guests")]
    InvalidParty(i64),

    #[error("A reservation needs a non-empty guest name")]
    InvalidName,

    #[error("Slot {date} {time} is already booked by {holder}")]
    SlotTaken {
        date: String,
        time: String,
        holder: String,
    },
}

/// A booked table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub name: String,
    pub party_size: u32,
}

/// What `book` does when the slot already holds a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookingPolicy {
    /// Fail with `ReservationError::SlotTaken`.
    #[default]
    Reject,
    /// Replace the existing reservation (legacy behavior).
    Overwrite,
}

/// Shape of the reservation book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    /// Number of bookable days, today included
    pub horizon_days: u32,
    /// First slot of each day
    pub opening_time: NaiveTime,
    /// Slots per day
    pub slot_count: u32,
    /// Minutes between consecutive slots
    pub slot_minutes: u32,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            horizon_days: 6,
            opening_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
            slot_count: 8,
            slot_minutes: 30,
        }
    }
}

impl Schedule {
    /// Check that the schedule describes a non-empty grid within one day.
    pub fn validate(&self) -> Result<(), String> {
        if self.horizon_days == 0 {
            return Err("horizon must cover at least one day".to_string());
        }
        if self.slot_count == 0 {
            return Err("at least one slot per day is required".to_string());
        }
        if self.slot_minutes == 0 {
            return Err("slot spacing must be positive".to_string());
        }
        let opening = self.opening_time.signed_duration_since(NaiveTime::MIN).num_minutes() as u64;
        let last = opening + u64::from(self.slot_count - 1) * u64::from(self.slot_minutes);
        if last >= MINUTES_PER_DAY {
            return Err("time slots must not run past midnight".to_string());
        }
        Ok(())
    }

    /// Dates of the horizon starting at `today`, in order.
    pub fn dates(&self, today: NaiveDate) -> Vec<NaiveDate> {
        (0..u64::from(self.horizon_days))
            .filter_map(|i| today.checked_add_days(Days::new(i)))
            .collect()
    }

    /// Slot times of one day, in order.
    pub fn time_slots(&self) -> Vec<NaiveTime> {
        (0..i64::from(self.slot_count))
            .map_while(|i| {
                let offset = TimeDelta::try_minutes(i * i64::from(self.slot_minutes))?;
                let (time, wrapped) = self.opening_time.overflowing_add_signed(offset);
                (wrapped == 0).then_some(time)
            })
            .collect()
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate, ReservationError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| ReservationError::InvalidDate(value.to_string()))
}

/// Parse an `HH:MM` slot time.
pub fn parse_time(value: &str) -> Result<NaiveTime, ReservationError> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT)
        .map_err(|_| ReservationError::InvalidTimeSlot(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_matches_evening_service() {
        let schedule = Schedule::default();
        let times: Vec<String> = schedule
            .time_slots()
            .iter()
            .map(|t| t.format(TIME_FORMAT).to_string())
            .collect();
        assert_eq!(
            times,
            vec!["18:00", "18:30", "19:00", "19:30", "20:00", "20:30", "21:00", "21:30"]
        );
    }

    #[test]
    fn horizon_starts_today_and_spans_month_boundaries() {
        let schedule = Schedule::default();
        let today = NaiveDate::from_ymd_opt(2024, 1, 29).unwrap();
        let dates = schedule.dates(today);
        assert_eq!(dates.len(), 6);
        assert_eq!(dates[0], today);
        assert_eq!(dates[5], NaiveDate::from_ymd_opt(2024, 2, 3).unwrap());
    }

    #[test]
    fn validate_rejects_grid_past_midnight() {
        let schedule = Schedule {
            opening_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            slot_count: 5,
            slot_minutes: 30,
            ..Schedule::default()
        };
        assert!(schedule.validate().is_err());

        let schedule = Schedule {
            slot_count: 4,
            ..schedule
        };
        assert!(schedule.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_grids() {
        for schedule in [
            Schedule {
                horizon_days: 0,
                ..Schedule::default()
            },
            Schedule {
                slot_count: 0,
                ..Schedule::default()
            },
            Schedule {
                slot_minutes: 0,
                ..Schedule::default()
            },
        ] {
            assert!(schedule.validate().is_err(), "{:?}", schedule);
        }
    }

    #[test]
    fn parse_helpers_map_to_validation_errors() {
        assert_eq!(
            parse_date("2024-13-01"),
            Err(ReservationError::InvalidDate("2024-13-01".to_string()))
        );
        assert_eq!(
            parse_time("7pm"),
            Err(ReservationError::InvalidTimeSlot("7pm".to_string()))
        );
        assert_eq!(
            parse_time(" 19:00 ").unwrap(),
            NaiveTime::from_hms_opt(19, 0, 0).unwrap()
        );
    }
}
