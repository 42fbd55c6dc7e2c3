//! In-memory reservation book (non-persistent).

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{BookingPolicy, Reservation, ReservationError, Schedule, DATE_FORMAT, TIME_FORMAT};

type Day = BTreeMap<NaiveTime, Option<Reservation>>;

/// Snapshot of every slot of one date, in slot order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySlots {
    pub date: NaiveDate,
    pub slots: Vec<(NaiveTime, Option<Reservation>)>,
}

impl DaySlots {
    /// Value at a slot, `None` if the time is not part of the grid.
    pub fn get(&self, time: NaiveTime) -> Option<&Option<Reservation>> {
        self.slots.iter().find(|(t, _)| *t == time).map(|(_, r)| r)
    }

    /// Times with no reservation.
    pub fn available(&self) -> Vec<NaiveTime> {
        self.slots
            .iter()
            .filter(|(_, r)| r.is_none())
            .map(|(t, _)| *t)
            .collect()
    }

    /// `{"HH:MM": null | {"name": .., "party_size": ..}}`.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .slots
            .iter()
            .map(|(time, reservation)| {
                let value = match reservation {
                    Some(r) => serde_json::json!({ "name": r.name, "party_size": r.party_size }),
                    None => Value::Null,
                };
                (time.format(TIME_FORMAT).to_string(), value)
            })
            .collect();
        Value::Object(map)
    }
}

/// The table availability shared by every session of the process.
///
/// All access goes through one lock, so `book` checks occupancy and writes
/// in the same critical section.
#[derive(Debug)]
pub struct ReservationBook {
    days: RwLock<BTreeMap<NaiveDate, Day>>,
    dates: Vec<NaiveDate>,
    times: Vec<NaiveTime>,
    policy: BookingPolicy,
}

impl ReservationBook {
    /// Build an empty book covering the schedule's horizon from `today`.
    pub fn new(today: NaiveDate, schedule: &Schedule, policy: BookingPolicy) -> Self {
        let dates = schedule.dates(today);
        let times = schedule.time_slots();
        let days = dates
            .iter()
            .map(|date| (*date, times.iter().map(|t| (*t, None)).collect::<Day>()))
            .collect();

        tracing::debug!(
            "Reservation book covers {} days x {} slots ({:?} policy)",
            dates.len(),
            times.len(),
            policy
        );

        Self {
            days: RwLock::new(days),
            dates,
            times,
            policy,
        }
    }

    /// Bookable dates, in order.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Slot times of every day, in order.
    pub fn time_slots(&self) -> &[NaiveTime] {
        &self.times
    }

    pub fn policy(&self) -> BookingPolicy {
        self.policy
    }

    /// All slots of `date`.
    ///
    /// Dates outside the horizon are an error, never an empty listing.
    pub async fn list_slots(&self, date: NaiveDate) -> Result<DaySlots, ReservationError> {
        let days = self.days.read().await;
        let day = days.get(&date).ok_or_else(|| invalid_date(date))?;
        Ok(DaySlots {
            date,
            slots: day.iter().map(|(t, r)| (*t, r.clone())).collect(),
        })
    }

    /// Reserve the slot at `date`/`time`.
    ///
    /// An occupied slot is rejected with `SlotTaken` under `BookingPolicy::Reject`
    /// and replaced under `BookingPolicy::Overwrite`.
    pub async fn book(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        name: &str,
        party_size: i64,
    ) -> Result<(), ReservationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ReservationError::InvalidName);
        }
        let party_size = u32::try_from(party_size)
            .ok()
            .filter(|n| *n > 0)
            .ok_or(ReservationError::InvalidParty(party_size))?;

        let mut days = self.days.write().await;
        let slot = slot_mut(&mut days, date, time)?;

        if let Some(existing) = slot.as_ref() {
            match self.policy {
                BookingPolicy::Reject => {
                    return Err(ReservationError::SlotTaken {
                        date: date.format(DATE_FORMAT).to_string(),
                        time: time.format(TIME_FORMAT).to_string(),
                        holder: existing.name.clone(),
                    });
                }
                BookingPolicy::Overwrite => {
                    tracing::warn!(
                        "Overwriting reservation of {} at {} {}",
                        existing.name,
                        date,
                        time.format(TIME_FORMAT)
                    );
                }
            }
        }

        *slot = Some(Reservation {
            name: name.to_string(),
            party_size,
        });
        tracing::info!(
            "Booked {} {} for {} ({} guests)",
            date,
            time.format(TIME_FORMAT),
            name,
            party_size
        );
        Ok(())
    }

    /// Clear the slot at `date`/`time`.
    ///
    /// Clearing an empty slot succeeds; the result is always `true` for a valid slot.
    pub async fn cancel(&self, date: NaiveDate, time: NaiveTime) -> Result<bool, ReservationError> {
        let mut days = self.days.write().await;
        let slot = slot_mut(&mut days, date, time)?;
        if let Some(previous) = slot.take() {
            tracing::info!(
                "Cancelled reservation of {} at {} {}",
                previous.name,
                date,
                time.format(TIME_FORMAT)
            );
        }
        Ok(true)
    }
}

fn slot_mut(
    days: &mut BTreeMap<NaiveDate, Day>,
    date: NaiveDate,
    time: NaiveTime,
) -> Result<&mut Option<Reservation>, ReservationError> {
    days.get_mut(&date)
        .ok_or_else(|| invalid_date(date))?
        .get_mut(&time)
        .ok_or_else(|| ReservationError::InvalidTimeSlot(time.format(TIME_FORMAT).to_string()))
}

fn invalid_date(date: NaiveDate) -> ReservationError {
    ReservationError::InvalidDate(date.format(DATE_FORMAT).to_string())
}
