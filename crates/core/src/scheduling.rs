//! Calendar availability over studio business hours.
//!
//! Booking slots start on the hour. The studio day runs 09:00-18:00 UTC; the
//! latest slot start is 16:00, and a slot only fits when its end stays within
//! the day. Cancelled sessions never block a slot (callers filter them out
//! before building the interval list).

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub const DAY_START_HOUR: u32 = 9;
pub const DAY_END_HOUR: u32 = 18;
pub const LAST_SLOT_START_HOUR: u32 = 16;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookedInterval {
    pub start: DateTime<Utc>,
    pub duration_minutes: u32,
}

impl BookedInterval {
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::minutes(i64::from(self.duration_minutes))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Hourly slots on `date` that fit `duration_minutes` without overlapping
/// any booked interval.
pub fn available_slots(
    date: NaiveDate,
    duration_minutes: u32,
    booked: &[BookedInterval],
) -> Vec<AvailabilitySlot> {
    let day_end = at_hour(date, DAY_END_HOUR);

    (DAY_START_HOUR..=LAST_SLOT_START_HOUR)
        .map(|hour| {
            let start = at_hour(date, hour);
            AvailabilitySlot { start, end: start + Duration::minutes(i64::from(duration_minutes)) }
        })
        .filter(|slot| slot.end <= day_end)
        .filter(|slot| !booked.iter().any(|interval| overlaps(slot, interval)))
        .collect()
}

fn at_hour(date: NaiveDate, hour: u32) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&date.and_time(time))
}

fn overlaps(slot: &AvailabilitySlot, interval: &BookedInterval) -> bool {
    slot.start < interval.end() && interval.start < slot.end
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{available_slots, at_hour, BookedInterval};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).expect("valid date")
    }

    #[test]
    fn empty_day_yields_all_hourly_slots_for_two_hours() {
        let slots = available_slots(date(), 120, &[]);

        // 120-minute bookings fit at 09:00 through 16:00 (ends 18:00).
        assert_eq!(slots.len(), 8);
        assert_eq!(slots[0].start, at_hour(date(), 9));
        assert_eq!(slots[7].start, at_hour(date(), 16));
        assert_eq!(slots[7].end, at_hour(date(), 18));
    }

    #[test]
    fn long_sessions_lose_late_slots() {
        let slots = available_slots(date(), 240, &[]);

        // Four-hour bookings must start by 14:00.
        assert_eq!(slots.last().map(|slot| slot.start), Some(at_hour(date(), 14)));
        assert_eq!(slots.len(), 6);
    }

    #[test]
    fn booked_interval_blocks_overlapping_slots() {
        let booked =
            vec![BookedInterval { start: at_hour(date(), 10), duration_minutes: 90 }];
        let slots = available_slots(date(), 60, &booked);

        let starts: Vec<_> = slots.iter().map(|slot| slot.start.format("%H:%M").to_string()).collect();
        // 10:00 and 11:00 collide with the 10:00-11:30 booking.
        assert!(!starts.contains(&"10:00".to_string()));
        assert!(!starts.contains(&"11:00".to_string()));
        assert!(starts.contains(&"09:00".to_string()));
        assert!(starts.contains(&"12:00".to_string()));
    }

    #[test]
    fn back_to_back_bookings_do_not_block_adjacent_slots() {
        let booked =
            vec![BookedInterval { start: at_hour(date(), 9), duration_minutes: 60 }];
        let slots = available_slots(date(), 60, &booked);

        assert_eq!(slots.first().map(|slot| slot.start), Some(at_hour(date(), 10)));
    }
}
