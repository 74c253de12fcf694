use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};

use crate::models::{AvailabilityWindow, DoctorRecord, FilterCriteria};

/// Apply the criteria predicates in order: gender, minimum rating, then the
/// availability window. Language and distance preferences have no effect.
pub fn filter(
    candidates: Vec<DoctorRecord>,
    criteria: &FilterCriteria,
    now: DateTime<Utc>,
) -> Vec<DoctorRecord> {
    candidates
        .into_iter()
        .filter(|doctor| criteria.gender.accepts(doctor.gender))
        .filter(|doctor| doctor.rating >= criteria.minimum_rating)
        .filter(|doctor| has_slot_in(doctor, criteria.availability, now))
        .collect()
}

fn has_slot_in(doctor: &DoctorRecord, window: AvailabilityWindow, now: DateTime<Utc>) -> bool {
    if window == AvailabilityWindow::Anytime {
        return true;
    }
    doctor.available_times.iter().any(|slot| window_contains(window, *slot, now))
}

/// Calendar days and ISO weeks are evaluated in UTC.
pub fn window_contains(window: AvailabilityWindow, slot: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let today = now.date_naive();
    let next_week_start = start_of_week(now) + Duration::weeks(1);

    match window {
        AvailabilityWindow::Anytime => true,
        AvailabilityWindow::Today => slot.date_naive() == today,
        AvailabilityWindow::Tomorrow => Some(slot.date_naive()) == today.succ_opt(),
        AvailabilityWindow::ThisWeek => slot >= now && slot < next_week_start,
        AvailabilityWindow::NextWeek => {
            slot >= next_week_start && slot < next_week_start + Duration::weeks(1)
        }
    }
}

fn start_of_week(now: DateTime<Utc>) -> DateTime<Utc> {
    let monday = now.date_naive() - Duration::days(now.weekday().num_days_from_monday() as i64);
    monday.and_time(NaiveTime::MIN).and_utc()
}
