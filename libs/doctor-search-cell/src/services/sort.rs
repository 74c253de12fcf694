use std::cmp::Ordering;

use crate::models::{DoctorRecord, SortOption};

/// Order doctors by `option`. The sort is stable, so ties keep their input order.
pub fn sort(mut doctors: Vec<DoctorRecord>, option: SortOption) -> Vec<DoctorRecord> {
    match option {
        SortOption::Rating => doctors.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
        SortOption::Availability => doctors.sort_by(by_earliest_slot),
        // Distance needs coordinates the records do not carry.
        SortOption::Distance | SortOption::Recommended => {}
    }
    doctors
}

/// Doctors without any slot compare greater than every doctor with one.
fn by_earliest_slot(a: &DoctorRecord, b: &DoctorRecord) -> Ordering {
    match (a.earliest_available(), b.earliest_available()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
