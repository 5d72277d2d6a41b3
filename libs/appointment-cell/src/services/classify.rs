// libs/appointment-cell/src/services/classify.rs
//
// Pure classification and merge rules for the appointment store. All
// functions take `today` as a parameter; callers pass the current date.

use std::collections::HashSet;

use chrono::NaiveDate;

use shared_utils::dates;

use crate::models::{Appointment, AppointmentSnapshot, AppointmentStatus, BookingRecord};

/// Bucket one appointment. An explicit cancelled status wins regardless of
/// date; otherwise the parsed date against today-at-00:00 decides, with
/// today itself counting as upcoming. An unparseable date on an active
/// booking stays upcoming rather than being dropped.
pub fn classify(appointment: &Appointment, today: NaiveDate) -> AppointmentStatus {
    if appointment.status == AppointmentStatus::Cancelled {
        return AppointmentStatus::Cancelled;
    }

    match dates::parse_appointment_date(&appointment.date, today) {
        Some(date) if date < today => AppointmentStatus::Past,
        _ => AppointmentStatus::Upcoming,
    }
}

/// Partition a merged list into the three buckets, rewriting each record's
/// derived status. Input order is preserved within each bucket.
pub fn partition(appointments: Vec<Appointment>, today: NaiveDate) -> AppointmentSnapshot {
    let mut snapshot = AppointmentSnapshot::default();

    for mut appointment in appointments {
        let bucket = classify(&appointment, today);
        appointment.status = bucket;
        match bucket {
            AppointmentStatus::Upcoming => snapshot.upcoming.push(appointment),
            AppointmentStatus::Past => snapshot.past.push(appointment),
            AppointmentStatus::Cancelled => snapshot.cancelled.push(appointment),
        }
    }

    snapshot
}

/// Merge the remote list with locally cached bookings. Remote records win
/// for overlapping ids; cached records survive only when the remote list
/// does not contain their id. The result is deduplicated by id.
pub fn merge(remote: Vec<Appointment>, cached: Vec<Appointment>) -> Vec<Appointment> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::with_capacity(remote.len() + cached.len());

    for appointment in remote.into_iter().chain(cached.into_iter()) {
        if seen.insert(appointment.id.clone()) {
            merged.push(appointment);
        }
    }

    merged
}

/// Lift a wire record into the domain shape. The status here is provisional;
/// `partition` derives the final bucket.
pub fn from_record(record: BookingRecord) -> Appointment {
    let status = if record.is_cancelled() {
        AppointmentStatus::Cancelled
    } else {
        AppointmentStatus::Upcoming
    };

    Appointment {
        id: record.id,
        doctor_name: record.doctor_name,
        specialty: record.specialty,
        image: record.image,
        date: record.date,
        time: record.time,
        status,
        cancelled_at: None,
    }
}
