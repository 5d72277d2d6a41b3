// libs/appointment-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use shared_utils::{dates, times};

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// One booking as held by the store. `date` and `time` keep the remote
/// service's textual encodings; `status` is the derived bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub doctor_name: String,
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub image: Option<String>,
    pub date: String,
    pub time: String,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Appointment {
    /// Combined start instant for calendar integration. `None` when either
    /// the date or the time range resists parsing.
    pub fn calendar_start(&self, today: NaiveDate) -> Option<NaiveDateTime> {
        let date = dates::parse_appointment_date(&self.date, today)?;
        let (start, _) = times::parse_time_range(&self.time)?;
        Some(date.and_time(start))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[serde(alias = "booked", alias = "confirmed", alias = "active")]
    Upcoming,
    #[serde(alias = "completed", alias = "done")]
    Past,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Upcoming => write!(f, "upcoming"),
            AppointmentStatus::Past => write!(f, "past"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Full in-memory state of the store, delivered to subscribers on every
/// change. Buckets are disjoint; each id appears in exactly one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentSnapshot {
    pub upcoming: Vec<Appointment>,
    pub past: Vec<Appointment>,
    pub cancelled: Vec<Appointment>,
}

impl AppointmentSnapshot {
    pub fn is_empty(&self) -> bool {
        self.upcoming.is_empty() && self.past.is_empty() && self.cancelled.is_empty()
    }

    pub fn all(&self) -> impl Iterator<Item = &Appointment> {
        self.upcoming
            .iter()
            .chain(self.past.iter())
            .chain(self.cancelled.iter())
    }
}

// ==============================================================================
// WIRE MODELS
// ==============================================================================

/// Booking row as the remote service returns it. Status is free text; only
/// an explicit "cancelled" is honored, everything else is active and gets
/// bucketed by date.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRecord {
    #[serde(deserialize_with = "de_string_or_number")]
    pub id: String,
    pub doctor_name: String,
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub image: Option<String>,
    pub date: String,
    pub time: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl BookingRecord {
    pub fn is_cancelled(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("cancelled"))
    }
}

/// The remote sends ids as numbers for legacy tenants and strings for new
/// ones; normalize to strings at the boundary.
fn de_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(i64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct Doctor {
    #[serde(deserialize_with = "de_string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub specialty: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub hospital: Option<String>,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: String,
    pub doctor_name: String,
    pub specialty: String,
    pub date: String,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RescheduleRequest {
    pub date: String,
    pub time: String,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Booking not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Remote service error: {0}")]
    RemoteError(String),

    #[error("Network error: {0}")]
    Network(String),
}
