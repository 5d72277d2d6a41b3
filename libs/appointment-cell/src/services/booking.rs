// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::Utc;
use reqwest::Method;
use serde_json::json;
use tracing::{info, instrument, warn};

use shared_backend::BackendClient;
use shared_utils::{dates, times};

use crate::models::{
    Appointment, AppointmentError, BookAppointmentRequest, BookingRecord, RescheduleRequest,
};
use crate::services::classify;
use crate::services::store::AppointmentStore;

/// Booking mutations against the remote data service. Reads stay in the
/// `AppointmentStore`; this service owns add/reschedule/cancel and routes
/// cancellations back through the store.
pub struct BookingService {
    backend: Arc<BackendClient>,
    store: Arc<AppointmentStore>,
}

impl BookingService {
    pub fn new(backend: Arc<BackendClient>, store: Arc<AppointmentStore>) -> Self {
        Self { backend, store }
    }

    #[instrument(skip(self, auth_token))]
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
        customer_id: &str,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Booking appointment with {} on {} {}",
            request.doctor_name, request.date, request.time
        );

        self.validate_slot(&request.date, &request.time)?;

        let body = json!({
            "customer_id": customer_id,
            "doctor_id": request.doctor_id,
            "doctor_name": request.doctor_name,
            "specialty": request.specialty,
            "date": request.date,
            "time": request.time,
            "notes": request.notes,
        });

        let record: BookingRecord = self
            .backend
            .request(Method::POST, "/api/bookings", Some(auth_token), Some(body))
            .await
            .map_err(map_remote_error)?;

        let appointment = classify::from_record(record);
        info!("Appointment {} booked", appointment.id);
        Ok(appointment)
    }

    #[instrument(skip(self, auth_token))]
    pub async fn reschedule_appointment(
        &self,
        appointment_id: &str,
        request: RescheduleRequest,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Rescheduling appointment {} to {} {}",
            appointment_id, request.date, request.time
        );

        self.validate_slot(&request.date, &request.time)?;

        let path = format!("/api/bookings/{}", appointment_id);
        let body = json!({
            "date": request.date,
            "time": request.time,
        });

        let record: BookingRecord = self
            .backend
            .request(Method::PATCH, &path, Some(auth_token), Some(body))
            .await
            .map_err(map_remote_error)?;

        Ok(classify::from_record(record))
    }

    /// Cancel remotely, then reclassify the local copy. The store move runs
    /// even though the next fetch would also pick the change up, so
    /// subscribers see the cancellation immediately.
    #[instrument(skip(self, auth_token))]
    pub async fn cancel_appointment(
        &self,
        appointment_id: &str,
        reason: Option<&str>,
        auth_token: &str,
    ) -> Result<(), AppointmentError> {
        info!("Cancelling appointment {}", appointment_id);

        let path = format!("/api/bookings/{}/cancel", appointment_id);
        let body = json!({
            "reason": reason,
            "cancelled_at": Utc::now().to_rfc3339(),
        });

        self.backend
            .request::<serde_json::Value>(Method::POST, &path, Some(auth_token), Some(body))
            .await
            .map_err(map_remote_error)?;

        self.store.move_to_cancelled(appointment_id).await;
        Ok(())
    }

    /// The remote service accepts the same textual encodings the store
    /// classifies, so a slot that parses here will classify there.
    fn validate_slot(&self, date: &str, time: &str) -> Result<(), AppointmentError> {
        let today = Utc::now().date_naive();

        if dates::parse_appointment_date(date, today).is_none() {
            warn!("Rejecting booking with unparseable date {:?}", date);
            return Err(AppointmentError::ValidationError(format!(
                "unrecognized date: {}",
                date
            )));
        }

        if times::parse_time_range(time).is_none() {
            warn!("Rejecting booking with unparseable time {:?}", time);
            return Err(AppointmentError::ValidationError(format!(
                "unrecognized time range: {}",
                time
            )));
        }

        Ok(())
    }
}

pub(crate) fn map_remote_error(error: anyhow::Error) -> AppointmentError {
    let message = error.to_string();
    if message.starts_with("Resource not found") {
        AppointmentError::NotFound(message)
    } else if message.starts_with("API error") || message.starts_with("Authentication error") {
        AppointmentError::RemoteError(message)
    } else {
        AppointmentError::Network(message)
    }
}
