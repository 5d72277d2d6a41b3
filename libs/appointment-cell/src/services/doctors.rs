// libs/appointment-cell/src/services/doctors.rs
use std::sync::Arc;

use reqwest::Method;
use tracing::{debug, instrument};

use shared_backend::BackendClient;

use crate::models::{AppointmentError, Doctor};
use crate::services::booking::map_remote_error;

/// Read-only doctor browsing for the booking flow.
pub struct DoctorDirectoryService {
    backend: Arc<BackendClient>,
}

impl DoctorDirectoryService {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }

    #[instrument(skip(self, auth_token))]
    pub async fn fetch_doctors(&self, auth_token: &str) -> Result<Vec<Doctor>, AppointmentError> {
        let doctors: Vec<Doctor> = self
            .backend
            .request(Method::GET, "/api/doctors", Some(auth_token), None)
            .await
            .map_err(map_remote_error)?;

        debug!("Fetched {} doctors", doctors.len());
        Ok(doctors)
    }

    pub fn filter_by_specialty<'a>(doctors: &'a [Doctor], specialty: &str) -> Vec<&'a Doctor> {
        doctors
            .iter()
            .filter(|d| d.specialty.eq_ignore_ascii_case(specialty))
            .collect()
    }

    /// Case-insensitive substring match on the doctor's name.
    pub fn search<'a>(doctors: &'a [Doctor], query: &str) -> Vec<&'a Doctor> {
        let query = query.to_lowercase();
        doctors
            .iter()
            .filter(|d| d.name.to_lowercase().contains(&query))
            .collect()
    }
}
