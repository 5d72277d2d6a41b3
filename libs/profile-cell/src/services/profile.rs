// libs/profile-cell/src/services/profile.rs
use std::sync::Arc;

use reqwest::Method;
use tracing::{debug, instrument};

use shared_backend::BackendClient;

use crate::models::{CompanyInfo, Profile, ProfileError};

pub struct ProfileService {
    backend: Arc<BackendClient>,
}

impl ProfileService {
    pub fn new(backend: Arc<BackendClient>) -> Self {
        Self { backend }
    }

    #[instrument(skip(self, auth_token))]
    pub async fn fetch_profile(
        &self,
        customer_id: &str,
        auth_token: &str,
    ) -> Result<Profile, ProfileError> {
        let path = format!("/api/customers/{}/profile", customer_id);
        let profile: Profile = self
            .backend
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(map_remote_error)?;

        debug!("Fetched profile for {}", profile.customer_id);
        Ok(profile)
    }

    #[instrument(skip(self, auth_token))]
    pub async fn fetch_company_info(&self, auth_token: &str) -> Result<CompanyInfo, ProfileError> {
        self.backend
            .request(Method::GET, "/api/company", Some(auth_token), None)
            .await
            .map_err(map_remote_error)
    }
}

pub(crate) fn map_remote_error(error: anyhow::Error) -> ProfileError {
    let message = error.to_string();
    if message.starts_with("Resource not found") {
        ProfileError::NotFound(message)
    } else if message.starts_with("API error") || message.starts_with("Authentication error") {
        ProfileError::RemoteError(message)
    } else {
        ProfileError::Network(message)
    }
}
