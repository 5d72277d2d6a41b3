use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated session against the remote data service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub customer_id: String,
    pub display_name: Option<String>,
    pub database_name: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn bearer(&self) -> &str {
        &self.token
    }
}
