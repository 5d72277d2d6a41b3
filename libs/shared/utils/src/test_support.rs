use chrono::NaiveDate;

use shared_config::AppConfig;

pub struct TestConfig {
    pub api_base_url: String,
    pub database_name: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:4000".to_string(),
            database_name: "test_clinic".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            api_base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            api_base_url: self.api_base_url.clone(),
            database_name: self.database_name.clone(),
            data_dir: ".".to_string(),
            request_timeout_seconds: 5,
        }
    }
}

/// Reference "today" shared by date-sensitive tests across cells.
pub fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}
