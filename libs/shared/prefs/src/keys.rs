//! Preference keys shared across cells. Values are plain strings; structured
//! values (the cached booking list) are JSON-serialized by their owning cell.

pub const SESSION_TOKEN: &str = "session_token";
pub const CUSTOMER_ID: &str = "customer_id";
pub const DATABASE_NAME: &str = "database_name";
pub const PREVIOUS_DATABASE_NAME: &str = "previous_database_name";
pub const STORED_PIN: &str = "stored_pin";
pub const BIOMETRIC_ENABLED: &str = "biometric_enabled";
pub const CACHED_BOOKINGS: &str = "cached_bookings";
pub const PROFILE_NAME: &str = "profile_name";
