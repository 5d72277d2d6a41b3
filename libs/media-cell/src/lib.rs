pub mod backend;
pub mod models;
pub mod services;

pub use backend::{MediaBackend, MediaHandle, PlaybackStatus};
pub use models::*;
pub use services::MediaSessionController;
