pub mod controller;

pub use controller::MediaSessionController;
