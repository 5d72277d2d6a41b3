use thiserror::Error;

/// Maximum failed PIN attempts before the remote service locks the account.
pub const MAX_PIN_ATTEMPTS: u32 = 6;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Wrong attempt {attempt}, {remaining} attempts remaining")]
    WrongAttempt { attempt: u32, remaining: u32 },

    #[error("Account locked after too many failed attempts")]
    AccountLocked,

    #[error("PIN does not match")]
    PinMismatch,

    #[error("No PIN has been set up on this device")]
    PinNotSet,

    #[error("No stored session")]
    MissingSession,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Network error: {0}")]
    Network(String),
}
