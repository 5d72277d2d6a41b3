use regex::Regex;
use std::sync::OnceLock;

use crate::error::{AuthError, MAX_PIN_ATTEMPTS};

fn wrong_attempt_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Wrong Attempt \[(\d+)\]").unwrap())
}

/// Map a remote login failure message onto the progressive-lockout error.
/// The server counts failed attempts as `Wrong Attempt [N]`; the sixth
/// attempt locks the account. Returns `None` for unrelated messages.
pub fn parse_lockout_message(message: &str) -> Option<AuthError> {
    let caps = wrong_attempt_re().captures(message)?;
    let attempt: u32 = caps.get(1)?.as_str().parse().ok()?;

    if attempt >= MAX_PIN_ATTEMPTS {
        Some(AuthError::AccountLocked)
    } else {
        Some(AuthError::WrongAttempt {
            attempt,
            remaining: MAX_PIN_ATTEMPTS - attempt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn counts_remaining_attempts() {
        assert_matches!(
            parse_lockout_message("Wrong Attempt [4]"),
            Some(AuthError::WrongAttempt { attempt: 4, remaining: 2 })
        );
        assert_matches!(
            parse_lockout_message("Authentication error: Wrong Attempt [1]"),
            Some(AuthError::WrongAttempt { attempt: 1, remaining: 5 })
        );
    }

    #[test]
    fn sixth_attempt_locks() {
        assert_matches!(
            parse_lockout_message("Wrong Attempt [6]"),
            Some(AuthError::AccountLocked)
        );
    }

    #[test]
    fn unrelated_message_is_none() {
        assert_matches!(parse_lockout_message("Invalid password"), None);
    }
}
