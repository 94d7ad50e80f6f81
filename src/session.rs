//! Per-session context passed explicitly into every component.
//!
//! There is no process-wide "current user": whoever builds the gateway and the
//! controllers decides which identity they act for, and two sessions can live
//! side by side (e.g. in tests).
use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("User id cannot be empty or whitespace-only")]
    EmptyUserId,
    #[error("User id contains characters not allowed in an HTTP header")]
    InvalidUserId,
}

/// Identity sent in the `user-id` header of every request.
///
/// Validated on construction so it can always be placed in a header value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: &str) -> Result<Self, SessionError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SessionError::EmptyUserId);
        }
        // Visible ASCII and spaces only; control bytes and non-ASCII would
        // make reqwest reject the header at send time.
        if !trimmed.bytes().all(|b| (0x20..0x7f).contains(&b)) {
            return Err(SessionError::InvalidUserId);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything a component needs to know about who it is acting for.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: UserId,
}

impl Session {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}
