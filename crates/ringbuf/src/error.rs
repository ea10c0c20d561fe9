//! Error types surfaced by the ring's configuration checks.
//!
//! Transient producer back-pressure (the "retry later" sentinel `acquire`
//! returns when it would lap the consumer or the slot pool is exhausted) is
//! deliberately not part of this enum — it is the expected steady-state
//! outcome at saturation, not a failure to report. Likewise, protocol
//! preconditions (bounds, wrap invariants, stable-seen, release invariants)
//! stay `debug_assert!`s in `invariants.rs`: a violation is a caller bug, not
//! a recoverable condition, so it aborts the same way the reference
//! implementation's `ASSERT()` does.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RingError>;

#[derive(Error, Debug)]
pub enum RingError {
    #[error("invalid ring configuration: {message}")]
    InvalidConfig { message: String },
}

impl RingError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
