//! The unified error type for the Custodia provenance core.
//!
//! Every guard failure is a distinct variant carrying enough context for a
//! client to render a specific message — a caller can always tell "already
//! handled by someone else" apart from "you lack permission". A detected
//! tamper is NOT an error: `matches == false` is a valid, reported outcome.

use thiserror::Error;

/// The unified error type for all Custodia operations.
#[derive(Debug, Error)]
pub enum CustodyError {
    /// The referenced evidence item, transfer, user, or case is unknown.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The actor lacks the relational or role permission for this operation
    /// (not the custodian, not the named recipient, missing permission flag).
    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    /// A uniqueness or concurrency invariant rejected the operation
    /// (duplicate pending transfer, append contention exhausted retries).
    #[error("conflict: {reason}")]
    Conflict { reason: String },

    /// A state-machine transition was attempted from a state that does not
    /// allow it. Carries the actual current state for client display.
    #[error("invalid state: expected '{expected}', currently '{current}'")]
    InvalidState { expected: String, current: String },

    /// Chain verification found a break. Reported, never auto-repaired.
    #[error("ledger integrity violation at sequence {sequence}: {reason}")]
    IntegrityViolation { sequence: u64, reason: String },

    /// Content could not be read or digested.
    #[error("content hashing failed: {reason}")]
    Hashing { reason: String },

    /// The backing store failed an operation it should not fail.
    #[error("store operation failed: {reason}")]
    Store { reason: String },
}

impl CustodyError {
    /// Shorthand for an `InvalidState` built from state vocabulary strings.
    pub fn invalid_state(expected: impl Into<String>, current: impl Into<String>) -> Self {
        Self::InvalidState {
            expected: expected.into(),
            current: current.into(),
        }
    }
}

/// Convenience alias used throughout the Custodia crates.
pub type CustodyResult<T> = Result<T, CustodyError>;
