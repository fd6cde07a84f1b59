//! # custodia-contracts
//!
//! Shared types and contracts for the Custodia provenance core.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions, vocabulary enums, and error types.

pub mod actor;
pub mod case;
pub mod error;
pub mod evidence;
pub mod ledger;
pub mod query;
pub mod record;
pub mod transfer;
