//! Hash-chain primitives: entry hashing and chain integrity verification.
//!
//! Every field that contributes to an entry's hash is listed explicitly so
//! nothing is accidentally omitted.
//!
//! Hash input layout (one `|`-joined UTF-8 string, in order):
//!   1. action wire name (e.g. `evidence_verified`)
//!   2. entity_id
//!   3. actor_id
//!   4. details
//!   5. timestamp, canonical RFC 3339 (UTC, microseconds, `Z` suffix)
//!   6. previous_hash (the prior entry's self_hash, or `GENESIS_HASH`)
//!
//! `entity_type`, actor email/role, and `metadata` are stored but NOT
//! hashed — the chain commits to what happened, to what, by whom, and when.

use chrono::{DateTime, SecondsFormat, Utc};

use custodia_contracts::ledger::{AuditAction, ChainBreak, ChainReport, LedgerEntry};
use custodia_core::hash::digest_bytes;

/// The sentinel `previous_hash` for the first entry in the chain.
///
/// A `GENESIS_` prefix over 64 zeros — a value that can never be the SHA-256
/// of real data, making genesis detection unambiguous.
pub const GENESIS_HASH: &str =
    "GENESIS_0000000000000000000000000000000000000000000000000000000000000000";

/// The one timestamp rendering that participates in entry hashes.
///
/// Applied identically at append time and at verification time, so a stored
/// entry's hash is always recomputable from its fields.
pub fn canonical_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Compute the SHA-256 hash (lowercase hex) for a single ledger entry.
pub fn entry_hash(
    action: AuditAction,
    entity_id: &str,
    actor_id: &str,
    details: &str,
    timestamp: &DateTime<Utc>,
    previous_hash: &str,
) -> String {
    let input = format!(
        "{}|{}|{}|{}|{}|{}",
        action.as_str(),
        entity_id,
        actor_id,
        details,
        canonical_timestamp(timestamp),
        previous_hash,
    );
    digest_bytes(input.as_bytes())
}

/// Verify the integrity of a chain snapshot, ascending by sequence.
///
/// Fails fast at the first entry where either rule breaks:
///
/// 1. **Prev-hash linkage** — the stored `previous_hash` must equal the
///    preceding entry's `self_hash` (or `GENESIS_HASH` at the head). A
///    mismatch means a deletion, insertion, or reorder.
/// 2. **Hash correctness** — recomputing the entry hash from the stored
///    fields must reproduce the stored `self_hash`. A mismatch means
///    in-place field tampering.
///
/// An empty chain is vacuously intact.
pub fn verify_entries(entries: &[LedgerEntry]) -> ChainReport {
    let total = entries.len() as u64;
    let mut expected_previous = GENESIS_HASH.to_string();

    for entry in entries {
        if entry.previous_hash != expected_previous {
            return ChainReport::broken(total, entry.sequence, ChainBreak::PreviousHashMismatch);
        }

        let recomputed = entry_hash(
            entry.action,
            &entry.entity_id,
            &entry.actor_id,
            &entry.details,
            &entry.timestamp,
            &entry.previous_hash,
        );
        if entry.self_hash != recomputed {
            return ChainReport::broken(total, entry.sequence, ChainBreak::SelfHashMismatch);
        }

        expected_previous = entry.self_hash.clone();
    }

    ChainReport::intact(total)
}
