//! Non-repudiation stamps for transfer approvals and completions.
//!
//! Not a cryptographic signature against a key: a deterministic digest
//! proving a specific actor took the step at a specific instant. Both
//! parties stamp the handshake — the recipient at approval, the sender at
//! completion — so neither side can later deny their half.

use chrono::{DateTime, Utc};

use custodia_core::hash::digest_bytes;
use custodia_ledger::canonical_timestamp;

/// SHA-256 (hex) over `user_id|transfer_id|timestamp`, using the same
/// canonical timestamp rendering as the ledger's entry hashes.
pub fn transfer_signature(user_id: &str, transfer_id: &str, at: &DateTime<Utc>) -> String {
    let input = format!("{}|{}|{}", user_id, transfer_id, canonical_timestamp(at));
    digest_bytes(input.as_bytes())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::transfer_signature;

    #[test]
    fn signature_is_deterministic_for_fixed_inputs() {
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let a = transfer_signature("user-1", "tr-1", &at);
        let b = transfer_signature("user-1", "tr-1", &at);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn signature_commits_to_every_input() {
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        let base = transfer_signature("user-1", "tr-1", &at);
        assert_ne!(base, transfer_signature("user-2", "tr-1", &at));
        assert_ne!(base, transfer_signature("user-1", "tr-2", &at));
        let later = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 54).unwrap();
        assert_ne!(base, transfer_signature("user-1", "tr-1", &later));
    }
}
