//! # custodia-core
//!
//! The trait seams and shared machinery of the Custodia provenance core.
//!
//! This crate provides:
//! - The collaborator traits (`UserDirectory`, `EvidenceDirectory`,
//!   `CaseDirectory`, `NotificationSink`) the hosting system implements
//! - The store traits (`LedgerStore`, `HashRecordStore`, `TransferStore`)
//!   with the concurrency primitives the core depends on
//! - The streaming SHA-256 content hasher
//! - In-memory reference implementations for tests and the demo
//!
//! No subsystem logic lives here; the ledger, verifier, and custody
//! workflow crates build on these seams.

pub mod hash;
pub mod memory;
pub mod traits;

pub use hash::{digest_bytes, digest_reader};

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use custodia_contracts::{
        actor::{Role, UserRecord},
        evidence::{ContentHandle, EvidenceItem, EvidenceStatus, IntegrityStatus},
    };

    use crate::hash::digest_bytes;
    use crate::memory::InMemoryEvidenceDirectory;
    use crate::traits::EvidenceDirectory;

    fn item(evidence_id: &str, content: &[u8]) -> EvidenceItem {
        let hash = digest_bytes(content);
        EvidenceItem {
            evidence_id: evidence_id.to_string(),
            case_id: "case-1".to_string(),
            file_name: "disk.img".to_string(),
            content_handle: ContentHandle::new(format!("blob/{evidence_id}")),
            original_hash: hash.clone(),
            current_hash: hash,
            integrity_status: IntegrityStatus::Unverified,
            last_verified_at: None,
            current_custodian_id: "user-a".to_string(),
            status: EvidenceStatus::Active,
        }
    }

    #[test]
    fn evidence_directory_round_trips_content() {
        let dir = InMemoryEvidenceDirectory::new();
        dir.insert(item("ev-1", b"original bytes"), b"original bytes".to_vec());

        let found = dir.find("ev-1").expect("item must exist");
        let mut reader = dir.open_content(&found.content_handle).unwrap();
        let mut read_back = Vec::new();
        std::io::Read::read_to_end(&mut reader, &mut read_back).unwrap();
        assert_eq!(read_back, b"original bytes");
    }

    #[test]
    fn apply_verification_updates_only_owned_fields() {
        let dir = InMemoryEvidenceDirectory::new();
        dir.insert(item("ev-2", b"data"), b"data".to_vec());

        let now = Utc::now();
        dir.apply_verification("ev-2", "deadbeef", IntegrityStatus::Tampered, now)
            .unwrap();

        let found = dir.find("ev-2").unwrap();
        assert_eq!(found.current_hash, "deadbeef");
        assert_eq!(found.integrity_status, IntegrityStatus::Tampered);
        assert_eq!(found.last_verified_at, Some(now));
        // The intake baseline never moves.
        assert_eq!(found.original_hash, digest_bytes(b"data"));
    }

    #[test]
    fn overwrite_content_changes_what_the_handle_yields() {
        let dir = InMemoryEvidenceDirectory::new();
        dir.insert(item("ev-3", b"clean"), b"clean".to_vec());
        dir.overwrite_content("ev-3", b"tampered".to_vec()).unwrap();

        let found = dir.find("ev-3").unwrap();
        let mut reader = dir.open_content(&found.content_handle).unwrap();
        let hashed = crate::hash::digest_reader(&mut reader).unwrap();
        assert_eq!(hashed, digest_bytes(b"tampered"));
        assert_ne!(hashed, found.original_hash);
    }

    #[test]
    fn user_record_projects_to_actor() {
        let user = UserRecord {
            user_id: "u-1".to_string(),
            email: "ava@agency.example".to_string(),
            full_name: "Ava Ruiz".to_string(),
            role: Role::Investigator,
        };
        let actor = user.as_actor();
        assert_eq!(actor.user_id, "u-1");
        assert_eq!(actor.role, Role::Investigator);
    }
}
