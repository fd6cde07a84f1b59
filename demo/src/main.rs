//! Custodia Provenance Core — Demo CLI
//!
//! Runs one or all of the three provenance scenarios against an in-memory
//! deployment: integrity verification with a tamper event, a full custody
//! transfer handshake, and an audit-chain inspection.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- verify
//!   cargo run -p demo -- transfer
//!   cargo run -p demo -- audit

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use custodia_contracts::{
    actor::{Role, UserRecord},
    case::{CaseRecord, CaseStatus},
    error::CustodyResult,
    evidence::{ContentHandle, EvidenceItem, EvidenceStatus, IntegrityStatus},
    query::LedgerFilter,
};
use custodia_core::{
    hash::digest_bytes,
    memory::{
        InMemoryCaseDirectory, InMemoryEvidenceDirectory, InMemoryUserDirectory,
        RecordingNotificationSink,
    },
    traits::EvidenceDirectory,
};
use custodia_custody::{CustodyTransferWorkflow, InMemoryTransferStore};
use custodia_ledger::{AuditLedger, InMemoryLedgerStore};
use custodia_verify::{InMemoryHashRecordStore, IntegrityVerifier};

// ── CLI definition ────────────────────────────────────────────────────────────

/// Custodia — tamper-evident provenance core demo.
///
/// Each subcommand runs one or all of the three scenarios against a seeded
/// in-memory deployment, demonstrating hash verification, the custody
/// transfer handshake, and audit-chain integrity.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Custodia provenance core demo",
    long_about = "Runs Custodia demo scenarios showing evidence hashing, tamper\n\
                  detection, the two-party custody transfer handshake, and the\n\
                  hash-chained audit ledger."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all three scenarios in sequence.
    RunAll,
    /// Scenario 1: Integrity verification (intact, then tampered).
    Verify,
    /// Scenario 2: Custody transfer handshake (request / approve / complete).
    Transfer,
    /// Scenario 3: Audit chain inspection and logged verification.
    Audit,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all(),
        Command::Verify => run_verify(),
        Command::Transfer => run_transfer(),
        Command::Audit => run_audit(),
    };

    match result {
        Ok(()) => {
            println!("All selected scenarios completed successfully.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn run_all() -> CustodyResult<()> {
    run_verify()?;
    run_transfer()?;
    run_audit()?;
    Ok(())
}

// ── Deployment ────────────────────────────────────────────────────────────────

/// One fully wired in-memory deployment, seeded with a case, three users and
/// one evidence item whose intake hash is already on file.
struct Deployment {
    evidence: Arc<InMemoryEvidenceDirectory>,
    sink: Arc<RecordingNotificationSink>,
    ledger: Arc<AuditLedger>,
    verifier: IntegrityVerifier,
    workflow: CustodyTransferWorkflow,
}

fn seed() -> CustodyResult<Deployment> {
    let users = Arc::new(InMemoryUserDirectory::new());
    users.insert(UserRecord {
        user_id: "user-admin".to_string(),
        email: "admin@agency.example".to_string(),
        full_name: "Dana Whitfield".to_string(),
        role: Role::Admin,
    });
    users.insert(UserRecord {
        user_id: "user-ava".to_string(),
        email: "ava@agency.example".to_string(),
        full_name: "Ava Ruiz".to_string(),
        role: Role::Investigator,
    });
    users.insert(UserRecord {
        user_id: "user-ben".to_string(),
        email: "ben@agency.example".to_string(),
        full_name: "Ben Okafor".to_string(),
        role: Role::Investigator,
    });

    let cases = Arc::new(InMemoryCaseDirectory::new());
    cases.insert(CaseRecord {
        case_id: "case-1".to_string(),
        case_number: "2026-CR-0042".to_string(),
        status: CaseStatus::Open,
    });

    let evidence = Arc::new(InMemoryEvidenceDirectory::new());
    let content = b"disk image bytes, sector by sector".to_vec();
    let intake_hash = digest_bytes(&content);
    evidence.insert(
        EvidenceItem {
            evidence_id: "ev-1".to_string(),
            case_id: "case-1".to_string(),
            file_name: "laptop.img".to_string(),
            content_handle: ContentHandle::new("blob/ev-1"),
            original_hash: intake_hash.clone(),
            current_hash: intake_hash,
            integrity_status: IntegrityStatus::Unverified,
            last_verified_at: None,
            current_custodian_id: "user-ava".to_string(),
            status: EvidenceStatus::Active,
        },
        content,
    );

    let records = Arc::new(InMemoryHashRecordStore::new());
    let ledger = Arc::new(AuditLedger::new(Arc::new(InMemoryLedgerStore::new())));
    let sink = Arc::new(RecordingNotificationSink::new());

    let verifier = IntegrityVerifier::new(
        users.clone(),
        evidence.clone(),
        cases,
        records.clone(),
        ledger.clone(),
        sink.clone(),
    );
    let workflow = CustodyTransferWorkflow::new(
        users,
        evidence.clone(),
        Arc::new(InMemoryTransferStore::new()),
        records,
        ledger.clone(),
        sink.clone(),
    );

    // Intake: the upload hash record and its ledger entry.
    verifier.record_intake("ev-1", "user-ava")?;

    Ok(Deployment {
        evidence,
        sink,
        ledger,
        verifier,
        workflow,
    })
}

// ── Scenario 1: verification ──────────────────────────────────────────────────

fn run_verify() -> CustodyResult<()> {
    println!("Scenario 1: Integrity Verification");
    println!("----------------------------------");

    let d = seed()?;

    let outcome = d.verifier.verify("ev-1", "user-ava")?;
    println!(
        "  [1] Fresh item verifies clean: matches={} status={}",
        outcome.matches,
        outcome.integrity_status.as_str()
    );

    d.evidence
        .overwrite_content("ev-1", b"not the original bytes".to_vec())?;
    println!("  [2] Stored bytes replaced out of band");

    let outcome = d.verifier.verify("ev-1", "user-ava")?;
    println!(
        "  [3] Re-verification detects drift: matches={} status={}",
        outcome.matches,
        outcome.integrity_status.as_str()
    );

    let history = d.verifier.hash_history("ev-1")?;
    println!("  [4] Hash history now holds {} records", history.len());

    let alerts = d
        .sink
        .sent()
        .iter()
        .filter(|n| n.kind == "integrity_alert")
        .count();
    println!("  [5] Custodian received {} integrity alert(s)", alerts);
    println!();
    Ok(())
}

// ── Scenario 2: custody transfer ──────────────────────────────────────────────

fn run_transfer() -> CustodyResult<()> {
    println!("Scenario 2: Custody Transfer Handshake");
    println!("--------------------------------------");

    let d = seed()?;

    let transfer = d
        .workflow
        .request_transfer("ev-1", "user-ava", "user-ben", "forensic imaging complete")?;
    println!(
        "  [1] Requested: {} ({})",
        transfer.transfer_id,
        transfer.status.as_str()
    );

    let transfer = d.workflow.approve(&transfer.transfer_id, "user-ben")?;
    println!(
        "  [2] Approved by recipient, to_signature={}",
        transfer.to_signature.as_deref().unwrap_or("<missing>")
    );

    let transfer = d.workflow.complete(&transfer.transfer_id, "user-ava")?;
    println!(
        "  [3] Completed by sender, from_signature={}",
        transfer.from_signature.as_deref().unwrap_or("<missing>")
    );

    let item = d
        .evidence
        .find("ev-1")
        .ok_or(custodia_contracts::error::CustodyError::NotFound {
            entity: "evidence",
            id: "ev-1".to_string(),
        })?;
    println!("  [4] Custodian is now {}", item.current_custodian_id);

    let total = d.ledger.query(&LedgerFilter::default(), 1, 100).total;
    println!("  [5] Ledger holds {} entries, chain intact: {}",
        total,
        d.ledger.verify_chain().intact
    );
    println!();
    Ok(())
}

// ── Scenario 3: audit chain ───────────────────────────────────────────────────

fn run_audit() -> CustodyResult<()> {
    println!("Scenario 3: Audit Chain Inspection");
    println!("----------------------------------");

    let d = seed()?;

    // Generate some history first.
    d.verifier.verify("ev-1", "user-ava")?;
    let t = d
        .workflow
        .request_transfer("ev-1", "user-ava", "user-ben", "handover")?;
    d.workflow.approve(&t.transfer_id, "user-ben")?;
    d.workflow.complete(&t.transfer_id, "user-ava")?;

    let report = d.ledger.verify_chain_logged(&custodia_contracts::actor::Actor {
        user_id: "user-admin".to_string(),
        email: "admin@agency.example".to_string(),
        role: Role::Admin,
    })?;
    println!(
        "  [1] Logged chain verification: intact={} entries={}",
        report.intact, report.total_entries
    );

    let checked = d.ledger.ensure_intact()?;
    println!("  [2] ensure_intact passed over {} entries", checked);

    let page = d.ledger.query(&LedgerFilter::default(), 1, 100);
    println!("  [3] Full trail, newest first:");
    for entry in &page.items {
        println!(
            "      #{:<3} {:<26} {:<10} {}",
            entry.sequence,
            entry.action.as_str(),
            entry.entity_type,
            entry.details
        );
    }
    println!();
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("Custodia — Tamper-evident Provenance Core");
    println!("=========================================");
    println!();
    println!("Every mutation funnels through the hash-chained audit ledger:");
    println!("  [1] Evidence bytes hashed at intake (SHA-256, streamed)");
    println!("  [2] Verification re-hashes and compares against the intake digest");
    println!("  [3] Custody changes only through the request/approve/complete handshake");
    println!("  [4] Each step appends a ledger entry linked to its predecessor by hash");
    println!();
}
