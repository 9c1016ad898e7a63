//! Terminal walkthrough of a sponsored, multi-party transaction.
//!
//! Builds a transaction with a proposer, two authorizers and a separate
//! payer, collects every signature, prints the bytes each party signs and
//! the id after each step, then decodes and verifies the result the way a
//! receiving node would.
//!
//! Run with:
//!   cargo run --example demo
//!
//! Set `RUST_LOG=flow_transaction=debug` to see the library's own events.

use std::collections::HashMap;
use std::time::Instant;

use flow_transaction::config::TransactionConfig;
use flow_transaction::crypto::{EcdsaPublicKey, EcdsaSigner, HashAlgorithm};
use flow_transaction::logging::{init_logging, LogFormat};
use flow_transaction::transaction::{verify_transaction, Transaction, TransactionBuilder};
use flow_transaction::{Address, TransactionError};

// ---------------------------------------------------------------------------
// ANSI color constants
// ---------------------------------------------------------------------------

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

fn section(num: u32, title: &str) {
    println!();
    println!("{BOLD}{CYAN}===[{YELLOW} Step {num} {CYAN}]================================================{RESET}");
    println!("{BOLD}{WHITE}  {title}{RESET}");
}

fn success(text: &str) {
    println!("{GREEN}  [OK] {text}{RESET}");
}

fn info(label: &str, value: &str) {
    println!("{WHITE}  {BOLD}{label}:{RESET} {YELLOW}{value}{RESET}");
}

fn timing(label: &str, elapsed: std::time::Duration) {
    let ms = elapsed.as_secs_f64() * 1000.0;
    println!("{DIM}{MAGENTA}  [{label}: {ms:.2} ms]{RESET}");
}

fn short_hex(bytes: &[u8]) -> String {
    let hex = hex::encode(bytes);
    if hex.len() <= 48 {
        hex
    } else {
        format!("{}...{} ({} bytes)", &hex[..24], &hex[hex.len() - 16..], bytes.len())
    }
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

struct Account {
    name: &'static str,
    address: Address,
    key: EcdsaSigner,
}

impl Account {
    fn new(name: &'static str, address: &str, hash: HashAlgorithm) -> Result<Self, TransactionError> {
        Ok(Self {
            name,
            address: Address::from_hex(address)?,
            key: EcdsaSigner::generate(hash),
        })
    }
}

fn main() -> Result<(), TransactionError> {
    let _ = init_logging("warn", LogFormat::Pretty);

    // -----------------------------------------------------------------------
    section(1, "Accounts");
    // -----------------------------------------------------------------------
    let proposer = Account::new("proposer", "01cf0e2f2f715450", HashAlgorithm::Sha3_256)?;
    let alice = Account::new("alice", "179b6b1cb6755e31", HashAlgorithm::Sha3_256)?;
    let bob = Account::new("bob", "f3fcd2c1a78f5eee", HashAlgorithm::Sha2_256)?;
    let sponsor = Account::new("sponsor", "f8d6e0586b0a20c7", HashAlgorithm::Sha2_256)?;
    for account in [&proposer, &alice, &bob, &sponsor] {
        info(account.name, &account.address.to_hex());
    }

    let keys: HashMap<Address, EcdsaPublicKey> = [&proposer, &alice, &bob, &sponsor]
        .into_iter()
        .map(|a| (a.address, a.key.public_key()))
        .collect();

    // -----------------------------------------------------------------------
    section(2, "Build");
    // -----------------------------------------------------------------------
    let config = TransactionConfig::default().with_default_payer(sponsor.address);
    let tx: Transaction = TransactionBuilder::new(&config)
        .script("transaction { prepare(a: &Account, b: &Account) { log(a.address) } }")
        .reference_block_id_hex("7bc42fe85d32ca513769a74f97f7e1a7bad6c9407f0d934c2aa645ef9cf613c7")
        .proposal_key(proposer.address, 0, 42)
        .authorizer(alice.address)
        .authorizer(bob.address)
        .build()?;

    info("signers", &format!("{}", tx.signer_list().len()));
    info("payload", &short_hex(&tx.payload_message()));
    info("id (unsigned)", &tx.id().to_hex());

    // -----------------------------------------------------------------------
    section(3, "Payload signatures");
    // -----------------------------------------------------------------------
    let start = Instant::now();
    let tx = [&bob, &proposer, &alice]
        .into_iter()
        .try_fold(tx, |tx, account| tx.sign_payload(account.address, 0, &account.key))?;
    timing("three payload signatures", start.elapsed());

    for sig in tx.payload_signatures() {
        info(
            &format!("signer {} key {}", sig.signer_index, sig.key_index),
            &short_hex(&sig.signature),
        );
    }
    info("id", &tx.id().to_hex());

    // -----------------------------------------------------------------------
    section(4, "Envelope signature");
    // -----------------------------------------------------------------------
    info("envelope", &short_hex(&tx.envelope_message()));
    let tx = tx.sign_envelope(sponsor.address, 0, &sponsor.key)?;
    info("id (final)", &tx.id().to_hex());

    // -----------------------------------------------------------------------
    section(5, "Transport & verification");
    // -----------------------------------------------------------------------
    let bytes = tx.encode();
    info("encoded", &short_hex(&bytes));

    let start = Instant::now();
    let received = Transaction::decode(&bytes)?;
    verify_transaction(&received, |address, key_index| {
        (key_index == 0).then(|| keys.get(&address).cloned()).flatten()
    })?;
    timing("decode + verify", start.elapsed());

    success(&format!("transaction {} verified", received.id()));
    println!();
    Ok(())
}
