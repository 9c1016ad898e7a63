// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Flow Transactions -- Canonical Encoding & Multi-Party Signing
//!
//! A transaction on the network is signed by up to three kinds of party: a
//! **proposer** (whose key sequence number orders it), any number of
//! **authorizers** (whose accounts the script may touch) and a **payer**
//! (who pays the fees). This crate builds transactions, renders the exact
//! bytes each party signs, collects their signatures in canonical order and
//! derives the transaction id, byte-for-byte compatible with every other
//! client on the network.
//!
//! ## Architecture
//!
//! - **identifier** -- fixed-width `Address` (8 bytes) and `TransactionId`
//!   (32 bytes) built on one generic type.
//! - **crypto** -- domain tags, DER signature normalization, hashing and a
//!   secp256k1 signer.
//! - **transaction** -- the value type, builder, RLP encoder/decoder,
//!   signature assembler, verification and the wire record.
//! - **config** -- protocol constants and the explicit `TransactionConfig`.
//! - **logging** -- `tracing-subscriber` setup for binaries and demos.
//!
//! ## Example
//!
//! ```
//! use flow_transaction::config::TransactionConfig;
//! use flow_transaction::crypto::{EcdsaSigner, HashAlgorithm};
//! use flow_transaction::transaction::TransactionBuilder;
//! use flow_transaction::Address;
//!
//! let account = Address::from_hex("01").unwrap();
//! let key = EcdsaSigner::generate(HashAlgorithm::Sha3_256);
//!
//! let tx = TransactionBuilder::new(&TransactionConfig::default())
//!     .script(r#"transaction { execute { log("Hello, World!") } }"#)
//!     .reference_block_id_hex("0102")
//!     .proposal_key(account, 0, 42)
//!     .payer(account)
//!     .authorizer(account)
//!     .build()
//!     .unwrap();
//!
//! // Proposer, payer and authorizer are one account: only the envelope
//! // needs a signature.
//! let signed = tx.sign_envelope(account, 0, &key).unwrap();
//! assert_ne!(signed.id(), tx.id());
//! ```

pub mod config;
pub mod crypto;
pub mod identifier;
pub mod logging;
pub mod transaction;

pub use identifier::{Address, IdentifierError, TransactionId};
pub use transaction::{Transaction, TransactionBuilder, TransactionError};
