//! # Transaction Module
//!
//! Construction, canonical encoding, signing and verification of
//! transactions. A [`Transaction`] is an immutable value; signing returns a
//! new value with the signature attached.
//!
//! ## Architecture
//!
//! ```text
//! types.rs        Transaction, ProposalKey, TransactionSignature
//! builder.rs      TransactionBuilder, collecting every violation at build()
//! canonical.rs    RLP payload / authorization envelope / full encoding and decoding
//! signers.rs      Deduplicated signer list and signer-index map
//! signing.rs      Signature assembly (sorting, signer-index reconciliation)
//! verification.rs Signer coverage and ECDSA signature checks
//! wire.rs         Serde wire record (JSON / bincode)
//! error.rs        Aggregate TransactionError
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build** with [`TransactionBuilder`].
//! 2. **Payload signatures**: proposer and authorizers sign
//!    [`Transaction::payload_message`] via [`Transaction::sign_payload`].
//! 3. **Envelope signature**: the payer signs
//!    [`Transaction::envelope_message`] via [`Transaction::sign_envelope`].
//! 4. **Hand off**: [`Transaction::encode`] or a [`TransactionRecord`] goes
//!    to the transport layer; [`Transaction::id`] identifies it.
//!
//! Signing messages are prefixed with the 32-byte transaction domain tag
//! before hashing, so a transaction signature can never be replayed as a
//! user-message signature or the other way round.

pub mod builder;
pub mod canonical;
pub mod error;
pub mod signers;
pub mod signing;
pub mod types;
pub mod verification;
pub mod wire;

pub use builder::{BuildError, BuildViolation, TransactionBuilder};
pub use canonical::{
    decode_authorization_envelope, decode_payload, decode_transaction,
    encode_authorization_envelope, encode_payload, encode_transaction, DecodingError,
};
pub use error::TransactionError;
pub use signers::{signer_list, signer_map};
pub use types::{ProposalKey, Transaction, TransactionSignature};
pub use verification::{
    verify_envelope_signatures, verify_payload_signatures, verify_required_signers,
    verify_transaction, VerificationError,
};
pub use wire::{SignatureRecord, TransactionRecord, WireError};
