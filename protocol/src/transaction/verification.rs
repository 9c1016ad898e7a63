//! Transaction verification: signer coverage and cryptographic validation.
//!
//! Public keys live on accounts, outside this crate, so every function here
//! takes a lookup closure `(address, key_index) -> Option<EcdsaPublicKey>`.
//! The checks are ordered from cheapest to most expensive (set membership
//! before signature verification) to fail fast on clearly incomplete
//! transactions.

use thiserror::Error;
use tracing::debug;

use super::types::{Transaction, TransactionSignature};
use crate::crypto::keys::EcdsaPublicKey;
use crate::crypto::signatures::SignatureError;
use crate::identifier::Address;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during transaction verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// A required signer has no signature of the required kind.
    #[error("{role} {address} has not signed the {message}")]
    MissingSignature {
        address: Address,
        role: &'static str,
        message: &'static str,
    },

    /// The lookup has no public key for a signature's `(address, key_index)`.
    #[error("no public key for {address} key {key_index}")]
    UnknownKey { address: Address, key_index: u32 },

    /// A signature does not verify against its public key.
    #[error("invalid {message} signature from {address} key {key_index}: {source}")]
    InvalidSignature {
        address: Address,
        key_index: u32,
        message: &'static str,
        source: SignatureError,
    },
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// Checks that every required party has signed.
///
/// The payer must sign the envelope. The proposer and every authorizer must
/// sign the payload, unless they are also the payer, in which case their
/// envelope signature covers them.
pub fn verify_required_signers(tx: &Transaction) -> Result<(), VerificationError> {
    let payer = tx.payer();
    if !has_signed(tx.envelope_signatures(), payer) {
        return Err(VerificationError::MissingSignature {
            address: payer,
            role: "payer",
            message: "envelope",
        });
    }

    let proposer = std::iter::once((tx.proposal_key().address, "proposer"));
    let authorizers = tx.authorizers().iter().map(|a| (*a, "authorizer"));
    for (address, role) in proposer.chain(authorizers) {
        if address != payer && !has_signed(tx.payload_signatures(), address) {
            return Err(VerificationError::MissingSignature {
                address,
                role,
                message: "payload",
            });
        }
    }
    Ok(())
}

/// Verifies every payload signature over the domain-tagged payload.
pub fn verify_payload_signatures<F>(tx: &Transaction, lookup: F) -> Result<(), VerificationError>
where
    F: Fn(Address, u32) -> Option<EcdsaPublicKey>,
{
    verify_all(tx.payload_signatures(), &tx.payload_message(), "payload", &lookup)
}

/// Verifies every envelope signature over the domain-tagged authorization
/// envelope (payload plus the payload signatures currently attached).
pub fn verify_envelope_signatures<F>(tx: &Transaction, lookup: F) -> Result<(), VerificationError>
where
    F: Fn(Address, u32) -> Option<EcdsaPublicKey>,
{
    verify_all(
        tx.envelope_signatures(),
        &tx.envelope_message(),
        "envelope",
        &lookup,
    )
}

/// Full check: required signers present, then every payload and envelope
/// signature valid.
///
/// # Errors
///
/// Returns the first failing check.
pub fn verify_transaction<F>(tx: &Transaction, lookup: F) -> Result<(), VerificationError>
where
    F: Fn(Address, u32) -> Option<EcdsaPublicKey>,
{
    verify_required_signers(tx)?;
    verify_payload_signatures(tx, &lookup)?;
    verify_envelope_signatures(tx, &lookup)?;
    debug!(id = %tx.id(), "transaction signatures verified");
    Ok(())
}

fn has_signed(signatures: &[TransactionSignature], address: Address) -> bool {
    signatures.iter().any(|sig| sig.address == address)
}

fn verify_all<F>(
    signatures: &[TransactionSignature],
    message: &[u8],
    kind: &'static str,
    lookup: &F,
) -> Result<(), VerificationError>
where
    F: Fn(Address, u32) -> Option<EcdsaPublicKey>,
{
    for sig in signatures {
        let key = lookup(sig.address, sig.key_index).ok_or(VerificationError::UnknownKey {
            address: sig.address,
            key_index: sig.key_index,
        })?;
        key.verify_transaction(message, &sig.signature)
            .map_err(|source| VerificationError::InvalidSignature {
                address: sig.address,
                key_index: sig.key_index,
                message: kind,
                source,
            })?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
