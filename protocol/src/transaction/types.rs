//! Core value types: [`Transaction`], [`ProposalKey`] and
//! [`TransactionSignature`].
//!
//! A [`Transaction`] is immutable once built. The only way to "change" one
//! is to ask for a new value with an extra signature attached (see
//! [`super::signing`]), so a transaction held by one caller can never shift
//! under another caller's feet.

use serde::{Deserialize, Serialize};

use super::canonical;
use crate::crypto::hash::sha3_256;
use crate::identifier::{Address, TransactionId};

/// The account key whose sequence number orders (and de-duplicates) the
/// transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ProposalKey {
    pub address: Address,
    pub key_index: u32,
    pub sequence_number: u64,
}

impl ProposalKey {
    pub fn new(address: Address, key_index: u32, sequence_number: u64) -> Self {
        Self {
            address,
            key_index,
            sequence_number,
        }
    }
}

/// One signature attached to a transaction.
///
/// `signer_index` is the position of `address` in the transaction's
/// deduplicated signer list. Only `(signer_index, key_index, signature)` is
/// part of the canonical encoding; `address` rides along for callers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionSignature {
    pub address: Address,
    pub signer_index: usize,
    pub key_index: u32,
    pub signature: Vec<u8>,
}

impl TransactionSignature {
    pub fn new(address: Address, signer_index: usize, key_index: u32, signature: Vec<u8>) -> Self {
        Self {
            address,
            signer_index,
            key_index,
            signature,
        }
    }

    /// Sort key for signature lists: ascending signer, then key.
    pub(crate) fn order_key(&self) -> (usize, u32) {
        (self.signer_index, self.key_index)
    }
}

/// A transaction: script, arguments, metadata, and the signatures collected
/// so far.
///
/// Build one with [`TransactionBuilder`](super::TransactionBuilder) or
/// decode one with [`Transaction::decode`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transaction {
    pub(crate) script: Vec<u8>,
    pub(crate) arguments: Vec<Vec<u8>>,
    pub(crate) reference_block_id: TransactionId,
    pub(crate) gas_limit: u64,
    pub(crate) proposal_key: ProposalKey,
    pub(crate) payer: Address,
    pub(crate) authorizers: Vec<Address>,
    pub(crate) payload_signatures: Vec<TransactionSignature>,
    pub(crate) envelope_signatures: Vec<TransactionSignature>,
}

impl Transaction {
    pub fn script(&self) -> &[u8] {
        &self.script
    }

    /// Pre-encoded script arguments, opaque to this crate.
    pub fn arguments(&self) -> &[Vec<u8>] {
        &self.arguments
    }

    /// The block the transaction is anchored to (expiry is measured from it).
    pub fn reference_block_id(&self) -> TransactionId {
        self.reference_block_id
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    pub fn proposal_key(&self) -> ProposalKey {
        self.proposal_key
    }

    pub fn payer(&self) -> Address {
        self.payer
    }

    pub fn authorizers(&self) -> &[Address] {
        &self.authorizers
    }

    /// Payload signatures, sorted by `(signer_index, key_index)`.
    pub fn payload_signatures(&self) -> &[TransactionSignature] {
        &self.payload_signatures
    }

    /// Envelope signatures, sorted by `(signer_index, key_index)`.
    pub fn envelope_signatures(&self) -> &[TransactionSignature] {
        &self.envelope_signatures
    }

    /// Canonical payload bytes. Proposer and authorizers sign these.
    pub fn payload_message(&self) -> Vec<u8> {
        canonical::encode_payload(self)
    }

    /// Canonical authorization envelope bytes (payload plus the payload
    /// signatures collected so far). The payer signs these.
    pub fn envelope_message(&self) -> Vec<u8> {
        canonical::encode_authorization_envelope(self)
    }

    /// Full canonical encoding, both signature lists included.
    pub fn encode(&self) -> Vec<u8> {
        canonical::encode_transaction(self)
    }

    /// Decodes a full canonical encoding produced by [`Transaction::encode`].
    pub fn decode(bytes: &[u8]) -> Result<Self, canonical::DecodingError> {
        canonical::decode_transaction(bytes)
    }

    /// Content-addressed id: SHA3-256 of [`Transaction::encode`].
    ///
    /// Computed fresh on every call, so it reflects whatever signatures the
    /// value carries. Adding a signature yields a new value with a new id.
    pub fn id(&self) -> TransactionId {
        TransactionId::new(sha3_256(&self.encode()))
    }

    /// Returns `true` if at least one envelope signature is attached.
    pub fn is_envelope_signed(&self) -> bool {
        !self.envelope_signatures.is_empty()
    }
}
