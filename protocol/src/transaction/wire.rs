//! Wire record for handing transactions to (and taking them from) transport.
//!
//! [`TransactionRecord`] mirrors the access-API message: script, arguments,
//! reference block, gas limit, proposal key, payer, authorizers and the two
//! signature lists. Signatures carry their address but no signer index; the
//! index is recomputed when a record is turned back into a [`Transaction`].
//!
//! Byte fields are hex strings in human-readable formats (JSON) and raw bytes
//! in binary ones (bincode).

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use super::types::{ProposalKey, Transaction, TransactionSignature};
use crate::identifier::{Address, TransactionId};

/// Errors from serializing or deserializing a [`TransactionRecord`].
#[derive(Debug, Error)]
pub enum WireError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode error: {0}")]
    Bincode(#[from] bincode::Error),
}

/// A signature as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub address: Address,
    pub key_index: u32,
    #[serde(with = "hex_bytes")]
    pub signature: Vec<u8>,
}

/// A transaction as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(with = "hex_bytes")]
    pub script: Vec<u8>,
    #[serde(with = "hex_bytes_list")]
    pub arguments: Vec<Vec<u8>>,
    pub reference_block_id: TransactionId,
    pub gas_limit: u64,
    pub proposal_key: ProposalKey,
    pub payer: Address,
    pub authorizers: Vec<Address>,
    pub payload_signatures: Vec<SignatureRecord>,
    pub envelope_signatures: Vec<SignatureRecord>,
}

impl TransactionRecord {
    pub fn to_json(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_bincode(&self) -> Result<Vec<u8>, WireError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bincode(bytes: &[u8]) -> Result<Self, WireError> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Rebuilds the transaction, replaying each signature through
    /// [`Transaction::add_payload_signature`] /
    /// [`Transaction::add_envelope_signature`] so that signer indices and
    /// ordering follow the usual rules.
    pub fn into_transaction(self) -> Transaction {
        let unsigned = Transaction {
            script: self.script,
            arguments: self.arguments,
            reference_block_id: self.reference_block_id,
            gas_limit: self.gas_limit,
            proposal_key: self.proposal_key,
            payer: self.payer,
            authorizers: self.authorizers,
            payload_signatures: Vec::new(),
            envelope_signatures: Vec::new(),
        };

        let with_payload = self
            .payload_signatures
            .into_iter()
            .fold(unsigned, |tx, sig| {
                tx.add_payload_signature(sig.address, sig.key_index, sig.signature)
            });
        let tx = self
            .envelope_signatures
            .into_iter()
            .fold(with_payload, |tx, sig| {
                tx.add_envelope_signature(sig.address, sig.key_index, sig.signature)
            });

        trace!(
            payload_signatures = tx.payload_signatures.len(),
            envelope_signatures = tx.envelope_signatures.len(),
            "rebuilt transaction from wire record"
        );
        tx
    }
}

impl From<&Transaction> for TransactionRecord {
    fn from(tx: &Transaction) -> Self {
        let records = |list: &[TransactionSignature]| -> Vec<SignatureRecord> {
            list.iter()
                .map(|sig| SignatureRecord {
                    address: sig.address,
                    key_index: sig.key_index,
                    signature: sig.signature.clone(),
                })
                .collect()
        };

        Self {
            script: tx.script.clone(),
            arguments: tx.arguments.clone(),
            reference_block_id: tx.reference_block_id,
            gas_limit: tx.gas_limit,
            proposal_key: tx.proposal_key,
            payer: tx.payer,
            authorizers: tx.authorizers.clone(),
            payload_signatures: records(&tx.payload_signatures),
            envelope_signatures: records(&tx.envelope_signatures),
        }
    }
}

impl From<TransactionRecord> for Transaction {
    fn from(record: TransactionRecord) -> Self {
        record.into_transaction()
    }
}

/// `Vec<u8>` as hex in human-readable formats, raw bytes otherwise.
mod hex_bytes {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(bytes))
        } else {
            serializer.serialize_bytes(bytes)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            hex::decode(s.trim_start_matches("0x")).map_err(D::Error::custom)
        } else {
            Vec::<u8>::deserialize(deserializer)
        }
    }
}

mod hex_bytes_list {
    use serde::de::Error as _;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(items: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        let human = serializer.is_human_readable();
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in items {
            if human {
                seq.serialize_element(&hex::encode(item))?;
            } else {
                seq.serialize_element(item)?;
            }
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<u8>>, D::Error> {
        if deserializer.is_human_readable() {
            Vec::<String>::deserialize(deserializer)?
                .iter()
                .map(|s| hex::decode(s.trim_start_matches("0x")).map_err(D::Error::custom))
                .collect()
        } else {
            Vec::<Vec<u8>>::deserialize(deserializer)
        }
    }
}
