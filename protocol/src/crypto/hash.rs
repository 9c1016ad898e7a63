//! # Hashing Utilities
//!
//! Two hash functions, both 256-bit, both from the RustCrypto family:
//!
//! - **SHA3-256** -- content addressing. A transaction id is the SHA3-256
//!   of its full canonical encoding, and every other client computes it the
//!   same way, so this one is not up for debate.
//!
//! - **SHA2-256** -- one of the two message hashes an account key may be
//!   registered with. Keys pick their hash when they are added to an
//!   account; signers just follow along via [`HashAlgorithm`].

use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sha3::{Digest, Sha3_256};

use crate::config::HASH_OUTPUT_LENGTH;

/// Compute the SHA2-256 digest of `data`.
///
/// # Example
///
/// ```
/// use flow_transaction::crypto::sha2_256;
///
/// let hash = sha2_256(b"abc");
/// assert_eq!(hash[0], 0xba);
/// ```
pub fn sha2_256(data: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
    Sha256::digest(data).into()
}

/// Compute the SHA3-256 digest of `data`.
///
/// This is the hash behind [`Transaction::id`](crate::transaction::Transaction::id).
pub fn sha3_256(data: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
    Sha3_256::digest(data).into()
}

/// The message hash an account key was registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HashAlgorithm {
    Sha2_256,
    Sha3_256,
}

impl HashAlgorithm {
    /// Hash `data` with this algorithm.
    pub fn digest(&self, data: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
        match self {
            HashAlgorithm::Sha2_256 => sha2_256(data),
            HashAlgorithm::Sha3_256 => sha3_256(data),
        }
    }
}
