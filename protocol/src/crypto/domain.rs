//! # Domain Tags
//!
//! A domain tag is a fixed 32-byte prefix glued onto a message before it is
//! hashed and signed. Two tags exist:
//!
//! - [`DomainTag::TRANSACTION`] -- payloads and authorization envelopes.
//! - [`DomainTag::USER`] -- anything else a key signs (key-list proofs,
//!   login challenges, off-chain attestations).
//!
//! A signature produced under one tag can never verify under the other, so
//! a user message can't be replayed as a transaction and vice versa.
//!
//! Normalization: UTF-8 encode, reject anything over 32 bytes, right-pad
//! with zeros up to exactly 32.

use std::fmt;

use thiserror::Error;

use crate::config::{DOMAIN_TAG_LENGTH, TRANSACTION_DOMAIN_TAG, USER_DOMAIN_TAG};

/// Errors from building a domain tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainTagError {
    #[error("domain tag is {length} bytes, maximum is {max}")]
    TagTooLong { length: usize, max: usize },
}

/// A normalized 32-byte domain tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomainTag([u8; DOMAIN_TAG_LENGTH]);

impl DomainTag {
    /// Tag for transaction payloads and envelopes.
    pub const TRANSACTION: DomainTag = DomainTag::from_static(TRANSACTION_DOMAIN_TAG);

    /// Tag for arbitrary user messages.
    pub const USER: DomainTag = DomainTag::from_static(USER_DOMAIN_TAG);

    /// Normalizes `tag` into a 32-byte domain tag.
    ///
    /// # Errors
    ///
    /// [`DomainTagError::TagTooLong`] if the UTF-8 encoding exceeds 32 bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use flow_transaction::crypto::DomainTag;
    ///
    /// let tag = DomainTag::new("FLOW-V0.0-user").unwrap();
    /// assert_eq!(tag, DomainTag::USER);
    /// assert!(DomainTag::new("this tag is far, far too long to fit").is_err());
    /// ```
    pub fn new(tag: &str) -> Result<Self, DomainTagError> {
        let bytes = tag.as_bytes();
        if bytes.len() > DOMAIN_TAG_LENGTH {
            return Err(DomainTagError::TagTooLong {
                length: bytes.len(),
                max: DOMAIN_TAG_LENGTH,
            });
        }
        let mut padded = [0u8; DOMAIN_TAG_LENGTH];
        padded[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(padded))
    }

    /// Compile-time normalization for the built-in tags. An oversized
    /// constant fails the build instead of failing at runtime.
    const fn from_static(tag: &'static str) -> Self {
        let bytes = tag.as_bytes();
        assert!(bytes.len() <= DOMAIN_TAG_LENGTH, "domain tag too long");

        let mut padded = [0u8; DOMAIN_TAG_LENGTH];
        let mut i = 0;
        while i < bytes.len() {
            padded[i] = bytes[i];
            i += 1;
        }
        Self(padded)
    }

    /// The 32 tag bytes.
    pub const fn as_bytes(&self) -> &[u8; DOMAIN_TAG_LENGTH] {
        &self.0
    }

    /// Returns `tag ‖ message`, the exact bytes a signer hashes.
    pub fn tag_message(&self, message: &[u8]) -> Vec<u8> {
        let mut tagged = Vec::with_capacity(DOMAIN_TAG_LENGTH + message.len());
        tagged.extend_from_slice(&self.0);
        tagged.extend_from_slice(message);
        tagged
    }
}

impl AsRef<[u8]> for DomainTag {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for DomainTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text_len = self
            .0
            .iter()
            .rposition(|b| *b != 0)
            .map_or(0, |last| last + 1);
        write!(f, "DomainTag({:?})", String::from_utf8_lossy(&self.0[..text_len]))
    }
}
