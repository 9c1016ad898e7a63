//! # Fixed-Width Identifiers
//!
//! Addresses and transaction ids are both "a handful of bytes, always the
//! same handful". Instead of a family of hand-written newtypes we have one
//! generic [`FixedBytes`], parameterized by width and by a marker type that
//! keeps an [`Address`] from ever being confused with a [`TransactionId`].
//!
//! Construction rules are shared:
//!
//! - shorter input is left-padded with zero bytes (`"01"` is address
//!   `0x0000000000000001`),
//! - longer input is a hard [`IdentifierError::FixedWidthOverflow`],
//! - hex input may carry a `0x` prefix and may have an odd digit count.
//!
//! Equality, ordering and hashing are derived from the bytes.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::config::{ADDRESS_LENGTH, ID_LENGTH};

/// Errors from constructing a fixed-width identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The input has more bytes than the identifier can hold.
    #[error("{kind} input is {actual} bytes, maximum is {max}")]
    FixedWidthOverflow {
        kind: &'static str,
        max: usize,
        actual: usize,
    },

    /// The input string is not valid hexadecimal.
    #[error("invalid hex for {kind}: {reason}")]
    InvalidHex { kind: &'static str, reason: String },
}

/// Names a family of fixed-width identifiers. Only used for diagnostics.
pub trait IdentifierKind {
    /// Human-readable name used in errors and `Debug` output.
    const NAME: &'static str;
}

/// Marker for account addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AddressKind {}

impl IdentifierKind for AddressKind {
    const NAME: &'static str = "Address";
}

/// Marker for transaction and block identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdKind {}

impl IdentifierKind for IdKind {
    const NAME: &'static str = "TransactionId";
}

/// `N` bytes, tagged with a kind `K`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixedBytes<const N: usize, K> {
    bytes: [u8; N],
    kind: PhantomData<K>,
}

/// An 8-byte account address.
pub type Address = FixedBytes<ADDRESS_LENGTH, AddressKind>;

/// A 32-byte transaction (or reference block) identifier.
pub type TransactionId = FixedBytes<ID_LENGTH, IdKind>;

impl<const N: usize, K: IdentifierKind> FixedBytes<N, K> {
    /// Width in bytes.
    pub const LEN: usize = N;

    /// Wraps an exact-width array.
    pub const fn new(bytes: [u8; N]) -> Self {
        Self {
            bytes,
            kind: PhantomData,
        }
    }

    /// All-zero identifier.
    pub const fn zero() -> Self {
        Self::new([0u8; N])
    }

    /// Builds an identifier from up to `N` bytes, left-padding with zeros.
    pub fn from_slice(input: &[u8]) -> Result<Self, IdentifierError> {
        if input.len() > N {
            return Err(IdentifierError::FixedWidthOverflow {
                kind: K::NAME,
                max: N,
                actual: input.len(),
            });
        }
        let mut bytes = [0u8; N];
        bytes[N - input.len()..].copy_from_slice(input);
        Ok(Self::new(bytes))
    }

    /// Parses hex (optionally `0x`-prefixed, odd length allowed) and
    /// left-pads to `N` bytes.
    pub fn from_hex(input: &str) -> Result<Self, IdentifierError> {
        let digits = input
            .strip_prefix("0x")
            .or_else(|| input.strip_prefix("0X"))
            .unwrap_or(input);

        let decoded = if digits.len() % 2 == 1 {
            hex::decode(format!("0{digits}"))
        } else {
            hex::decode(digits)
        }
        .map_err(|e| IdentifierError::InvalidHex {
            kind: K::NAME,
            reason: e.to_string(),
        })?;

        Self::from_slice(&decoded)
    }

    /// Borrow the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    /// Copy out the raw bytes.
    pub const fn to_bytes(self) -> [u8; N] {
        self.bytes
    }

    /// Lower-case hex, no prefix, always `2 * N` digits.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Returns `true` for the all-zero identifier.
    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|b| *b == 0)
    }
}

impl<const N: usize, K: IdentifierKind> Default for FixedBytes<N, K> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<const N: usize, K: IdentifierKind> AsRef<[u8]> for FixedBytes<N, K> {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl<const N: usize, K: IdentifierKind> From<[u8; N]> for FixedBytes<N, K> {
    fn from(bytes: [u8; N]) -> Self {
        Self::new(bytes)
    }
}

impl<const N: usize, K: IdentifierKind> TryFrom<&[u8]> for FixedBytes<N, K> {
    type Error = IdentifierError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(value)
    }
}

impl<const N: usize, K: IdentifierKind> FromStr for FixedBytes<N, K> {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl<const N: usize, K: IdentifierKind> fmt::Display for FixedBytes<N, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl<const N: usize, K: IdentifierKind> fmt::Debug for FixedBytes<N, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", K::NAME, self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Serde: hex strings in every format
// ---------------------------------------------------------------------------

impl<const N: usize, K: IdentifierKind> Serialize for FixedBytes<N, K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de, const N: usize, K: IdentifierKind> Deserialize<'de> for FixedBytes<N, K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HexVisitor<const M: usize, J>(PhantomData<J>);

        impl<'de, const M: usize, J: IdentifierKind> Visitor<'de> for HexVisitor<M, J> {
            type Value = FixedBytes<M, J>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a hex string of at most {} bytes", M)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                FixedBytes::from_hex(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(HexVisitor::<N, K>(PhantomData))
    }
}
