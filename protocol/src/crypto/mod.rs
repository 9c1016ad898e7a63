//! # Cryptographic Primitives
//!
//! Everything the transaction layer needs from cryptography, and nothing it
//! doesn't:
//!
//! - **domain** -- 32-byte domain tags that namespace signed messages.
//! - **signatures** -- DER to fixed-width `R ‖ S` normalization.
//! - **hash** -- SHA3-256 for content addressing, SHA2-256/SHA3-256 for keys.
//! - **keys** -- the [`Signer`] seam and an in-memory secp256k1 signer.
//!
//! All of it is a thin layer over the RustCrypto crates. Picking curves and
//! hash algorithms for accounts happens elsewhere; this module only applies
//! whatever the caller chose.

pub mod domain;
pub mod hash;
pub mod keys;
pub mod signatures;

pub use domain::{DomainTag, DomainTagError};
pub use hash::{sha2_256, sha3_256, HashAlgorithm};
pub use keys::{EcdsaPublicKey, EcdsaSigner, KeyError, Signer, SECP256K1_COMPONENT_SIZE};
pub use signatures::{normalize_signature, parse_der_signature, SignatureError};
