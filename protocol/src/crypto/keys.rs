//! # Keys & Signers
//!
//! The assembler never touches key material directly. It asks a [`Signer`]
//! for signature bytes over a message and files the result. Anything that
//! can produce fixed-width `R ‖ S` bytes (an in-memory key, a hardware
//! wallet, a remote KMS) can implement [`Signer`].
//!
//! The in-crate implementation is [`EcdsaSigner`]: a secp256k1 key plus the
//! [`HashAlgorithm`] the account key was registered with. Signing goes
//!
//! ```text
//! message -> hash -> ECDSA (DER) -> normalize -> R ‖ S (64 bytes)
//! ```
//!
//! [`EcdsaPublicKey`] runs the same pipeline backwards for verification.
//!
//! Key bytes are never logged and `Debug` never prints them.

use std::fmt;

use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature as EcdsaSignature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use thiserror::Error;

use super::domain::DomainTag;
use super::hash::HashAlgorithm;
use super::signatures::{normalize_signature, SignatureError};
use crate::config::{component_size, SECP256K1_ORDER_BITS};

/// Width of one signature component on secp256k1.
pub const SECP256K1_COMPONENT_SIZE: usize = component_size(SECP256K1_ORDER_BITS);

/// Uncompressed SEC1 points start with this byte; the network's raw public
/// key format drops it.
const SEC1_UNCOMPRESSED_TAG: u8 = 0x04;

/// Errors from key handling and signing.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid private key bytes")]
    InvalidPrivateKey,

    #[error("invalid public key bytes")]
    InvalidPublicKey,

    #[error("signing failed: {0}")]
    SigningFailed(String),

    #[error(transparent)]
    Signature(#[from] SignatureError),
}

// ---------------------------------------------------------------------------
// Signer
// ---------------------------------------------------------------------------

/// Produces signature bytes over arbitrary messages.
///
/// Implementors only provide [`Signer::sign`]. The domain-tagged variants
/// are provided so every signer tags messages the same way.
pub trait Signer {
    /// Sign `message` as-is (no domain tag).
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, KeyError>;

    /// Sign `TRANSACTION_TAG ‖ message`.
    fn sign_as_transaction(&self, message: &[u8]) -> Result<Vec<u8>, KeyError> {
        self.sign(&DomainTag::TRANSACTION.tag_message(message))
    }

    /// Sign `USER_TAG ‖ message`.
    fn sign_as_user(&self, message: &[u8]) -> Result<Vec<u8>, KeyError> {
        self.sign(&DomainTag::USER.tag_message(message))
    }
}

impl<S: Signer + ?Sized> Signer for &S {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, KeyError> {
        (**self).sign(message)
    }
}

impl<S: Signer + ?Sized> Signer for Box<S> {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, KeyError> {
        (**self).sign(message)
    }
}

// ---------------------------------------------------------------------------
// EcdsaSigner
// ---------------------------------------------------------------------------

/// An in-memory secp256k1 signing key.
///
/// # Example
///
/// ```
/// use flow_transaction::crypto::{EcdsaSigner, HashAlgorithm, Signer};
///
/// let signer = EcdsaSigner::generate(HashAlgorithm::Sha3_256);
/// let signature = signer.sign_as_user(b"prove you own this key").unwrap();
///
/// assert_eq!(signature.len(), 64);
/// assert!(signer
///     .public_key()
///     .verify_user(b"prove you own this key", &signature)
///     .is_ok());
/// ```
#[derive(Clone)]
pub struct EcdsaSigner {
    signing_key: SigningKey,
    hash_algorithm: HashAlgorithm,
}

impl EcdsaSigner {
    /// Fresh key from the OS RNG.
    pub fn generate(hash_algorithm: HashAlgorithm) -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
            hash_algorithm,
        }
    }

    /// Loads a 32-byte big-endian private scalar.
    pub fn from_bytes(bytes: &[u8], hash_algorithm: HashAlgorithm) -> Result<Self, KeyError> {
        let signing_key = SigningKey::from_slice(bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self {
            signing_key,
            hash_algorithm,
        })
    }

    /// Loads a hex-encoded private scalar.
    pub fn from_hex(hex_str: &str, hash_algorithm: HashAlgorithm) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidPrivateKey)?;
        Self::from_bytes(&bytes, hash_algorithm)
    }

    /// The hash this key signs with.
    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    /// The matching verification key.
    pub fn public_key(&self) -> EcdsaPublicKey {
        EcdsaPublicKey {
            verifying_key: self.signing_key.verifying_key().clone(),
            hash_algorithm: self.hash_algorithm,
        }
    }

    /// Exports the private scalar. Handle with care.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }
}

impl Signer for EcdsaSigner {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, KeyError> {
        let digest = self.hash_algorithm.digest(message);
        let signature: EcdsaSignature =
            PrehashSigner::<EcdsaSignature>::sign_prehash(&self.signing_key, &digest)
                .map_err(|e| KeyError::SigningFailed(e.to_string()))?;

        let der = signature.to_der();
        Ok(normalize_signature(der.as_bytes(), SECP256K1_COMPONENT_SIZE)?)
    }
}

impl fmt::Debug for EcdsaSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcdsaSigner")
            .field("public_key", &self.public_key().to_hex())
            .field("hash_algorithm", &self.hash_algorithm)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// EcdsaPublicKey
// ---------------------------------------------------------------------------

/// A secp256k1 verification key plus the hash it expects.
#[derive(Clone, PartialEq, Eq)]
pub struct EcdsaPublicKey {
    verifying_key: VerifyingKey,
    hash_algorithm: HashAlgorithm,
}

impl EcdsaPublicKey {
    /// Parses the network's raw 64-byte `X ‖ Y` form, or any SEC1 encoding.
    pub fn from_bytes(bytes: &[u8], hash_algorithm: HashAlgorithm) -> Result<Self, KeyError> {
        let verifying_key = if bytes.len() == 2 * SECP256K1_COMPONENT_SIZE {
            let mut sec1 = Vec::with_capacity(bytes.len() + 1);
            sec1.push(SEC1_UNCOMPRESSED_TAG);
            sec1.extend_from_slice(bytes);
            VerifyingKey::from_sec1_bytes(&sec1)
        } else {
            VerifyingKey::from_sec1_bytes(bytes)
        }
        .map_err(|_| KeyError::InvalidPublicKey)?;

        Ok(Self {
            verifying_key,
            hash_algorithm,
        })
    }

    /// Parses hex in any format accepted by [`EcdsaPublicKey::from_bytes`].
    pub fn from_hex(hex_str: &str, hash_algorithm: HashAlgorithm) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidPublicKey)?;
        Self::from_bytes(&bytes, hash_algorithm)
    }

    /// Raw 64-byte `X ‖ Y`, the format account keys are stored in.
    pub fn to_bytes(&self) -> Vec<u8> {
        let point = self.verifying_key.to_encoded_point(false);
        point.as_bytes()[1..].to_vec()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_algorithm
    }

    /// Verifies a fixed-width `R ‖ S` signature over `message` (no tag).
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), SignatureError> {
        let expected = 2 * SECP256K1_COMPONENT_SIZE;
        if signature.len() != expected {
            return Err(SignatureError::InvalidLength {
                expected,
                actual: signature.len(),
            });
        }

        let signature =
            EcdsaSignature::from_slice(signature).map_err(|_| SignatureError::VerificationFailed)?;
        let digest = self.hash_algorithm.digest(message);
        self.verifying_key
            .verify_prehash(&digest, &signature)
            .map_err(|_| SignatureError::VerificationFailed)
    }

    /// Verifies a signature over `TRANSACTION_TAG ‖ message`.
    pub fn verify_transaction(&self, message: &[u8], signature: &[u8]) -> Result<(), SignatureError> {
        self.verify(&DomainTag::TRANSACTION.tag_message(message), signature)
    }

    /// Verifies a signature over `USER_TAG ‖ message`.
    pub fn verify_user(&self, message: &[u8], signature: &[u8]) -> Result<(), SignatureError> {
        self.verify(&DomainTag::USER.tag_message(message), signature)
    }
}

impl fmt::Debug for EcdsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EcdsaPublicKey({}, {:?})", self.to_hex(), self.hash_algorithm)
    }
}
