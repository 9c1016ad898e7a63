//! Aggregate error for callers that drive the whole transaction lifecycle
//! and want a single error type to propagate with `?`.

use thiserror::Error;

use super::builder::BuildError;
use super::canonical::DecodingError;
use super::verification::VerificationError;
use super::wire::WireError;
use crate::crypto::domain::DomainTagError;
use crate::crypto::keys::KeyError;
use crate::crypto::signatures::SignatureError;
use crate::identifier::IdentifierError;

/// Any failure from building, signing, encoding or verifying a transaction.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error(transparent)]
    DomainTag(#[from] DomainTagError),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Decoding(#[from] DecodingError),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    Wire(#[from] WireError),
}
