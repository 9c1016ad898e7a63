//! Transaction construction via the builder pattern.
//!
//! The [`TransactionBuilder`] never panics and never fails halfway through a
//! chain of setters. Bad input (a malformed hex address, say) is recorded and
//! construction carries on; [`TransactionBuilder::build`] then reports every
//! problem at once in a [`BuildError`].
//!
//! The builder does not sign. That happens afterwards, on the built value, in
//! [`super::signing`]. Keeping the two apart means construction is testable
//! without key material.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use super::types::{ProposalKey, Transaction, TransactionSignature};
use crate::config::TransactionConfig;
use crate::identifier::{Address, IdentifierError, TransactionId};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// One reason a builder could not produce a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildViolation {
    #[error("script is missing or empty")]
    MissingScript,

    #[error("reference block id is missing")]
    MissingReferenceBlock,

    #[error("proposal key is missing")]
    MissingProposalKey,

    #[error("payer is missing and no default payer is configured")]
    MissingPayer,

    #[error("gas limit must be greater than zero")]
    ZeroGasLimit,

    #[error("invalid {field}: {source}")]
    InvalidIdentifier {
        field: &'static str,
        source: IdentifierError,
    },
}

/// Every violation found by [`TransactionBuilder::build`], in the order the
/// builder checks them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot build transaction: {}", join_violations(.violations))]
pub struct BuildError {
    pub violations: Vec<BuildViolation>,
}

fn join_violations(violations: &[BuildViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for unsigned (or literally pre-signed) [`Transaction`]s.
///
/// # Usage
///
/// ```
/// use flow_transaction::config::TransactionConfig;
/// use flow_transaction::transaction::TransactionBuilder;
///
/// let config = TransactionConfig::default();
/// let tx = TransactionBuilder::new(&config)
///     .script(r#"transaction { execute { log("hi") } }"#)
///     .reference_block_id_hex("0102")
///     .proposal_key_hex("01", 0, 7)
///     .payer_hex("02")
///     .authorizer_hex("01")
///     .build()
///     .unwrap();
///
/// assert_eq!(tx.gas_limit(), config.default_gas_limit);
/// assert_eq!(tx.signer_list().len(), 2);
/// ```
///
/// Defaults come from the [`TransactionConfig`] passed to [`new`](Self::new):
/// the gas limit when `.gas_limit(..)` is never called, and the payer when
/// `.payer(..)` is never called.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    default_gas_limit: u64,
    default_payer: Option<Address>,
    script: Vec<u8>,
    arguments: Vec<Vec<u8>>,
    reference_block_id: Option<TransactionId>,
    gas_limit: Option<u64>,
    proposal_key: Option<ProposalKey>,
    payer: Option<Address>,
    authorizers: Vec<Address>,
    payload_signatures: Vec<TransactionSignature>,
    envelope_signatures: Vec<TransactionSignature>,
    violations: Vec<BuildViolation>,
}

impl TransactionBuilder {
    /// Creates an empty builder using the defaults in `config`.
    pub fn new(config: &TransactionConfig) -> Self {
        Self {
            default_gas_limit: config.default_gas_limit,
            default_payer: config.default_payer,
            script: Vec::new(),
            arguments: Vec::new(),
            reference_block_id: None,
            gas_limit: None,
            proposal_key: None,
            payer: None,
            authorizers: Vec::new(),
            payload_signatures: Vec::new(),
            envelope_signatures: Vec::new(),
            violations: Vec::new(),
        }
    }

    /// Sets the script source.
    pub fn script(mut self, script: impl Into<Vec<u8>>) -> Self {
        self.script = script.into();
        self
    }

    /// Appends one pre-encoded argument.
    pub fn argument(mut self, argument: impl Into<Vec<u8>>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    /// Appends several pre-encoded arguments.
    pub fn arguments<I, A>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Vec<u8>>,
    {
        self.arguments.extend(arguments.into_iter().map(Into::into));
        self
    }

    /// Sets the reference block id.
    pub fn reference_block_id(mut self, id: TransactionId) -> Self {
        self.reference_block_id = Some(id);
        self
    }

    /// Sets the reference block id from hex (left-padded to 32 bytes).
    pub fn reference_block_id_hex(mut self, hex: &str) -> Self {
        match TransactionId::from_hex(hex) {
            Ok(id) => self.reference_block_id = Some(id),
            Err(source) => self.record("reference_block_id", source),
        }
        self
    }

    /// Sets the gas limit, overriding the configured default.
    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    /// Sets the proposal key.
    pub fn proposal_key(mut self, address: Address, key_index: u32, sequence_number: u64) -> Self {
        self.proposal_key = Some(ProposalKey::new(address, key_index, sequence_number));
        self
    }

    /// Sets the proposal key from a hex address.
    pub fn proposal_key_hex(self, address: &str, key_index: u32, sequence_number: u64) -> Self {
        match Address::from_hex(address) {
            Ok(address) => self.proposal_key(address, key_index, sequence_number),
            Err(source) => {
                let mut this = self;
                this.record("proposal_key.address", source);
                this
            }
        }
    }

    /// Sets the payer, overriding the configured default.
    pub fn payer(mut self, address: Address) -> Self {
        self.payer = Some(address);
        self
    }

    /// Sets the payer from a hex address.
    pub fn payer_hex(mut self, address: &str) -> Self {
        match Address::from_hex(address) {
            Ok(address) => self.payer = Some(address),
            Err(source) => self.record("payer", source),
        }
        self
    }

    /// Appends an authorizer. Order matters: it fixes signer indices.
    pub fn authorizer(mut self, address: Address) -> Self {
        self.authorizers.push(address);
        self
    }

    /// Appends an authorizer from a hex address.
    pub fn authorizer_hex(mut self, address: &str) -> Self {
        match Address::from_hex(address) {
            Ok(address) => self.authorizers.push(address),
            Err(source) => self.record("authorizer", source),
        }
        self
    }

    /// Attaches a payload signature collected elsewhere.
    ///
    /// If the address is one of the transaction's signers, `build` replaces
    /// the given `signer_index` with the address's position in the signer
    /// list. Any other address keeps the index it was given.
    pub fn payload_signature(mut self, signature: TransactionSignature) -> Self {
        self.payload_signatures.push(signature);
        self
    }

    /// Attaches an envelope signature collected elsewhere. Signer indices
    /// are reconciled as for [`payload_signature`](Self::payload_signature).
    pub fn envelope_signature(mut self, signature: TransactionSignature) -> Self {
        self.envelope_signatures.push(signature);
        self
    }

    fn record(&mut self, field: &'static str, source: IdentifierError) {
        self.violations
            .push(BuildViolation::InvalidIdentifier { field, source });
    }

    /// Consumes the builder and produces a [`Transaction`].
    ///
    /// Literal signatures from recognized signers are re-indexed against the
    /// signer list, then each list is sorted by `(signer_index, key_index)`.
    /// On failure, the error lists every violated requirement, not just the
    /// first.
    pub fn build(self) -> Result<Transaction, BuildError> {
        let mut violations = Vec::new();

        if self.script.is_empty() {
            violations.push(BuildViolation::MissingScript);
        }
        if self.reference_block_id.is_none() {
            violations.push(BuildViolation::MissingReferenceBlock);
        }
        if self.proposal_key.is_none() {
            violations.push(BuildViolation::MissingProposalKey);
        }
        let payer = self.payer.or(self.default_payer);
        if payer.is_none() {
            violations.push(BuildViolation::MissingPayer);
        }
        let gas_limit = self.gas_limit.unwrap_or(self.default_gas_limit);
        if gas_limit == 0 {
            violations.push(BuildViolation::ZeroGasLimit);
        }
        violations.extend(self.violations);

        let (Some(reference_block_id), Some(proposal_key), Some(payer), true) = (
            self.reference_block_id,
            self.proposal_key,
            payer,
            violations.is_empty(),
        ) else {
            debug!(violations = violations.len(), "transaction build rejected");
            return Err(BuildError { violations });
        };

        let mut tx = Transaction {
            script: self.script,
            arguments: self.arguments,
            reference_block_id,
            gas_limit,
            proposal_key,
            payer,
            authorizers: self.authorizers,
            payload_signatures: Vec::new(),
            envelope_signatures: Vec::new(),
        };
        let signers = tx.signer_map();
        tx.payload_signatures = reconcile_literal(self.payload_signatures, &signers);
        tx.envelope_signatures = reconcile_literal(self.envelope_signatures, &signers);

        debug!(
            gas_limit,
            arguments = tx.arguments.len(),
            authorizers = tx.authorizers.len(),
            "built transaction"
        );
        Ok(tx)
    }
}

/// Gives every signature from a recognized signer that signer's index, then
/// sorts by `(signer_index, key_index)`.
fn reconcile_literal(
    mut signatures: Vec<TransactionSignature>,
    signers: &HashMap<Address, usize>,
) -> Vec<TransactionSignature> {
    for sig in &mut signatures {
        if let Some(&index) = signers.get(&sig.address) {
            if index != sig.signer_index {
                debug!(
                    address = %sig.address,
                    given = sig.signer_index,
                    index,
                    "literal signature re-indexed to its signer position"
                );
            }
            sig.signer_index = index;
        }
    }
    signatures.sort_by_key(TransactionSignature::order_key);
    signatures
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
