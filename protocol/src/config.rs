//! # Protocol Configuration & Constants
//!
//! Every magic number the transaction format depends on lives here. These
//! values are shared with every independent client on the network, so
//! changing one of them is not a refactor, it's a fork.
//!
//! The only non-constant item is [`TransactionConfig`], the explicit bag of
//! defaults handed to [`crate::transaction::TransactionBuilder`]. There is no
//! process-wide default anywhere in the crate: if a builder needs a default
//! payer, somebody passed it one.

use serde::{Deserialize, Serialize};

use crate::identifier::Address;

// ---------------------------------------------------------------------------
// Identifier Widths
// ---------------------------------------------------------------------------

/// Account addresses are 8 bytes on the wire. Always. Shorter inputs are
/// left-padded with zeros, longer inputs are rejected.
pub const ADDRESS_LENGTH: usize = 8;

/// Transaction and block identifiers are 32-byte hash outputs.
pub const ID_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Domain Separation
// ---------------------------------------------------------------------------

/// Every domain tag is right-padded to exactly this many bytes.
pub const DOMAIN_TAG_LENGTH: usize = 32;

/// Prefix for anything signed as (part of) a transaction.
pub const TRANSACTION_DOMAIN_TAG: &str = "FLOW-V0.0-transaction";

/// Prefix for arbitrary user messages (key-list proofs, login challenges).
pub const USER_DOMAIN_TAG: &str = "FLOW-V0.0-user";

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Bit length of the secp256k1 group order.
pub const SECP256K1_ORDER_BITS: usize = 256;

/// Hash output length in bytes for both SHA2-256 and SHA3-256.
pub const HASH_OUTPUT_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Transaction Defaults
// ---------------------------------------------------------------------------

/// Default gas (compute) limit applied when a builder is not told otherwise.
/// Matches the limit the reference clients fill in.
pub const DEFAULT_GAS_LIMIT: u64 = 9_999;

/// Explicit defaults threaded through transaction construction.
///
/// Build one per network/environment and hand it to every
/// [`TransactionBuilder`](crate::transaction::TransactionBuilder). It derives
/// `Deserialize` so callers can embed it in their own configuration files;
/// reading those files is the caller's business.
///
/// # Example
///
/// ```
/// use flow_transaction::config::TransactionConfig;
/// use flow_transaction::Address;
///
/// let payer = Address::from_hex("f8d6e0586b0a20c7").unwrap();
/// let config = TransactionConfig::default()
///     .with_default_gas_limit(1_000)
///     .with_default_payer(payer);
///
/// assert_eq!(config.default_gas_limit, 1_000);
/// assert_eq!(config.default_payer, Some(payer));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionConfig {
    /// Gas limit used when the builder never sees `.gas_limit(..)`.
    pub default_gas_limit: u64,

    /// Payer used when the builder never sees `.payer(..)`. Typically a
    /// service account that sponsors fees for its users.
    pub default_payer: Option<Address>,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            default_gas_limit: DEFAULT_GAS_LIMIT,
            default_payer: None,
        }
    }
}

impl TransactionConfig {
    /// Overrides the default gas limit.
    pub fn with_default_gas_limit(mut self, gas_limit: u64) -> Self {
        self.default_gas_limit = gas_limit;
        self
    }

    /// Sets the payer used when a builder does not name one.
    pub fn with_default_payer(mut self, payer: Address) -> Self {
        self.default_payer = Some(payer);
        self
    }
}

/// Returns the ECDSA component size (`ceil(order_bits / 8)`) for a curve
/// order of the given bit length. Zero means "unknown curve" and disables
/// signature normalization.
pub const fn component_size(order_bits: usize) -> usize {
    order_bits.div_ceil(8)
}
