//! Signer identity resolution.
//!
//! A transaction's signers are the proposer, the payer and the authorizers,
//! in that order, each address counted once. A signature's `signer_index`
//! points into this list.

use std::collections::HashMap;

use super::types::Transaction;
use crate::identifier::Address;

/// Deduplicated signer list: proposer, then payer, then authorizers in
/// declaration order. The first occurrence of an address wins.
pub fn signer_list(tx: &Transaction) -> Vec<Address> {
    let candidates = std::iter::once(tx.proposal_key.address)
        .chain(std::iter::once(tx.payer))
        .chain(tx.authorizers.iter().copied());

    let mut signers: Vec<Address> = Vec::with_capacity(2 + tx.authorizers.len());
    for address in candidates {
        if !signers.contains(&address) {
            signers.push(address);
        }
    }
    signers
}

/// Maps each signer address to its position in [`signer_list`].
pub fn signer_map(tx: &Transaction) -> HashMap<Address, usize> {
    signer_list(tx)
        .into_iter()
        .enumerate()
        .map(|(index, address)| (address, index))
        .collect()
}

impl Transaction {
    /// See [`signer_list`].
    pub fn signer_list(&self) -> Vec<Address> {
        signer_list(self)
    }

    /// See [`signer_map`].
    pub fn signer_map(&self) -> HashMap<Address, usize> {
        signer_map(self)
    }
}
