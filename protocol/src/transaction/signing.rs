//! Signature assembly.
//!
//! Proposer and authorizers sign the canonical payload; the payer signs the
//! authorization envelope (payload plus every payload signature collected so
//! far). Each add operation returns a new [`Transaction`]; the receiver is
//! never modified.
//!
//! After every insertion a signature list is sorted ascending by
//! `(signer_index, key_index)`, with signer indices resolved against the
//! transaction's signer list. An address outside that list is accepted and
//! takes its position in the sorted signature list as its index.

use std::collections::HashMap;

use tracing::debug;

use super::types::{Transaction, TransactionSignature};
use crate::crypto::keys::{KeyError, Signer};
use crate::identifier::Address;

impl Transaction {
    /// Returns a copy of this transaction with a payload signature attached.
    pub fn add_payload_signature(
        &self,
        address: Address,
        key_index: u32,
        signature: Vec<u8>,
    ) -> Transaction {
        let signers = self.signer_map();
        let payload_signatures = insert_signature(
            &self.payload_signatures,
            &signers,
            address,
            key_index,
            signature,
        );
        Transaction {
            payload_signatures,
            ..self.clone()
        }
    }

    /// Returns a copy of this transaction with an envelope signature attached.
    pub fn add_envelope_signature(
        &self,
        address: Address,
        key_index: u32,
        signature: Vec<u8>,
    ) -> Transaction {
        let signers = self.signer_map();
        let envelope_signatures = insert_signature(
            &self.envelope_signatures,
            &signers,
            address,
            key_index,
            signature,
        );
        Transaction {
            envelope_signatures,
            ..self.clone()
        }
    }

    /// Signs the domain-tagged payload with `signer` and attaches the result.
    pub fn sign_payload<S: Signer + ?Sized>(
        &self,
        address: Address,
        key_index: u32,
        signer: &S,
    ) -> Result<Transaction, KeyError> {
        let signature = signer.sign_as_transaction(&self.payload_message())?;
        Ok(self.add_payload_signature(address, key_index, signature))
    }

    /// Signs the domain-tagged authorization envelope with `signer` and
    /// attaches the result.
    ///
    /// The envelope covers the payload signatures present *now*, so collect
    /// all of them before the payer signs.
    pub fn sign_envelope<S: Signer + ?Sized>(
        &self,
        address: Address,
        key_index: u32,
        signer: &S,
    ) -> Result<Transaction, KeyError> {
        let signature = signer.sign_as_transaction(&self.envelope_message())?;
        Ok(self.add_envelope_signature(address, key_index, signature))
    }
}

/// Inserts a signature into `existing` and returns the re-sorted,
/// re-indexed list.
///
/// Ordering uses the resolved index of the new entry, with "not a signer"
/// sorting before every real index. Once sorted, entries whose address is a
/// known signer keep their index; any other entry takes its list position.
fn insert_signature(
    existing: &[TransactionSignature],
    signers: &HashMap<Address, usize>,
    address: Address,
    key_index: u32,
    signature: Vec<u8>,
) -> Vec<TransactionSignature> {
    let resolved = signers.get(&address).copied();
    if resolved.is_none() {
        debug!(
            address = %address,
            key_index,
            "signature from an address outside the signer list, using positional index"
        );
    }

    let mut entries: Vec<(Option<usize>, TransactionSignature)> = existing
        .iter()
        .map(|sig| (Some(sig.signer_index), sig.clone()))
        .collect();
    entries.push((
        resolved,
        TransactionSignature::new(address, resolved.unwrap_or_default(), key_index, signature),
    ));

    // Stable: equal keys keep insertion order.
    entries.sort_by_key(|(index, sig)| (*index, sig.key_index));

    entries
        .into_iter()
        .enumerate()
        .map(|(position, (index, mut sig))| {
            sig.signer_index = match index {
                Some(index) if signers.contains_key(&sig.address) => index,
                _ => position,
            };
            sig
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::HashAlgorithm;
    use crate::crypto::keys::EcdsaSigner;
    use crate::transaction::builder::tests::{fixture_tx, hello_world_tx};

    fn addr(last: u8) -> Address {
        Address::from_slice(&[last]).unwrap()
    }

    fn keys(list: &[TransactionSignature]) -> Vec<(usize, u32)> {
        list.iter().map(TransactionSignature::order_key).collect()
    }

    #[test]
    fn unsigned_id_matches_fixture() {
        assert_eq!(
            hello_world_tx().id().to_hex(),
            "5b52d002d167be7dba66ab4d6fc6b1a7281ae9d02bd2afa9e9fa9e916556f721"
        );
    }

    #[test]
    fn id_tracks_each_signature() {
        let tx = hello_world_tx();
        let proposer = tx.proposal_key().address;

        let tx = tx
            .add_payload_signature(proposer, 3, vec![1])
            .add_payload_signature(proposer, 2, vec![2]);
        assert_eq!(
            tx.id().to_hex(),
            "d1b24f07c27203d3d101d164ea8449a9f0050b0157c5e80845bba6c8f387e6df"
        );

        let tx = tx.add_envelope_signature(tx.payer(), 7, vec![3]);
        assert_eq!(
            tx.id().to_hex(),
            "f7b7a3c5dea16ee4aa3bdf396f39d5515fac9bf5fc5797b3748d097cd0b6f55a"
        );
        assert_eq!(
            hex::encode(tx.encode()),
            "f882f872b07472616e73616374696f6e207b2065786563757465207b206c6f67282248656c6c6f2c20576f726c64212229207d207dc0a000000000000000000000000000000000000000000000000000000000000001022a880000000000000001040a880000000000000002c9880000000000000001c8c3800202c3800301c4c3010703"
        );
    }

    #[test]
    fn same_address_sorted_by_key_index() {
        let tx = hello_world_tx();
        let proposer = tx.proposal_key().address;
        let tx = tx
            .add_payload_signature(proposer, 3, vec![1])
            .add_payload_signature(proposer, 2, vec![2]);

        assert_eq!(keys(tx.payload_signatures()), vec![(0, 2), (0, 3)]);
        assert_eq!(tx.payload_signatures()[0].signature, vec![2]);
    }

    #[test]
    fn signer_index_follows_signer_list() {
        let tx = fixture_tx();
        let authorizer = tx.authorizers()[1];
        let tx = tx
            .add_payload_signature(authorizer, 0, vec![9])
            .add_payload_signature(tx.proposal_key().address, 1, vec![8]);

        assert_eq!(keys(tx.payload_signatures()), vec![(0, 1), (3, 0)]);
        assert_eq!(tx.payload_signatures()[1].address, authorizer);
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let base = fixture_tx();
        let proposer = base.proposal_key().address;
        let payer = base.payer();

        let a = base
            .add_payload_signature(payer, 1, vec![1])
            .add_payload_signature(proposer, 0, vec![2]);
        let b = base
            .add_payload_signature(proposer, 0, vec![2])
            .add_payload_signature(payer, 1, vec![1]);

        assert_eq!(a.payload_signatures(), b.payload_signatures());
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn unknown_signer_takes_positional_index() {
        let tx = hello_world_tx();
        let proposer = tx.proposal_key().address;
        let outsider = addr(0x77);

        // Outsider sorts first (before every real index) and takes position 0.
        let tx = tx.add_payload_signature(outsider, 5, vec![1]);
        assert_eq!(keys(tx.payload_signatures()), vec![(0, 5)]);

        // A second entry keeps the outsider's stored index for ordering; the
        // proposer resolves to 0 as well, so key index breaks the tie.
        let tx = tx.add_payload_signature(proposer, 1, vec![2]);
        assert_eq!(keys(tx.payload_signatures()), vec![(0, 1), (1, 5)]);
        assert_eq!(tx.payload_signatures()[0].address, proposer);
        assert_eq!(tx.payload_signatures()[1].address, outsider);
    }

    #[test]
    fn unknown_signer_after_known_signers() {
        let tx = fixture_tx();
        let outsider = addr(0x77);
        let tx = tx
            .add_envelope_signature(tx.payer(), 0, vec![1])
            .add_envelope_signature(tx.authorizers()[0], 0, vec![2])
            .add_envelope_signature(outsider, 0, vec![3]);

        assert_eq!(keys(tx.envelope_signatures()), vec![(0, 0), (1, 0), (2, 0)]);
        assert_eq!(tx.envelope_signatures()[0].address, outsider);
        // The payer's real index is 1, and it keeps it.
        assert_eq!(tx.envelope_signatures()[1].address, tx.payer());
    }

    #[test]
    fn adding_a_signature_leaves_the_original_untouched() {
        let tx = hello_world_tx();
        let before = tx.clone();
        let signed = tx.add_payload_signature(tx.proposal_key().address, 0, vec![1]);

        assert_eq!(tx, before);
        assert!(tx.payload_signatures().is_empty());
        assert_eq!(signed.payload_signatures().len(), 1);
        assert_ne!(tx.id(), signed.id());
    }

    #[test]
    fn payload_and_envelope_lists_are_independent() {
        let tx = hello_world_tx();
        let tx = tx.add_envelope_signature(tx.payer(), 0, vec![1]);
        assert!(tx.payload_signatures().is_empty());
        assert_eq!(keys(tx.envelope_signatures()), vec![(1, 0)]);
    }

    #[test]
    fn sign_payload_and_envelope_with_ecdsa() {
        let signer = EcdsaSigner::generate(HashAlgorithm::Sha3_256);
        let public = signer.public_key();
        let tx = hello_world_tx();
        let proposer = tx.proposal_key().address;

        let tx = tx.sign_payload(proposer, 4, &signer).unwrap();
        let sig = &tx.payload_signatures()[0];
        assert_eq!(sig.signature.len(), 64);
        public
            .verify_transaction(&tx.payload_message(), &sig.signature)
            .unwrap();

        let tx = tx.sign_envelope(tx.payer(), 0, &signer).unwrap();
        let sig = &tx.envelope_signatures()[0];
        public
            .verify_transaction(&tx.envelope_message(), &sig.signature)
            .unwrap();
    }

    #[test]
    fn envelope_signature_covers_payload_signatures() {
        let signer = EcdsaSigner::generate(HashAlgorithm::Sha2_256);
        let tx = hello_world_tx();
        let before = tx.envelope_message();
        let tx = tx.add_payload_signature(tx.proposal_key().address, 0, vec![1]);
        assert_ne!(before, tx.envelope_message());

        let signed = tx.sign_envelope(tx.payer(), 0, &signer).unwrap();
        assert!(signer
            .public_key()
            .verify_transaction(&before, &signed.envelope_signatures()[0].signature)
            .is_err());
    }
}
