//! Canonical (RLP) encoding of transactions, and its inverse.
//!
//! Three nested forms, all RLP lists:
//!
//! ```text
//! payload  = [script, [arg..], reference_block_id, gas_limit,
//!             proposer, proposer_key_index, proposer_sequence_number,
//!             payer, [authorizer..]]
//! envelope = [payload, [sig..]]                 (what the payer signs)
//! full     = [payload, [sig..], [envelope_sig..]] (what gets hashed / sent)
//! sig      = [signer_index, key_index, signature]
//! ```
//!
//! These bytes are signed and hashed by every client on the network, so
//! they have to match byte for byte:
//!
//! - addresses and ids are raw byte strings at full width (leading zeros
//!   are *not* stripped),
//! - integers are minimal big-endian (zero is the empty string),
//! - empty lists are encoded as `0xc0`, never omitted.
//!
//! Primitive framing (headers, integers, byte strings) comes from
//! `alloy-rlp`; the layout of the three forms lives here.

use alloy_rlp::{length_of_length, BufMut, Decodable, Encodable, Header};
use thiserror::Error;
use tracing::trace;

use super::signers::signer_list;
use super::types::{ProposalKey, Transaction, TransactionSignature};
use crate::identifier::{Address, FixedBytes, IdentifierKind, TransactionId};

/// Errors from decoding canonical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodingError {
    /// Bad RLP framing: truncated input, non-canonical prefix, integer
    /// overflow, string where a list was expected, and so on.
    #[error("malformed RLP: {0}")]
    Rlp(#[from] alloy_rlp::Error),

    /// A fixed-width field had the wrong number of bytes.
    #[error("{field} must be {expected} bytes, got {actual}")]
    UnexpectedLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Bytes left over after a complete list.
    #[error("{remaining} trailing bytes after {context}")]
    TrailingBytes {
        context: &'static str,
        remaining: usize,
    },

    /// A signature names a signer index beyond the transaction's signer list.
    #[error("signer index {index} out of range ({signers} signers)")]
    UnknownSignerIndex { index: usize, signers: usize },

    /// A signature list is not ascending by `(signer_index, key_index)`.
    #[error("{list} signatures are not sorted by signer and key index")]
    UnsortedSignatures { list: &'static str },
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encodes the canonical payload.
pub fn encode_payload(tx: &Transaction) -> Vec<u8> {
    to_vec(&PayloadForm(tx))
}

/// Encodes the authorization envelope: payload plus payload signatures.
pub fn encode_authorization_envelope(tx: &Transaction) -> Vec<u8> {
    to_vec(&EnvelopeForm(tx))
}

/// Encodes the full transaction: payload, payload signatures, envelope
/// signatures.
pub fn encode_transaction(tx: &Transaction) -> Vec<u8> {
    to_vec(&TransactionForm(tx))
}

fn to_vec<E: Encodable>(form: &E) -> Vec<u8> {
    let mut out = Vec::with_capacity(form.length());
    form.encode(&mut out);
    out
}

/// Total encoded size of a list whose items take `payload_length` bytes.
fn list_length(payload_length: usize) -> usize {
    payload_length + length_of_length(payload_length)
}

fn list_header(payload_length: usize) -> Header {
    Header {
        list: true,
        payload_length,
    }
}

/// A list of byte strings (arguments, authorizers).
struct BytesList<'a, T>(&'a [T]);

impl<T: AsRef<[u8]>> BytesList<'_, T> {
    fn payload_length(&self) -> usize {
        self.0.iter().map(|item| item.as_ref().length()).sum()
    }
}

impl<T: AsRef<[u8]>> Encodable for BytesList<'_, T> {
    fn encode(&self, out: &mut dyn BufMut) {
        list_header(self.payload_length()).encode(out);
        for item in self.0 {
            item.as_ref().encode(out);
        }
    }

    fn length(&self) -> usize {
        list_length(self.payload_length())
    }
}

/// `[signer_index, key_index, signature]`
struct SignatureForm<'a>(&'a TransactionSignature);

impl SignatureForm<'_> {
    fn payload_length(&self) -> usize {
        let sig = self.0;
        (sig.signer_index as u64).length() + sig.key_index.length() + sig.signature.as_slice().length()
    }
}

impl Encodable for SignatureForm<'_> {
    fn encode(&self, out: &mut dyn BufMut) {
        let sig = self.0;
        list_header(self.payload_length()).encode(out);
        (sig.signer_index as u64).encode(out);
        sig.key_index.encode(out);
        sig.signature.as_slice().encode(out);
    }

    fn length(&self) -> usize {
        list_length(self.payload_length())
    }
}

struct SignatureList<'a>(&'a [TransactionSignature]);

impl SignatureList<'_> {
    fn payload_length(&self) -> usize {
        self.0.iter().map(|sig| SignatureForm(sig).length()).sum()
    }
}

impl Encodable for SignatureList<'_> {
    fn encode(&self, out: &mut dyn BufMut) {
        list_header(self.payload_length()).encode(out);
        for sig in self.0 {
            SignatureForm(sig).encode(out);
        }
    }

    fn length(&self) -> usize {
        list_length(self.payload_length())
    }
}

struct PayloadForm<'a>(&'a Transaction);

impl PayloadForm<'_> {
    fn payload_length(&self) -> usize {
        let tx = self.0;
        tx.script.as_slice().length()
            + BytesList(&tx.arguments).length()
            + tx.reference_block_id.as_ref().length()
            + tx.gas_limit.length()
            + tx.proposal_key.address.as_ref().length()
            + tx.proposal_key.key_index.length()
            + tx.proposal_key.sequence_number.length()
            + tx.payer.as_ref().length()
            + BytesList(&tx.authorizers).length()
    }
}

impl Encodable for PayloadForm<'_> {
    fn encode(&self, out: &mut dyn BufMut) {
        let tx = self.0;
        list_header(self.payload_length()).encode(out);
        tx.script.as_slice().encode(out);
        BytesList(&tx.arguments).encode(out);
        tx.reference_block_id.as_ref().encode(out);
        tx.gas_limit.encode(out);
        tx.proposal_key.address.as_ref().encode(out);
        tx.proposal_key.key_index.encode(out);
        tx.proposal_key.sequence_number.encode(out);
        tx.payer.as_ref().encode(out);
        BytesList(&tx.authorizers).encode(out);
    }

    fn length(&self) -> usize {
        list_length(self.payload_length())
    }
}

struct EnvelopeForm<'a>(&'a Transaction);

impl EnvelopeForm<'_> {
    fn payload_length(&self) -> usize {
        PayloadForm(self.0).length() + SignatureList(&self.0.payload_signatures).length()
    }
}

impl Encodable for EnvelopeForm<'_> {
    fn encode(&self, out: &mut dyn BufMut) {
        list_header(self.payload_length()).encode(out);
        PayloadForm(self.0).encode(out);
        SignatureList(&self.0.payload_signatures).encode(out);
    }

    fn length(&self) -> usize {
        list_length(self.payload_length())
    }
}

struct TransactionForm<'a>(&'a Transaction);

impl TransactionForm<'_> {
    fn payload_length(&self) -> usize {
        PayloadForm(self.0).length()
            + SignatureList(&self.0.payload_signatures).length()
            + SignatureList(&self.0.envelope_signatures).length()
    }
}

impl Encodable for TransactionForm<'_> {
    fn encode(&self, out: &mut dyn BufMut) {
        list_header(self.payload_length()).encode(out);
        PayloadForm(self.0).encode(out);
        SignatureList(&self.0.payload_signatures).encode(out);
        SignatureList(&self.0.envelope_signatures).encode(out);
    }

    fn length(&self) -> usize {
        list_length(self.payload_length())
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decodes a canonical payload into an unsigned [`Transaction`].
pub fn decode_payload(bytes: &[u8]) -> Result<Transaction, DecodingError> {
    let mut buf = bytes;
    let mut body = take_list(&mut buf)?;
    expect_empty(buf, "payload")?;

    let tx = read_payload(&mut body)?;
    expect_empty(body, "payload fields")?;
    Ok(tx)
}

/// Decodes an authorization envelope. Signature addresses are recovered
/// from the signer list.
pub fn decode_authorization_envelope(bytes: &[u8]) -> Result<Transaction, DecodingError> {
    let mut buf = bytes;
    let mut body = take_list(&mut buf)?;
    expect_empty(buf, "authorization envelope")?;

    let mut tx = read_payload(&mut take_list(&mut body)?)?;
    let payload_signatures = read_signatures(&mut body)?;
    expect_empty(body, "authorization envelope fields")?;

    let signers = signer_list(&tx);
    tx.payload_signatures = resolve_addresses(payload_signatures, &signers)?;
    expect_sorted(&tx.payload_signatures, "payload")?;
    Ok(tx)
}

/// Decodes a full transaction produced by [`encode_transaction`].
///
/// Signature addresses are recovered from the signer list by
/// `signer_index`; an index past the end of the list is an error, and so is
/// a signature list out of `(signer_index, key_index)` order.
pub fn decode_transaction(bytes: &[u8]) -> Result<Transaction, DecodingError> {
    let mut buf = bytes;
    let mut body = take_list(&mut buf)?;
    expect_empty(buf, "transaction")?;

    let mut tx = read_payload(&mut take_list(&mut body)?)?;
    let payload_signatures = read_signatures(&mut body)?;
    let envelope_signatures = read_signatures(&mut body)?;
    expect_empty(body, "transaction fields")?;

    let signers = signer_list(&tx);
    tx.payload_signatures = resolve_addresses(payload_signatures, &signers)?;
    tx.envelope_signatures = resolve_addresses(envelope_signatures, &signers)?;
    expect_sorted(&tx.payload_signatures, "payload")?;
    expect_sorted(&tx.envelope_signatures, "envelope")?;

    trace!(
        payload_signatures = tx.payload_signatures.len(),
        envelope_signatures = tx.envelope_signatures.len(),
        "decoded transaction"
    );
    Ok(tx)
}

/// Signature fields as they appear on the wire, before address recovery.
struct RawSignature {
    signer_index: usize,
    key_index: u32,
    signature: Vec<u8>,
}

fn read_payload(body: &mut &[u8]) -> Result<Transaction, DecodingError> {
    let script = take_string(body)?.to_vec();
    let arguments = read_bytes_list(body)?;
    let reference_block_id: TransactionId = take_fixed(body, "reference_block_id")?;
    let gas_limit = u64::decode(body)?;
    let proposer: Address = take_fixed(body, "proposal_key.address")?;
    let key_index = u32::decode(body)?;
    let sequence_number = u64::decode(body)?;
    let payer: Address = take_fixed(body, "payer")?;

    let mut authorizer_items = take_list(body)?;
    let mut authorizers = Vec::new();
    while !authorizer_items.is_empty() {
        authorizers.push(take_fixed(&mut authorizer_items, "authorizer")?);
    }

    Ok(Transaction {
        script,
        arguments,
        reference_block_id,
        gas_limit,
        proposal_key: ProposalKey::new(proposer, key_index, sequence_number),
        payer,
        authorizers,
        payload_signatures: Vec::new(),
        envelope_signatures: Vec::new(),
    })
}

fn read_bytes_list(body: &mut &[u8]) -> Result<Vec<Vec<u8>>, DecodingError> {
    let mut items = take_list(body)?;
    let mut out = Vec::new();
    while !items.is_empty() {
        out.push(take_string(&mut items)?.to_vec());
    }
    Ok(out)
}

fn read_signatures(body: &mut &[u8]) -> Result<Vec<RawSignature>, DecodingError> {
    let mut items = take_list(body)?;
    let mut out = Vec::new();
    while !items.is_empty() {
        let mut fields = take_list(&mut items)?;
        let signer_index = u64::decode(&mut fields)?;
        let key_index = u32::decode(&mut fields)?;
        let signature = take_string(&mut fields)?.to_vec();
        expect_empty(fields, "signature fields")?;

        let signer_index =
            usize::try_from(signer_index).map_err(|_| DecodingError::Rlp(alloy_rlp::Error::Overflow))?;
        out.push(RawSignature {
            signer_index,
            key_index,
            signature,
        });
    }
    Ok(out)
}

fn resolve_addresses(
    raw: Vec<RawSignature>,
    signers: &[Address],
) -> Result<Vec<TransactionSignature>, DecodingError> {
    raw.into_iter()
        .map(|sig| {
            let address = signers.get(sig.signer_index).copied().ok_or(
                DecodingError::UnknownSignerIndex {
                    index: sig.signer_index,
                    signers: signers.len(),
                },
            )?;
            Ok(TransactionSignature::new(
                address,
                sig.signer_index,
                sig.key_index,
                sig.signature,
            ))
        })
        .collect()
}

fn expect_sorted(
    signatures: &[TransactionSignature],
    list: &'static str,
) -> Result<(), DecodingError> {
    if signatures
        .windows(2)
        .all(|pair| pair[0].order_key() <= pair[1].order_key())
    {
        Ok(())
    } else {
        Err(DecodingError::UnsortedSignatures { list })
    }
}

/// Reads one RLP item header and returns the item's payload, advancing
/// `buf` past it.
fn take_item<'a>(buf: &mut &'a [u8], list: bool) -> Result<&'a [u8], DecodingError> {
    let header = Header::decode(buf)?;
    if header.list != list {
        return Err(if list {
            alloy_rlp::Error::UnexpectedString
        } else {
            alloy_rlp::Error::UnexpectedList
        }
        .into());
    }
    if buf.len() < header.payload_length {
        return Err(alloy_rlp::Error::InputTooShort.into());
    }
    let (payload, rest) = buf.split_at(header.payload_length);
    *buf = rest;
    Ok(payload)
}

fn take_list<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8], DecodingError> {
    take_item(buf, true)
}

fn take_string<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8], DecodingError> {
    take_item(buf, false)
}

fn take_fixed<const N: usize, K: IdentifierKind>(
    buf: &mut &[u8],
    field: &'static str,
) -> Result<FixedBytes<N, K>, DecodingError> {
    let bytes = take_string(buf)?;
    let array: [u8; N] = bytes
        .try_into()
        .map_err(|_| DecodingError::UnexpectedLength {
            field,
            expected: N,
            actual: bytes.len(),
        })?;
    Ok(FixedBytes::new(array))
}

fn expect_empty(rest: &[u8], context: &'static str) -> Result<(), DecodingError> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(DecodingError::TrailingBytes {
            context,
            remaining: rest.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::builder::tests::{fixture_tx, hello_world_tx};

    const FIXTURE_PAYLOAD_HEX: &str = "f86a97696d706f7274203078736f6d657468696e67200a207b7dc88302020383030303a000000000000000000000000000000000000000000000000000000303030606062c8800000405040504050b07880000000605040302d2880000000909090909880000000809090909";

    #[test]
    fn payload_matches_fixture() {
        assert_eq!(hex::encode(encode_payload(&fixture_tx())), FIXTURE_PAYLOAD_HEX);
    }

    #[test]
    fn envelope_matches_fixture() {
        let mut tx = fixture_tx();
        tx.payload_signatures = vec![
            TransactionSignature::new(tx.proposal_key.address, 0, 0, vec![0x04; 11]),
            TransactionSignature::new(Address::zero(), 4, 5, vec![0x03; 3]),
        ];
        let expected = format!(
            "f883{FIXTURE_PAYLOAD_HEX}d6ce80808b0404040404040404040404c6040583030303"
        );
        assert_eq!(hex::encode(encode_authorization_envelope(&tx)), expected);
    }

    #[test]
    fn empty_lists_are_encoded_not_omitted() {
        let tx = hello_world_tx();
        let encoded = encode_transaction(&tx);
        // No payload signatures, no envelope signatures: two trailing 0xc0.
        assert!(encoded.ends_with(&[0xc0, 0xc0]));
        // No arguments: the byte after the script is an empty list.
        let payload = encode_payload(&tx);
        let script_end = 2 + 1 + tx.script().len();
        assert_eq!(payload[script_end], 0xc0);
    }

    #[test]
    fn fixed_width_fields_keep_leading_zeros() {
        let payload = encode_payload(&hello_world_tx());
        // Proposer 0x01 is written as 0x88 followed by all eight bytes.
        let proposer = [0x88, 0, 0, 0, 0, 0, 0, 0, 0x01];
        assert!(payload.windows(proposer.len()).any(|w| w == proposer));
    }

    #[test]
    fn zero_integers_encode_as_empty_string() {
        let mut tx = hello_world_tx();
        tx.gas_limit = 0;
        tx.proposal_key.key_index = 0;
        tx.proposal_key.sequence_number = 0;
        let decoded = decode_payload(&encode_payload(&tx)).unwrap();
        assert_eq!(decoded.gas_limit, 0);
        assert_eq!(decoded.proposal_key.sequence_number, 0);
        assert!(encode_payload(&tx).windows(3).any(|w| w == [0x80, 0x88, 0]));
    }

    #[test]
    fn long_scripts_use_length_of_length() {
        let mut tx = hello_world_tx();
        tx.script = vec![b'a'; 300];
        let payload = encode_payload(&tx);
        // Outer list > 55 bytes: 0xf9 + two length bytes; script: 0xb9 0x01 0x2c.
        assert_eq!(payload[0], 0xf9);
        assert_eq!(&payload[3..6], &[0xb9, 0x01, 0x2c]);
        assert_eq!(decode_payload(&payload).unwrap().script, tx.script);
    }

    #[test]
    fn payload_roundtrip() {
        let tx = fixture_tx();
        assert_eq!(decode_payload(&encode_payload(&tx)).unwrap(), tx);
    }

    #[test]
    fn envelope_roundtrip_recovers_addresses() {
        let tx = hello_world_tx()
            .add_payload_signature(hello_world_tx().proposal_key().address, 3, vec![1]);
        let decoded = decode_authorization_envelope(&encode_authorization_envelope(&tx)).unwrap();
        assert_eq!(decoded, tx);
    }

    #[test]
    fn full_roundtrip_with_signatures() {
        let base = hello_world_tx();
        let proposer = base.proposal_key().address;
        let tx = base
            .add_payload_signature(proposer, 3, vec![1])
            .add_payload_signature(proposer, 2, vec![2])
            .add_envelope_signature(base.payer(), 7, vec![3]);
        let decoded = decode_transaction(&encode_transaction(&tx)).unwrap();
        assert_eq!(decoded, tx);
        assert_eq!(decoded.id(), tx.id());
    }

    #[test]
    fn truncated_input_is_rejected() {
        let bytes = encode_transaction(&hello_world_tx());
        for cut in [0, 1, 2, bytes.len() / 2, bytes.len() - 1] {
            assert!(
                decode_transaction(&bytes[..cut]).is_err(),
                "accepted a transaction truncated to {cut} bytes"
            );
        }
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = encode_transaction(&hello_world_tx());
        bytes.push(0x00);
        assert_eq!(
            decode_transaction(&bytes),
            Err(DecodingError::TrailingBytes {
                context: "transaction",
                remaining: 1
            })
        );
    }

    #[test]
    fn wrong_width_address_is_rejected() {
        // Payload list containing a 7-byte payer.
        let mut tx = hello_world_tx();
        tx.payer = Address::zero();
        let mut bytes = encode_payload(&tx);
        let pattern = [0x88, 0, 0, 0, 0, 0, 0, 0, 0];
        let at = bytes
            .windows(pattern.len())
            .position(|w| w == pattern)
            .unwrap();
        bytes[at] = 0x87;
        bytes.remove(at + 1);
        // Outer header is 0xf8 + one length byte.
        bytes[1] -= 1;
        assert!(matches!(
            decode_payload(&bytes),
            Err(DecodingError::UnexpectedLength {
                expected: 8,
                actual: 7,
                ..
            })
        ));
    }

    #[test]
    fn string_where_list_expected_is_rejected() {
        assert_eq!(
            decode_transaction(&[0x83, 1, 2, 3]),
            Err(DecodingError::Rlp(alloy_rlp::Error::UnexpectedString))
        );
    }

    #[test]
    fn out_of_range_signer_index_is_rejected() {
        let mut tx = hello_world_tx();
        tx.payload_signatures = vec![TransactionSignature::new(Address::zero(), 9, 0, vec![1])];
        assert_eq!(
            decode_transaction(&encode_transaction(&tx)),
            Err(DecodingError::UnknownSignerIndex {
                index: 9,
                signers: 2
            })
        );
    }

    #[test]
    fn unsorted_signature_lists_are_rejected() {
        let base = hello_world_tx();
        let proposer = base.proposal_key.address;
        let payer = base.payer;

        let mut tx = base.clone();
        tx.payload_signatures = vec![
            TransactionSignature::new(payer, 1, 0, vec![5]),
            TransactionSignature::new(proposer, 0, 0, vec![6]),
        ];
        assert_eq!(
            decode_transaction(&encode_transaction(&tx)),
            Err(DecodingError::UnsortedSignatures { list: "payload" })
        );
        assert_eq!(
            decode_authorization_envelope(&encode_authorization_envelope(&tx)),
            Err(DecodingError::UnsortedSignatures { list: "payload" })
        );

        let mut tx = base;
        tx.envelope_signatures = vec![
            TransactionSignature::new(payer, 1, 2, vec![5]),
            TransactionSignature::new(payer, 1, 1, vec![6]),
        ];
        assert_eq!(
            decode_transaction(&encode_transaction(&tx)),
            Err(DecodingError::UnsortedSignatures { list: "envelope" })
        );
    }

    #[test]
    fn repeated_signer_and_key_decodes() {
        let tx = hello_world_tx();
        let proposer = tx.proposal_key().address;
        let tx = tx
            .add_payload_signature(proposer, 1, vec![1])
            .add_payload_signature(proposer, 1, vec![2]);
        assert_eq!(decode_transaction(&encode_transaction(&tx)).unwrap(), tx);
    }

    #[test]
    fn positional_index_inside_signer_list_decodes_as_that_signer() {
        // The outsider takes position 0, which is the proposer's slot. The
        // canonical bytes carry only the index, so decoding attributes the
        // signature to the proposer.
        let tx = hello_world_tx();
        let outsider = Address::from_slice(&[0x77]).unwrap();
        let signed = tx.add_payload_signature(outsider, 5, vec![1]);
        assert_eq!(signed.payload_signatures()[0].signer_index, 0);

        let decoded = decode_transaction(&encode_transaction(&signed)).unwrap();
        let sig = &decoded.payload_signatures()[0];
        assert_eq!(sig.address, tx.proposal_key().address);
        assert_eq!((sig.signer_index, sig.key_index), (0, 5));
        assert_ne!(decoded, signed);
        assert_eq!(decoded.id(), signed.id());
    }
}
