//! # Signature Normalization
//!
//! ECDSA libraries hand back signatures as ASN.1 DER:
//!
//! ```text
//! 30 <len> 02 <len_r> <r bytes> 02 <len_s> <s bytes>
//! ```
//!
//! The network wants the fixed-width `R ‖ S` form instead, each half exactly
//! `component_size = ceil(order_bits / 8)` bytes. DER integers are signed,
//! so a value with its high bit set carries an extra `0x00` in front, and
//! small values are shorter than the component size. Both get squared away
//! here: the sign byte is stripped, then the value is right-aligned in its
//! half of the output.
//!
//! The reader below is a real (if minimal) DER parser: long-form lengths are
//! supported, every length is bounds-checked, and anything that isn't
//! exactly `SEQUENCE { INTEGER, INTEGER }` is a [`SignatureError::MalformedSignature`].
//! BER leniencies are rejected too: lengths and integers must use their
//! shortest encoding.

use thiserror::Error;

/// Errors from signature parsing and verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("malformed signature: {reason}")]
    MalformedSignature { reason: String },

    #[error("invalid signature length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("signature verification failed")]
    VerificationFailed,
}

impl SignatureError {
    fn malformed(reason: impl Into<String>) -> Self {
        SignatureError::MalformedSignature {
            reason: reason.into(),
        }
    }
}

const TAG_SEQUENCE: u8 = 0x30;
const TAG_INTEGER: u8 = 0x02;

/// Converts a DER-encoded ECDSA signature into fixed-width `R ‖ S`.
///
/// `component_size` is `ceil(order_bits / 8)` for the signing curve (32 for
/// secp256k1 and P-256). A `component_size` of zero means the curve is
/// unknown; the DER bytes are then returned untouched.
///
/// # Errors
///
/// [`SignatureError::MalformedSignature`] when the input is not a
/// well-formed `SEQUENCE { INTEGER r, INTEGER s }`, when a length or an
/// integer is not minimally encoded, when an integer is negative or empty,
/// or when `r`/`s` does not fit in `component_size` bytes.
///
/// # Example
///
/// ```
/// use flow_transaction::crypto::normalize_signature;
///
/// // r = 0x80 (needs a sign byte in DER), s = 0x01
/// let der = [0x30, 0x07, 0x02, 0x02, 0x00, 0x80, 0x02, 0x01, 0x01];
/// let rs = normalize_signature(&der, 32).unwrap();
///
/// assert_eq!(rs.len(), 64);
/// assert_eq!(rs[31], 0x80);
/// assert_eq!(rs[63], 0x01);
/// ```
pub fn normalize_signature(der: &[u8], component_size: usize) -> Result<Vec<u8>, SignatureError> {
    if component_size == 0 {
        return Ok(der.to_vec());
    }

    let (r, s) = parse_der_signature(der)?;

    let mut output = vec![0u8; 2 * component_size];
    write_component(r, "r", &mut output[..component_size])?;
    write_component(s, "s", &mut output[component_size..])?;
    Ok(output)
}

/// Splits a DER signature into the content bytes of `r` and `s`, exactly
/// as they appear in the encoding (sign byte included).
pub fn parse_der_signature(der: &[u8]) -> Result<(&[u8], &[u8]), SignatureError> {
    let mut outer = DerReader::new(der);
    let sequence = outer.read_element(TAG_SEQUENCE, "signature sequence")?;
    if !outer.is_empty() {
        return Err(SignatureError::malformed(format!(
            "{} trailing bytes after signature sequence",
            outer.remaining()
        )));
    }

    let mut inner = DerReader::new(sequence);
    let r = inner.read_element(TAG_INTEGER, "r")?;
    let s = inner.read_element(TAG_INTEGER, "s")?;
    if !inner.is_empty() {
        return Err(SignatureError::malformed(format!(
            "{} unexpected bytes after s",
            inner.remaining()
        )));
    }

    Ok((r, s))
}

/// Right-aligns an unsigned big-endian DER integer into `out`.
fn write_component(value: &[u8], name: &str, out: &mut [u8]) -> Result<(), SignatureError> {
    if value.is_empty() {
        return Err(SignatureError::malformed(format!("{name} is empty")));
    }
    if value[0] & 0x80 != 0 {
        return Err(SignatureError::malformed(format!("{name} is negative")));
    }
    // A zero byte is only allowed in front of a byte with its high bit set.
    if value.len() > 1 && value[0] == 0 && value[1] & 0x80 == 0 {
        return Err(SignatureError::malformed(format!(
            "{name} has a redundant leading zero"
        )));
    }

    let first_nonzero = value.iter().position(|b| *b != 0).unwrap_or(value.len());
    let magnitude = &value[first_nonzero..];
    if magnitude.len() > out.len() {
        return Err(SignatureError::malformed(format!(
            "{name} is {} bytes, component size is {}",
            magnitude.len(),
            out.len()
        )));
    }

    let offset = out.len() - magnitude.len();
    out[offset..].copy_from_slice(magnitude);
    Ok(())
}

/// Cursor over a DER byte string. Reads tag-length-value triples and
/// never indexes past the end of its input.
struct DerReader<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> DerReader<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.input.len() - self.pos
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn read_byte(&mut self, what: &str) -> Result<u8, SignatureError> {
        let byte = *self
            .input
            .get(self.pos)
            .ok_or_else(|| SignatureError::malformed(format!("truncated before {what}")))?;
        self.pos += 1;
        Ok(byte)
    }

    /// Short form (`0x00..=0x7F`) or long form (`0x8N` followed by `N`
    /// big-endian length bytes). Indefinite lengths are not DER, and neither
    /// is a long form that could have been shorter.
    fn read_length(&mut self, what: &str) -> Result<usize, SignatureError> {
        let first = self.read_byte(what)?;
        if first & 0x80 == 0 {
            return Ok(first as usize);
        }

        let count = (first & 0x7F) as usize;
        if count == 0 {
            return Err(SignatureError::malformed(format!(
                "indefinite length for {what}"
            )));
        }
        if count > std::mem::size_of::<usize>() {
            return Err(SignatureError::malformed(format!(
                "length of {what} uses {count} bytes"
            )));
        }

        let mut length = 0usize;
        for i in 0..count {
            let byte = self.read_byte(what)?;
            if i == 0 && byte == 0 {
                return Err(SignatureError::malformed(format!(
                    "length of {what} has a leading zero byte"
                )));
            }
            length = (length << 8) | byte as usize;
        }
        if length < 0x80 {
            return Err(SignatureError::malformed(format!(
                "long-form length {length} for {what} fits in short form"
            )));
        }
        Ok(length)
    }

    fn read_element(&mut self, tag: u8, what: &str) -> Result<&'a [u8], SignatureError> {
        let actual = self.read_byte(what)?;
        if actual != tag {
            return Err(SignatureError::malformed(format!(
                "expected tag 0x{tag:02x} for {what}, found 0x{actual:02x}"
            )));
        }

        let length = self.read_length(what)?;
        if length > self.remaining() {
            return Err(SignatureError::malformed(format!(
                "{what} claims {length} bytes but only {} remain",
                self.remaining()
            )));
        }

        let content = &self.input[self.pos..self.pos + length];
        self.pos += length;
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal DER encoder for building test vectors.
    fn der_integer(magnitude: &[u8]) -> Vec<u8> {
        let trimmed: Vec<u8> = magnitude.iter().copied().skip_while(|b| *b == 0).collect();
        let mut content = if trimmed.is_empty() { vec![0] } else { trimmed };
        if content[0] & 0x80 != 0 {
            content.insert(0, 0);
        }
        let mut out = vec![TAG_INTEGER];
        out.extend(der_length(content.len()));
        out.extend(content);
        out
    }

    fn der_length(len: usize) -> Vec<u8> {
        if len < 0x80 {
            vec![len as u8]
        } else if len <= 0xFF {
            vec![0x81, len as u8]
        } else {
            vec![0x82, (len >> 8) as u8, len as u8]
        }
    }

    fn der_signature(r: &[u8], s: &[u8]) -> Vec<u8> {
        let mut body = der_integer(r);
        body.extend(der_integer(s));
        let mut out = vec![TAG_SEQUENCE];
        out.extend(der_length(body.len()));
        out.extend(body);
        out
    }

    fn component(fill: u8, high_bit: bool) -> [u8; 32] {
        let mut c = [fill; 32];
        if high_bit {
            c[0] |= 0x80;
        } else {
            c[0] &= 0x7F;
        }
        c
    }

    #[test]
    fn normalizes_without_sign_padding() {
        let r = component(0x11, false);
        let s = component(0x22, false);
        let rs = normalize_signature(&der_signature(&r, &s), 32).unwrap();
        assert_eq!(rs.len(), 64);
        assert_eq!(&rs[..32], &r);
        assert_eq!(&rs[32..], &s);
    }

    #[test]
    fn strips_sign_padding_on_either_half() {
        for (r_high, s_high) in [(true, false), (false, true), (true, true)] {
            let r = component(0x5A, r_high);
            let s = component(0xA5, s_high);
            let der = der_signature(&r, &s);
            let rs = normalize_signature(&der, 32).unwrap();
            assert_eq!(&rs[..32], &r, "r mismatch for ({r_high}, {s_high})");
            assert_eq!(&rs[32..], &s, "s mismatch for ({r_high}, {s_high})");
        }
    }

    #[test]
    fn left_pads_short_components() {
        let r = [0x01, 0x02, 0x03];
        let s = [0x7F];
        let rs = normalize_signature(&der_signature(&r, &s), 32).unwrap();
        assert_eq!(&rs[29..32], &r);
        assert!(rs[..29].iter().all(|b| *b == 0));
        assert_eq!(rs[63], 0x7F);
        assert!(rs[32..63].iter().all(|b| *b == 0));
    }

    #[test]
    fn long_form_sequence_length_is_supported() {
        // 66-byte components push the sequence length past 127, forcing 0x81.
        let mut r = [0x33u8; 66];
        r[0] = 0x01;
        let mut s = [0x44u8; 66];
        s[0] = 0x81;
        let der = der_signature(&r, &s);
        assert_eq!(der[1], 0x81);

        let rs = normalize_signature(&der, 66).unwrap();
        assert_eq!(rs.len(), 132);
        assert_eq!(&rs[..66], &r);
        assert_eq!(&rs[66..], &s);
    }

    #[test]
    fn zero_component_size_passes_der_through() {
        let der = der_signature(&[1], &[2]);
        assert_eq!(normalize_signature(&der, 0).unwrap(), der);
    }

    #[test]
    fn rejects_truncated_input() {
        let der = der_signature(&component(0x10, true), &component(0x20, false));
        for cut in [0, 1, 2, 5, der.len() / 2, der.len() - 1] {
            let err = normalize_signature(&der[..cut], 32).unwrap_err();
            assert!(
                matches!(err, SignatureError::MalformedSignature { .. }),
                "cut at {cut} gave {err:?}"
            );
        }
    }

    #[test]
    fn rejects_wrong_tags_and_trailing_bytes() {
        let mut der = der_signature(&[1], &[2]);
        der[0] = 0x31;
        assert!(normalize_signature(&der, 32).is_err());

        let mut der = der_signature(&[1], &[2]);
        der[2] = 0x04;
        assert!(normalize_signature(&der, 32).is_err());

        let mut der = der_signature(&[1], &[2]);
        der.push(0x00);
        assert!(normalize_signature(&der, 32).is_err());
    }

    #[test]
    fn rejects_lengths_past_the_buffer() {
        // Sequence claims 0x45 bytes, only 6 follow.
        let der = [0x30, 0x45, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01];
        assert!(normalize_signature(&der, 32).is_err());

        // Integer r claims 0x20 bytes inside a 6-byte sequence.
        let der = [0x30, 0x06, 0x02, 0x20, 0x01, 0x02, 0x01, 0x01];
        assert!(normalize_signature(&der, 32).is_err());
    }

    #[test]
    fn rejects_oversized_and_negative_components() {
        let der = der_signature(&[0x01; 33], &[0x01]);
        assert!(normalize_signature(&der, 32).is_err());

        // r = 0x80 without its sign byte reads as a negative integer.
        let der = [0x30, 0x06, 0x02, 0x01, 0x80, 0x02, 0x01, 0x01];
        assert!(normalize_signature(&der, 32).is_err());

        let der = [0x30, 0x05, 0x02, 0x00, 0x02, 0x01, 0x01];
        assert!(normalize_signature(&der, 32).is_err());
    }

    #[test]
    fn rejects_indefinite_length() {
        let der = [0x30, 0x80, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01, 0x00, 0x00];
        assert!(normalize_signature(&der, 32).is_err());
    }

    #[test]
    fn rejects_non_minimal_lengths() {
        // Sequence length 6 written as 0x81 0x06.
        let der = [0x30, 0x81, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01];
        assert!(matches!(
            normalize_signature(&der, 32),
            Err(SignatureError::MalformedSignature { .. })
        ));

        // Integer r length 1 written as 0x81 0x01.
        let der = [0x30, 0x07, 0x02, 0x81, 0x01, 0x01, 0x02, 0x01, 0x01];
        assert!(normalize_signature(&der, 32).is_err());

        // Long form with a zero leading length byte.
        let mut body = der_integer(&component(0x11, true));
        body.extend(der_integer(&component(0x22, true)));
        let mut der = vec![TAG_SEQUENCE, 0x82, 0x00, body.len() as u8];
        der.extend(body);
        assert!(normalize_signature(&der, 32).is_err());
    }

    #[test]
    fn rejects_redundant_leading_zeros() {
        // r = 0x00 0x05: the zero byte is not needed for the sign.
        let der = [0x30, 0x07, 0x02, 0x02, 0x00, 0x05, 0x02, 0x01, 0x01];
        assert!(matches!(
            normalize_signature(&der, 32),
            Err(SignatureError::MalformedSignature { .. })
        ));

        // s = 0x00 0x00 0x80: one sign byte is enough.
        let der = [0x30, 0x08, 0x02, 0x01, 0x01, 0x02, 0x03, 0x00, 0x00, 0x80];
        assert!(normalize_signature(&der, 32).is_err());

        // A lone zero is the minimal encoding of zero.
        let der = [0x30, 0x06, 0x02, 0x01, 0x00, 0x02, 0x01, 0x01];
        let rs = normalize_signature(&der, 32).unwrap();
        assert!(rs[..32].iter().all(|b| *b == 0));
    }

    #[test]
    fn parse_returns_raw_integer_contents() {
        let der = der_signature(&component(0x01, true), &[0x05]);
        let (r, s) = parse_der_signature(&der).unwrap();
        assert_eq!(r.len(), 33);
        assert_eq!(r[0], 0x00);
        assert_eq!(s, &[0x05]);
    }
}
