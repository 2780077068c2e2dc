//! Minimal hand-rolled DER (Distinguished Encoding Rules) primitives.
//!
//! Only what [`crate::idc`] needs: definite-length, minimal-length-prefix
//! encoding of SEQUENCE, OBJECT IDENTIFIER, OCTET STRING, BIT STRING, and
//! explicitly-tagged context values. No ASN.1 crate appears anywhere in
//! this workspace's dependency tree, and every structure here has a
//! small, fully fixed shape, so hand-rolling stays canonical DER
//! (definite-length, minimal length prefixes) without pulling one in.

/// Encodes a DER length octet sequence for a value of `len` bytes.
fn encode_length(len: usize, out: &mut Vec<u8>) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let mut be = len.to_be_bytes().to_vec();
    while be.first() == Some(&0) {
        be.remove(0);
    }
    out.push(0x80 | be.len() as u8);
    out.extend_from_slice(&be);
}

/// Wraps `content` in a tag/length/value triplet.
fn tlv(tag: u8, content: &[u8], out: &mut Vec<u8>) {
    out.push(tag);
    encode_length(content.len(), out);
    out.extend_from_slice(content);
}

pub const TAG_SEQUENCE: u8 = 0x30;
pub const TAG_OCTET_STRING: u8 = 0x04;
pub const TAG_BIT_STRING: u8 = 0x03;
pub const TAG_OBJECT_IDENTIFIER: u8 = 0x06;
pub const TAG_NULL: u8 = 0x05;

/// `SEQUENCE { ...contents }`, where `contents` is the already-encoded
/// concatenation of the sequence's members.
pub fn sequence(contents: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(contents.len() + 4);
    tlv(TAG_SEQUENCE, contents, &mut out);
    out
}

/// `OCTET STRING`.
pub fn octet_string(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 4);
    tlv(TAG_OCTET_STRING, bytes, &mut out);
    out
}

/// `NULL`.
pub fn null() -> Vec<u8> {
    vec![TAG_NULL, 0x00]
}

/// `BIT STRING` with `unused_bits` trailing padding bits in the final
/// content byte (commonly `0` for byte-aligned data; we only ever need
/// the zero-length "empty flags" bit string `SpcPeImageData.flags` needs).
pub fn bit_string(unused_bits: u8, bytes: &[u8]) -> Vec<u8> {
    let mut content = Vec::with_capacity(bytes.len() + 1);
    content.push(unused_bits);
    content.extend_from_slice(bytes);
    let mut out = Vec::with_capacity(content.len() + 4);
    tlv(TAG_BIT_STRING, &content, &mut out);
    out
}

/// Encodes a dotted-decimal `OBJECT IDENTIFIER` such as
/// `"1.3.6.1.4.1.311.2.1.15"`.
///
/// Panics if `oid` has fewer than two arcs — every OID this crate encodes
/// is a fixed, compile-time-known constant, so that can't happen in
/// practice.
pub fn object_identifier(oid: &str) -> Vec<u8> {
    let arcs: Vec<u64> = oid
        .split('.')
        .map(|s| s.parse::<u64>().expect("OID arc must be a valid integer"))
        .collect();
    assert!(arcs.len() >= 2, "OID must have at least two arcs");

    let mut content = Vec::new();
    let first = arcs[0] * 40 + arcs[1];
    encode_base128(first, &mut content);
    for &arc in &arcs[2..] {
        encode_base128(arc, &mut content);
    }

    let mut out = Vec::with_capacity(content.len() + 4);
    tlv(TAG_OBJECT_IDENTIFIER, &content, &mut out);
    out
}

fn encode_base128(mut value: u64, out: &mut Vec<u8>) {
    let mut groups = vec![(value & 0x7f) as u8];
    value >>= 7;
    while value > 0 {
        groups.push(((value & 0x7f) as u8) | 0x80);
        value >>= 7;
    }
    groups.reverse();
    out.extend_from_slice(&groups);
}

/// `[tag_number] EXPLICIT content` using a constructed context-specific
/// tag, i.e. `content` is the full DER encoding of the wrapped value.
pub fn context_explicit(tag_number: u8, content: &[u8]) -> Vec<u8> {
    let tag = 0xa0 | (tag_number & 0x1f);
    let mut out = Vec::with_capacity(content.len() + 4);
    tlv(tag, content, &mut out);
    out
}
