//! Certificate-table editor: add/get/remove `WIN_CERTIFICATE` entries
//! inside `sig_bytes`, a buffer kept separate from the image's own bytes
//! so cert-table edits never alias the bytes they'll eventually be
//! appended to.

use crate::byteio::{align8, read_u16_le, read_u32_le};
use crate::error::{Error, Result};

/// `WIN_CERT_REVISION_2_0`.
pub const REVISION_2_0: u16 = 0x0200;
/// `WIN_CERT_TYPE_PKCS_SIGNED_DATA`.
pub const TYPE_PKCS_SIGNED_DATA: u16 = 0x0002;

const HEADER_SIZE: usize = 8;

/// Appends a new WIN_CERTIFICATE entry wrapping `payload` (a PKCS#7 DER
/// blob) onto `sig_bytes`. Always succeeds, even if `sig_bytes` already
/// holds one or more entries — re-signing an already-signed image appends
/// rather than replaces.
pub fn add(sig_bytes: &mut Vec<u8>, payload: &[u8]) {
    let total_size = HEADER_SIZE + payload.len();
    let aligned_size = align8(total_size);

    let mut entry = Vec::with_capacity(aligned_size);
    entry.extend_from_slice(&(total_size as u32).to_le_bytes());
    entry.extend_from_slice(&REVISION_2_0.to_le_bytes());
    entry.extend_from_slice(&TYPE_PKCS_SIGNED_DATA.to_le_bytes());
    entry.extend_from_slice(payload);
    entry.resize(aligned_size, 0);

    sig_bytes.extend_from_slice(&entry);
}

/// Returns `(revision, certificate_type, payload_range)` for the entry at
/// byte `start` in `sig_bytes`.
fn read_header(sig_bytes: &[u8], start: usize) -> Result<(u16, u16, usize, usize)> {
    let size = read_u32_le(sig_bytes, start)
        .ok_or_else(|| Error::MalformedHeader("truncated WIN_CERTIFICATE header".into()))?
        as usize;
    let revision = read_u16_le(sig_bytes, start + 4)
        .ok_or_else(|| Error::MalformedHeader("truncated WIN_CERTIFICATE header".into()))?;
    let certificate_type = read_u16_le(sig_bytes, start + 6)
        .ok_or_else(|| Error::MalformedHeader("truncated WIN_CERTIFICATE header".into()))?;
    let payload_start = start + HEADER_SIZE;
    let payload_end = start
        + size
            .checked_sub(HEADER_SIZE)
            .map(|payload_len| HEADER_SIZE + payload_len)
            .ok_or_else(|| {
                Error::MalformedHeader("WIN_CERTIFICATE size smaller than header".into())
            })?;
    Ok((revision, certificate_type, payload_start, payload_end))
}

/// Walks `sig_bytes` entry-by-entry (each `align8(header.size)` bytes
/// apart) and returns the byte offset of entry `index`, or `None` if
/// there are fewer than `index + 1` entries.
fn entry_offset(sig_bytes: &[u8], index: usize) -> Option<usize> {
    let mut offset = 0;
    for _ in 0..index {
        if offset >= sig_bytes.len() {
            return None;
        }
        let size = read_u32_le(sig_bytes, offset)? as usize;
        offset += align8(size);
    }
    if offset >= sig_bytes.len() {
        None
    } else {
        Some(offset)
    }
}

/// Returns the payload (excluding the 8-byte header) of entry `index`.
pub fn get(sig_bytes: &[u8], index: usize) -> Result<&[u8]> {
    let count = count(sig_bytes);
    let Some(start) = entry_offset(sig_bytes, index) else {
        return Err(Error::SignatureOutOfRange { index, count });
    };
    let (_, _, payload_start, payload_end) = read_header(sig_bytes, start)?;
    sig_bytes
        .get(payload_start..payload_end)
        .ok_or_else(|| Error::MalformedHeader("WIN_CERTIFICATE payload out of bounds".into()))
}

/// Returns `(revision, certificate_type)` for entry `index`, without
/// copying its payload. Used by `inspect`.
pub fn header_fields(sig_bytes: &[u8], index: usize) -> Result<(u16, u16)> {
    let count = count(sig_bytes);
    let Some(start) = entry_offset(sig_bytes, index) else {
        return Err(Error::SignatureOutOfRange { index, count });
    };
    let (revision, certificate_type, _, _) = read_header(sig_bytes, start)?;
    Ok((revision, certificate_type))
}

/// Removes entry `index` from `sig_bytes`, shifting any later entries
/// left to close the gap.
pub fn remove(sig_bytes: &mut Vec<u8>, index: usize) -> Result<()> {
    let count = count(sig_bytes);
    let Some(start) = entry_offset(sig_bytes, index) else {
        return Err(Error::SignatureOutOfRange { index, count });
    };
    let size = read_u32_le(sig_bytes, start)
        .ok_or_else(|| Error::MalformedHeader("truncated WIN_CERTIFICATE header".into()))?
        as usize;
    let aligned_size = align8(size);
    let end = start + aligned_size;

    if end >= sig_bytes.len() {
        if start == 0 {
            sig_bytes.clear();
        } else {
            sig_bytes.truncate(start);
        }
    } else {
        sig_bytes.drain(start..end);
    }
    Ok(())
}

/// Counts the number of entries currently in `sig_bytes`.
pub fn count(sig_bytes: &[u8]) -> usize {
    let mut offset = 0;
    let mut n = 0;
    while offset < sig_bytes.len() {
        let Some(size) = read_u32_le(sig_bytes, offset) else {
            break;
        };
        offset += align8(size as usize);
        n += 1;
    }
    n
}
