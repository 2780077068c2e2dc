//! The `Image` type ties together the header parser, region builder,
//! checksum engine, hasher and certificate-table editor into the
//! operations a caller actually drives: load, hash, sign, inspect, write.

use crate::authenticode;
use crate::byteio::{align8, read_u16_le, read_u32_le, write_u32_le};
use crate::certtable;
use crate::checksum;
use crate::diagnostics::{Diagnostics, NullDiagnostics};
use crate::error::Result;
use crate::header::ParsedHeader;
use crate::regions::{build_regions, Region};
use tracing::debug;

/// An in-memory PE/COFF image, mid-way through being signed.
///
/// `bytes` holds the on-disk image contents exclusive of any appended
/// signatures; `sig_bytes` holds zero or more concatenated, 8-byte-aligned
/// `WIN_CERTIFICATE` entries. The two buffers are deliberately kept apart
/// so certificate-table edits never risk aliasing the image bytes they'll
/// eventually be appended to.
#[derive(Debug)]
pub struct Image {
    bytes: Vec<u8>,
    sig_bytes: Vec<u8>,
    header: ParsedHeader,
    regions: Vec<Region>,
    data_size: usize,
}

impl Image {
    /// Parses `raw` and builds the checksum region list, discarding any
    /// warnings. Use [`Image::load_with_diagnostics`] to observe them.
    pub fn load(raw: Vec<u8>) -> Result<Self> {
        Self::load_with_diagnostics(raw, &mut NullDiagnostics)
    }

    /// Parses `raw`, reporting recoverable conditions (gaps, sections past
    /// EOF, trailing data) to `diag`.
    ///
    /// If declared section extents run past the end of `raw`, the buffer
    /// is zero-padded and parsing restarts — this loop always terminates
    /// because after padding, `data_size <= len(bytes)`.
    pub fn load_with_diagnostics(mut raw: Vec<u8>, diag: &mut dyn Diagnostics) -> Result<Self> {
        loop {
            let header = ParsedHeader::parse(&raw)?;
            let (existing_addr, existing_size) = read_cert_dir_entry(&raw, &header);
            let (regions, data_size) =
                build_regions(&raw, &header, existing_size as usize, diag);

            if data_size > raw.len() {
                debug!(
                    from = raw.len(),
                    to = data_size,
                    "padding image and reparsing"
                );
                raw.resize(data_size, 0);
                continue;
            }

            let sig_bytes =
                extract_existing_signature(&raw, existing_addr as usize, existing_size as usize);
            let bytes = raw[..data_size].to_vec();

            return Ok(Image {
                bytes,
                sig_bytes,
                header,
                regions,
                data_size,
            });
        }
    }

    /// The checksum regions computed for this image, in hash order.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// The 8-byte-aligned logical end of hashable image content.
    pub fn data_size(&self) -> usize {
        self.data_size
    }

    /// PE32 vs PE32+.
    pub fn variant(&self) -> crate::header::PeVariant {
        self.header.variant
    }

    /// Human-readable machine type (`"x86_64"`, `"aarch64"`, ...).
    pub fn machine_name(&self) -> &'static str {
        self.header.machine_name()
    }

    /// SHA-256 over the checksum regions, in order.
    pub fn hash_sha256(&self) -> [u8; 32] {
        authenticode::hash_sha256(&self.bytes, &self.regions)
    }

    /// Appends a new WIN_CERTIFICATE entry wrapping `pkcs7_der`. Always
    /// succeeds; signing an already-signed image adds another entry
    /// rather than replacing the existing one.
    pub fn add_signature(&mut self, pkcs7_der: &[u8]) {
        certtable::add(&mut self.sig_bytes, pkcs7_der);
    }

    /// The payload (without its WIN_CERTIFICATE header) of signature
    /// `index`.
    pub fn get_signature(&self, index: usize) -> Result<&[u8]> {
        certtable::get(&self.sig_bytes, index)
    }

    /// Removes signature `index`, shifting any later entries left.
    pub fn remove_signature(&mut self, index: usize) -> Result<()> {
        certtable::remove(&mut self.sig_bytes, index)
    }

    /// The number of signature entries currently present.
    pub fn signature_count(&self) -> usize {
        certtable::count(&self.sig_bytes)
    }

    /// Builds the attached output: `bytes[..data_size]` (with the security
    /// data directory and PE checksum refreshed) followed by `sig_bytes`,
    /// if any.
    pub fn write_attached(&mut self) -> Vec<u8> {
        self.refresh_directory_and_checksum();

        let mut out = Vec::with_capacity(self.bytes.len() + self.sig_bytes.len());
        out.extend_from_slice(&self.bytes);
        out.extend_from_slice(&self.sig_bytes);
        out
    }

    /// The raw PKCS#7 DER bytes of signature `index`, suitable for writing
    /// out as a standalone detached signature file.
    pub fn write_detached(&self, index: usize) -> Result<Vec<u8>> {
        Ok(self.get_signature(index)?.to_vec())
    }

    fn refresh_directory_and_checksum(&mut self) {
        let (addr, size) = if self.sig_bytes.is_empty() {
            (0u32, 0u32)
        } else {
            (self.data_size as u32, self.sig_bytes.len() as u32)
        };
        write_u32_le(&mut self.bytes, self.header.cert_dir_entry_offset, addr);
        write_u32_le(&mut self.bytes, self.header.cert_dir_entry_offset + 4, size);

        let checksum = checksum::compute(
            &self.bytes,
            self.header.checksum_offset,
            self.data_size,
            &self.sig_bytes,
        );
        write_u32_le(&mut self.bytes, self.header.checksum_offset, checksum);
    }
}

fn read_cert_dir_entry(raw: &[u8], header: &ParsedHeader) -> (u32, u32) {
    let addr = read_u32_le(raw, header.cert_dir_entry_offset).unwrap_or(0);
    let size = read_u32_le(raw, header.cert_dir_entry_offset + 4).unwrap_or(0);
    (addr, size)
}

/// Recovers a prior signature table, if the data directory's declared
/// entry looks like a genuine WIN_CERTIFICATE sequence: its revision and
/// type fields must match, and its declared size must fit inside the file.
fn extract_existing_signature(raw: &[u8], addr: usize, size: usize) -> Vec<u8> {
    if size == 0 {
        return Vec::new();
    }
    if addr.checked_add(size).map(|end| end > raw.len()).unwrap_or(true) {
        return Vec::new();
    }
    if addr + 8 > raw.len() {
        return Vec::new();
    }
    let revision = read_u16_le(raw, addr + 4);
    let certificate_type = read_u16_le(raw, addr + 6);
    if revision != Some(certtable::REVISION_2_0) || certificate_type != Some(certtable::TYPE_PKCS_SIGNED_DATA)
    {
        return Vec::new();
    }
    if size >= raw.len() {
        return Vec::new();
    }
    raw[addr..addr + size].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{build_image, minimal_pe32_plus, set_cert_dir_entry, SectionSpec};
    use crate::header::PeVariant;

    #[test]
    fn loading_minimal_pe32_plus_image() {
        let bytes = minimal_pe32_plus();
        let image = Image::load(bytes.clone()).unwrap();
        assert_eq!(image.regions().len(), 4);
        assert_eq!(image.data_size(), 0x400);

        let mut hasher_input = Vec::new();
        for r in image.regions() {
            hasher_input.extend_from_slice(&bytes[r.offset..r.offset + r.len]);
        }
        use sha2::{Digest, Sha256};
        let expected: [u8; 32] = Sha256::digest(&hasher_input).into();
        assert_eq!(image.hash_sha256(), expected);
    }

    #[test]
    fn unsigned_to_signed_round_trip() {
        let bytes = minimal_pe32_plus();
        let mut image = Image::load(bytes).unwrap();
        assert_eq!(image.signature_count(), 0);

        image.add_signature(&[0xaa; 10]);
        let attached = image.write_attached();

        let mut reloaded = Image::load(attached).unwrap();
        assert_eq!(reloaded.signature_count(), 1);
        assert_eq!(reloaded.get_signature(0).unwrap(), &[0xaa; 10]);
        assert_eq!(reloaded.data_size(), 0x400);

        // security directory = (data_size, align8(8 + 10) = 24)
        let attached_again = reloaded.write_attached();
        let (addr, size) = (
            read_u32_le(&attached_again, reloaded.header.cert_dir_entry_offset).unwrap(),
            read_u32_le(&attached_again, reloaded.header.cert_dir_entry_offset + 4).unwrap(),
        );
        assert_eq!(addr, 0x400);
        assert_eq!(size, 24);
    }

    #[test]
    fn two_signatures_then_remove_first() {
        let bytes = minimal_pe32_plus();
        let mut image = Image::load(bytes).unwrap();
        image.add_signature(&[0xaa; 16]);
        image.add_signature(&[0xbb; 32]);
        assert_eq!(image.signature_count(), 2);

        image.remove_signature(0).unwrap();
        assert_eq!(image.signature_count(), 1);
        assert_eq!(image.get_signature(0).unwrap(), &[0xbb; 32]);
        assert_eq!(image.sig_bytes.len(), align8(8 + 32));
    }

    #[test]
    fn section_past_eof_pads_and_reparses() {
        let bytes = build_image(
            PeVariant::Pe32Plus,
            0x500,
            &[SectionSpec {
                name: ".text",
                pointer_to_raw_data: 0x200,
                size_of_raw_data: 0x400,
            }],
        );
        let mut diag = crate::diagnostics::CollectingDiagnostics::default();
        let image = Image::load_with_diagnostics(bytes, &mut diag).unwrap();

        assert_eq!(image.data_size(), 0x600);
        assert!(diag.warnings.iter().any(|w| matches!(
            w,
            crate::diagnostics::Warning::SectionBeyondEof { .. }
        )));

        let mut image = image;
        let attached = image.write_attached();
        assert_eq!(attached.len(), 0x600);
    }

    #[test]
    fn add_then_remove_signature_round_trips_to_original_output() {
        let bytes = minimal_pe32_plus();

        // Baseline: load and write back with no signature ever added.
        let mut baseline = Image::load(bytes.clone()).unwrap();
        let baseline_out = baseline.write_attached();

        // add_signature followed by remove_signature on the same index
        // must cancel out completely, including the checksum and data
        // directory fields write_attached() refreshes — not just the raw
        // sig_bytes buffer certtable.rs's own tests cover.
        let mut roundtripped = Image::load(bytes).unwrap();
        roundtripped.add_signature(&[0x5a; 37]);
        assert_eq!(roundtripped.signature_count(), 1);
        roundtripped.remove_signature(0).unwrap();
        assert_eq!(roundtripped.signature_count(), 0);
        let roundtripped_out = roundtripped.write_attached();

        assert_eq!(roundtripped_out, baseline_out);
    }

    #[test]
    fn invalid_dos_magic_fails_closed() {
        let mut bytes = minimal_pe32_plus();
        bytes[0] = 0;
        bytes[1] = 0;
        let err = Image::load(bytes);
        assert!(err.is_err());
    }

    #[test]
    fn unmodified_round_trip_matches_except_checksum() {
        let bytes = minimal_pe32_plus();
        let mut image = Image::load(bytes.clone()).unwrap();
        let out = image.write_attached();

        assert_eq!(out.len(), bytes.len());
        let checksum_offset = image.header.checksum_offset;
        for i in 0..out.len() {
            if i < checksum_offset || i >= checksum_offset + 4 {
                assert_eq!(out[i], bytes[i], "byte {i} differs outside checksum field");
            }
        }
    }

    #[test]
    fn exact_round_trip_when_checksum_already_correct() {
        let mut bytes = minimal_pe32_plus();
        let header = ParsedHeader::parse(&bytes).unwrap();
        let correct = checksum::compute(&bytes, header.checksum_offset, bytes.len(), &[]);
        write_u32_le(&mut bytes, header.checksum_offset, correct);

        let mut image = Image::load(bytes.clone()).unwrap();
        let out = image.write_attached();
        assert_eq!(out, bytes);
    }

    #[test]
    fn checksum_independent_of_stored_value() {
        let bytes = minimal_pe32_plus();
        let header = ParsedHeader::parse(&bytes).unwrap();

        let mut bytes_a = bytes.clone();
        write_u32_le(&mut bytes_a, header.checksum_offset, 0);
        let mut image_a = Image::load(bytes_a).unwrap();
        let out_a = image_a.write_attached();

        let mut bytes_b = bytes;
        write_u32_le(&mut bytes_b, header.checksum_offset, 0xffff_ffff);
        let mut image_b = Image::load(bytes_b).unwrap();
        let out_b = image_b.write_attached();

        assert_eq!(out_a, out_b);
    }

    #[test]
    fn signature_count_bounds_get() {
        let bytes = minimal_pe32_plus();
        let mut image = Image::load(bytes).unwrap();
        image.add_signature(&[1; 4]);
        image.add_signature(&[2; 4]);
        image.add_signature(&[3; 4]);

        for i in 0..3 {
            assert!(image.get_signature(i).is_ok());
        }
        assert!(image.get_signature(3).is_err());
    }

    #[test]
    fn alignment_invariants_hold() {
        let bytes = minimal_pe32_plus();
        let mut image = Image::load(bytes).unwrap();
        assert_eq!(image.data_size() % 8, 0);

        image.add_signature(&[1; 3]);
        assert_eq!(image.sig_bytes.len() % 8, 0);
    }

    #[test]
    fn data_directory_consistency() {
        let bytes = minimal_pe32_plus();
        let mut image = Image::load(bytes).unwrap();
        let unsigned = image.write_attached();
        let header = image.header;
        assert_eq!(
            (
                read_u32_le(&unsigned, header.cert_dir_entry_offset).unwrap(),
                read_u32_le(&unsigned, header.cert_dir_entry_offset + 4).unwrap()
            ),
            (0, 0)
        );

        image.add_signature(&[9; 9]);
        let signed = image.write_attached();
        assert_eq!(
            (
                read_u32_le(&signed, header.cert_dir_entry_offset).unwrap(),
                read_u32_le(&signed, header.cert_dir_entry_offset + 4).unwrap()
            ),
            (image.data_size() as u32, image.sig_bytes.len() as u32)
        );
    }

    #[test]
    fn existing_signature_is_recovered_on_reload() {
        let mut bytes = minimal_pe32_plus();
        let mut sig = Vec::new();
        certtable::add(&mut sig, &[0x55; 20]);
        set_cert_dir_entry(&mut bytes, PeVariant::Pe32Plus, 0x400, sig.len() as u32);
        bytes.extend_from_slice(&sig);

        let image = Image::load(bytes).unwrap();
        assert_eq!(image.signature_count(), 1);
        assert_eq!(image.get_signature(0).unwrap(), &[0x55; 20]);
    }
}
