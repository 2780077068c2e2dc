//! Synthetic PE32/PE32+ byte-buffer builders shared by unit tests across
//! this crate. Not part of the public API.

use crate::header::PeVariant;

/// Offset of the PE signature in every buffer this module builds.
pub const PE_HEADER_OFFSET: usize = 0x80;
/// `FileAlignment`/`SizeOfHeaders` used by every buffer this module builds.
pub const SIZE_OF_HEADERS: usize = 0x200;

/// A section to bake into a synthetic image.
pub struct SectionSpec {
    pub name: &'static str,
    pub pointer_to_raw_data: u32,
    pub size_of_raw_data: u32,
}

fn opthdr_min_size(variant: PeVariant) -> usize {
    match variant {
        PeVariant::Pe32 => 96,
        PeVariant::Pe32Plus => 112,
    }
}

fn machine_for(variant: PeVariant) -> u16 {
    match variant {
        PeVariant::Pe32 => 0x014c,   // IMAGE_FILE_MACHINE_I386
        PeVariant::Pe32Plus => 0x8664, // IMAGE_FILE_MACHINE_AMD64
    }
}

fn magic_for(variant: PeVariant) -> u16 {
    match variant {
        PeVariant::Pe32 => 0x010b,
        PeVariant::Pe32Plus => 0x020b,
    }
}

/// Builds a synthetic image of `total_len` bytes with the given sections
/// and an empty certificate table (security data directory entry = (0, 0)).
pub fn build_image(variant: PeVariant, total_len: usize, sections: &[SectionSpec]) -> Vec<u8> {
    let mut buf = vec![0u8; total_len];

    // DOS header.
    buf[0] = b'M';
    buf[1] = b'Z';
    buf[0x3c..0x3c + 4].copy_from_slice(&(PE_HEADER_OFFSET as u32).to_le_bytes());

    // PE signature + file header.
    buf[PE_HEADER_OFFSET..PE_HEADER_OFFSET + 4].copy_from_slice(b"PE\0\0");
    let file_header_offset = PE_HEADER_OFFSET + 4;
    let opthdr_min = opthdr_min_size(variant);
    let opthdr_size = opthdr_min + 16 * 8; // 16 data directory entries, typical.

    buf[file_header_offset..file_header_offset + 2]
        .copy_from_slice(&machine_for(variant).to_le_bytes());
    buf[file_header_offset + 2..file_header_offset + 4]
        .copy_from_slice(&(sections.len() as u16).to_le_bytes());
    buf[file_header_offset + 16..file_header_offset + 18]
        .copy_from_slice(&(opthdr_size as u16).to_le_bytes());

    let opthdr_offset = file_header_offset + 20;
    buf[opthdr_offset..opthdr_offset + 2].copy_from_slice(&magic_for(variant).to_le_bytes());
    // FileAlignment @ 36, SizeOfHeaders @ 60, CheckSum @ 64 — identical in both variants.
    buf[opthdr_offset + 36..opthdr_offset + 40]
        .copy_from_slice(&(SIZE_OF_HEADERS as u32).to_le_bytes());
    buf[opthdr_offset + 60..opthdr_offset + 64]
        .copy_from_slice(&(SIZE_OF_HEADERS as u32).to_le_bytes());
    // CheckSum left at 0; security data directory (index 4) left at (0, 0).

    let section_table_offset = opthdr_offset + opthdr_size;
    assert!(
        section_table_offset + sections.len() * 40 <= SIZE_OF_HEADERS,
        "test image's section table does not fit before SizeOfHeaders"
    );
    for (i, s) in sections.iter().enumerate() {
        let base = section_table_offset + i * 40;
        let name_bytes = s.name.as_bytes();
        let n = name_bytes.len().min(8);
        buf[base..base + n].copy_from_slice(&name_bytes[..n]);
        buf[base + 16..base + 20].copy_from_slice(&s.size_of_raw_data.to_le_bytes());
        buf[base + 20..base + 24].copy_from_slice(&s.pointer_to_raw_data.to_le_bytes());
    }

    buf
}

/// A 1024-byte PE32+ image, DOS header at 0, PE header at `0x80`, one
/// `.text` section at `0x200` sized `0x200`, empty certificate table.
pub fn minimal_pe32_plus() -> Vec<u8> {
    build_image(
        PeVariant::Pe32Plus,
        0x400,
        &[SectionSpec {
            name: ".text",
            pointer_to_raw_data: 0x200,
            size_of_raw_data: 0x200,
        }],
    )
}

/// Sets data directory entry 4 (security / certificate table) to
/// `(addr, size)` as two little-endian `u32`s.
pub fn set_cert_dir_entry(bytes: &mut [u8], variant: PeVariant, addr: u32, size: u32) {
    let opthdr_offset = PE_HEADER_OFFSET + 4 + 20;
    let cert_dir_offset = opthdr_offset + opthdr_min_size(variant) + 4 * 8;
    bytes[cert_dir_offset..cert_dir_offset + 4].copy_from_slice(&addr.to_le_bytes());
    bytes[cert_dir_offset + 4..cert_dir_offset + 8].copy_from_slice(&size.to_le_bytes());
}
