//! Region builder: the ordered, non-overlapping byte ranges that feed the
//! Authenticode hash.

use crate::diagnostics::{Diagnostics, Warning};
use crate::header::ParsedHeader;

/// A contiguous byte range contributing to the Authenticode hash.
/// `label` is informational only (used in diagnostics and `inspect` output).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub offset: usize,
    pub len: usize,
    pub label: String,
}

impl Region {
    fn new(offset: usize, len: usize, label: impl Into<String>) -> Self {
        Region {
            offset,
            len,
            label: label.into(),
        }
    }

    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Builds the ordered region list for `header` over `bytes`, and returns
/// `data_size`: the 8-byte-aligned logical end of hashable content.
///
/// `cert_table_size` is the current size of the (already separate)
/// certificate table, used only to size the trailing "endjunk" region /
/// decide whether to warn about overlap.
pub fn build_regions(
    bytes: &[u8],
    header: &ParsedHeader,
    cert_table_size: usize,
    diag: &mut dyn Diagnostics,
) -> (Vec<Region>, usize) {
    let mut regions = Vec::with_capacity(3 + header.num_sections);

    regions.push(Region::new(0, header.checksum_offset, "begin->cksum"));
    regions.push(Region::new(
        header.checksum_offset + 4,
        header.cert_dir_entry_offset - (header.checksum_offset + 4),
        "cksum->datadir[CERT]",
    ));
    regions.push(Region::new(
        header.cert_dir_entry_offset + 8,
        header.size_of_headers.saturating_sub(header.cert_dir_entry_offset + 8),
        "datadir[CERT]->headers",
    ));

    for i in 0..header.num_sections {
        let (file_offset, file_size) = match header.section_extent(bytes, i) {
            Ok(v) => v,
            Err(e) => {
                diag.warn(Warning::MalformedSectionHeader {
                    index: i,
                    detail: e.to_string(),
                });
                continue;
            }
        };
        if file_size == 0 {
            continue;
        }

        let name = section_name(bytes, header, i);

        if file_offset + file_size > bytes.len() {
            diag.warn(Warning::SectionBeyondEof {
                name: name.clone(),
                end: file_offset + file_size,
                file_len: bytes.len(),
            });
        }

        regions.push(Region::new(file_offset, file_size, name));
    }

    regions.sort_by_key(|r| r.offset);

    // The boundaries between the three fixed header regions always skip
    // bytes on purpose (the CheckSum field, the DataDirectory[4] entry)
    // and must never be reported as a gap. `image_find_regions` only
    // checks a newly-inserted section against the region preceding it;
    // mirror that by skipping any pair that's entirely within the fixed
    // three, and only flagging gaps that touch a section-derived region.
    let mut gap_warn = false;
    for w in regions.windows(2) {
        if is_fixed_header_region(&w[0].label) && is_fixed_header_region(&w[1].label) {
            continue;
        }
        if w[0].end() != w[1].offset {
            diag.warn(Warning::RegionGap {
                prev: w[0].label.clone(),
                prev_range: (w[0].offset, w[0].end()),
                next: w[1].label.clone(),
                next_range: (w[1].offset, w[1].end()),
            });
            gap_warn = true;
        }
    }
    if gap_warn {
        diag.warn(Warning::GapsMayAffectChecksum);
    }

    // What matters for trailing/overflow accounting is the true consumed
    // span: the end of the rightmost region once everything is sorted.
    // Summing individual region lengths undercounts by the CheckSum field
    // and DataDirectory[4] bytes that are deliberately skipped between the
    // three fixed regions, *and* can't be told apart from a real internal
    // section-table gap (which also makes a naive sum fall short of the
    // rightmost region's end). Anchoring on `last().end()` gets both right:
    // it already accounts for the skipped header bytes, and it ignores
    // internal gaps entirely, since those are reported separately above.
    let last_end = regions.last().expect("always at least 3 fixed regions").end();

    if last_end + cert_table_size < bytes.len() {
        let endjunk_offset = last_end;
        let endjunk_size = bytes.len() - last_end - cert_table_size;
        diag.warn(Warning::TrailingData {
            covered: last_end + cert_table_size,
            file_len: bytes.len(),
        });
        regions.push(Region::new(endjunk_offset, endjunk_size, "endjunk"));
    } else if last_end + cert_table_size > bytes.len() {
        diag.warn(Warning::RegionsExceedFileSize {
            covered: last_end + cert_table_size,
            file_len: bytes.len(),
        });
    }

    let last = regions.last().expect("always at least 3 fixed regions");
    let data_size = crate::byteio::align8(last.end());

    (regions, data_size)
}

/// True for the three always-present, always-adjacent-by-construction
/// fixed regions (`begin->cksum`, `cksum->datadir[CERT]`,
/// `datadir[CERT]->headers`), whose mutual boundaries deliberately skip
/// bytes and must never be treated as a section-table gap.
fn is_fixed_header_region(label: &str) -> bool {
    matches!(
        label,
        "begin->cksum" | "cksum->datadir[CERT]" | "datadir[CERT]->headers"
    )
}

fn section_name(bytes: &[u8], header: &ParsedHeader, index: usize) -> String {
    const SECTION_HEADER_SIZE: usize = 40;
    let base = header.section_table_offset + index * SECTION_HEADER_SIZE;
    let raw = bytes.get(base..base + 8).unwrap_or(&[]);
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
