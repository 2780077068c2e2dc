//! Authenticode hasher: SHA-256 over the checksum region sequence, in order.

use crate::regions::Region;
use sha2::{Digest, Sha256};

/// Hashes `bytes` over each of `regions`, in list order, returning the
/// 32-byte SHA-256 digest.
///
/// Regions are assumed to already be validated (disjoint, in-bounds);
/// callers build them via [`crate::regions::build_regions`].
pub fn hash_sha256(bytes: &[u8], regions: &[Region]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for region in regions {
        hasher.update(&bytes[region.offset..region.offset + region.len]);
    }
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingDiagnostics;
    use crate::header::ParsedHeader;
    use crate::regions::build_regions;
    use crate::test_support::minimal_pe32_plus;

    #[test]
    fn hash_matches_manual_concatenation() {
        let bytes = minimal_pe32_plus();
        let header = ParsedHeader::parse(&bytes).unwrap();
        let mut diag = CollectingDiagnostics::default();
        let (regions, _data_size) = build_regions(&bytes, &header, 0, &mut diag);

        let mut concatenated = Vec::new();
        for r in &regions {
            concatenated.extend_from_slice(&bytes[r.offset..r.offset + r.len]);
        }
        let expected: [u8; 32] = Sha256::digest(&concatenated).into();

        assert_eq!(hash_sha256(&bytes, &regions), expected);
    }

    #[test]
    fn hash_is_deterministic() {
        let bytes = minimal_pe32_plus();
        let header = ParsedHeader::parse(&bytes).unwrap();
        let mut diag = CollectingDiagnostics::default();
        let (regions, _) = build_regions(&bytes, &header, 0, &mut diag);

        assert_eq!(hash_sha256(&bytes, &regions), hash_sha256(&bytes, &regions));
    }
}
