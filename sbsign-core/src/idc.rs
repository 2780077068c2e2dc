//! IDC builder: constructs the DER encoding of `SpcIndirectDataContent`
//! that wraps an Authenticode digest.
//!
//! The OIDs and the `SpcSerializedObject` class GUID below are the fixed
//! constants Microsoft's Authenticode format defines; none of them are
//! invented.

use crate::der;

/// `SPC_INDIRECT_DATA_OBJID` — the PKCS#7 content-type OID a signer must
/// use when wrapping the bytes this module produces.
pub const SPC_INDIRECT_DATA_OBJID: &str = "1.3.6.1.4.1.311.2.1.4";
/// `SPC_PE_IMAGE_DATA_OBJID`.
const SPC_PE_IMAGE_DATA_OBJID: &str = "1.3.6.1.4.1.311.2.1.15";
/// `sha256` in the `AlgorithmIdentifier` sense.
const SHA256_OID: &str = "2.16.840.1.101.3.4.2.1";

/// Fixed `SpcSerializedObject.classId` GUID:
/// `A6B586D5-B4A1-2466-AE05-A217DA8E60D6`, in Microsoft's mixed-endian
/// wire order (Data1/Data2/Data3 little-endian, Data4 as-is).
const SPC_UUID: [u8; 16] = [
    0xd5, 0x86, 0xb5, 0xa6, 0xa1, 0xb4, 0x66, 0x24, 0xae, 0x05, 0xa2, 0x17, 0xda, 0x8e, 0x60, 0xd6,
];

fn spc_serialized_object() -> Vec<u8> {
    let class_id = der::octet_string(&SPC_UUID);
    let data = der::octet_string(&[]);
    der::sequence(&[class_id, data].concat())
}

fn spc_link() -> Vec<u8> {
    // SpcLink = [2] EXPLICIT SpcSerializedObject
    der::context_explicit(2, &spc_serialized_object())
}

fn spc_pe_image_data() -> Vec<u8> {
    let flags = der::bit_string(0, &[]);
    let file = der::context_explicit(0, &spc_link());
    der::sequence(&[flags, file].concat())
}

fn spc_attribute_type_and_optional_value() -> Vec<u8> {
    let ty = der::object_identifier(SPC_PE_IMAGE_DATA_OBJID);
    let value = spc_pe_image_data();
    der::sequence(&[ty, value].concat())
}

fn digest_info(digest: &[u8; 32]) -> Vec<u8> {
    let algorithm = der::sequence(&[der::object_identifier(SHA256_OID), der::null()].concat());
    let digest_octets = der::octet_string(digest);
    der::sequence(&[algorithm, digest_octets].concat())
}

/// Builds the DER encoding of `SpcIndirectDataContent` wrapping `digest`.
///
/// This is the value a [`crate::signer::Signer`] must sign, with content
/// type [`SPC_INDIRECT_DATA_OBJID`].
pub fn build_indirect_data_content(digest: &[u8; 32]) -> Vec<u8> {
    let data = spc_attribute_type_and_optional_value();
    let message_digest = digest_info(digest);
    der::sequence(&[data, message_digest].concat())
}
