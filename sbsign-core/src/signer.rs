//! The opaque signer collaborator. Key/certificate loading and the
//! PKCS#7 construction itself are deliberately outside this crate's
//! scope; this trait is the seam a caller plugs a concrete implementation
//! into, keeping signing a distinct, swappable step from image editing.

use crate::error::Error;

/// Produces a detached PKCS#7 `SignedData` DER blob whose authenticated
/// content is the `SpcIndirectDataContent` DER passed in.
///
/// Implementations are responsible for setting the inner content type to
/// [`crate::idc::SPC_INDIRECT_DATA_OBJID`] and for whatever key material
/// / engine access they need; none of that is visible to `sbsign-core`.
pub trait Signer {
    /// `idc_der` is the exact byte sequence [`crate::idc::build_indirect_data_content`]
    /// produced — sign it as opaque content, don't reinterpret it.
    fn sign(&self, idc_der: &[u8]) -> Result<Vec<u8>, Error>;
}
