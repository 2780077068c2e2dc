// SPDX-License-Identifier: MIT OR Apache-2.0
//! Authenticode-style signing core for PE/COFF (UEFI Secure Boot) images.
//!
//! This crate owns the byte-exact parsing, hashing and certificate-table
//! editing a signer needs; it never touches a filesystem, a private key,
//! or a PKCS#7 signing engine. Those are a caller's job: load bytes,
//! build a [`signer::Signer`], drive [`image::Image`].

pub mod authenticode;
pub mod byteio;
pub mod certtable;
pub mod checksum;
pub mod der;
pub mod diagnostics;
pub mod error;
pub mod header;
pub mod idc;
pub mod image;
pub mod regions;
pub mod signer;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
pub use image::Image;
pub use signer::Signer;
