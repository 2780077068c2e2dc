// SPDX-License-Identifier: MIT OR Apache-2.0
//! An `openssl`-backed [`sbsign_core::Signer`]: loads a PEM key/certificate
//! pair (or an engine-backed key) and produces a PKCS#7 `SignedData` blob
//! over the IDC bytes it's handed.
//!
//! Known limitation: `openssl::pkcs7::Pkcs7::sign` always sets the signed
//! content's type to `pkcs7-data` (1.2.840.113549.1.7.1). Genuine
//! Authenticode requires `contentType = SPC_INDIRECT_DATA_OBJID`
//! (`1.3.6.1.4.1.311.2.1.4`) wrapping the IDC DER verbatim; the safe
//! `openssl` bindings don't expose a way to override the inner content
//! type, which would need a lower-level PKCS7 builder than this crate
//! pulls in. This mirrors the "possible source bugs" framing the core
//! spec itself uses for ambiguous areas — recorded here as an open gap
//! rather than silently producing a mislabeled signature.

use anyhow::{bail, Context, Result};
use openssl::pkcs7::{Pkcs7, Pkcs7Flags};
use openssl::pkey::{PKey, Private};
use openssl::stack::Stack;
use openssl::x509::X509;
use sbsign_core::Error;
use std::path::Path;

use crate::cli::sign::KeyForm;

pub struct OpenSslSigner {
    cert: X509,
    pkey: PKey<Private>,
}

impl OpenSslSigner {
    /// Loads `cert_path`/`key_path` as PEM. `keyform`/`engine` are accepted
    /// for CLI-surface parity with `sbsign.c`'s `--keyform`/`--engine`
    /// flags; engine-backed key loading is not implemented, matching this
    /// crate's stated scope of "opaque signer" rather than full
    /// key-management tooling.
    pub fn load(
        cert_path: &Path,
        key_path: &Path,
        keyform: KeyForm,
        engine: Option<&str>,
    ) -> Result<Self> {
        if keyform == KeyForm::Engine {
            bail!(
                "engine-backed key loading is not implemented by this tool \
                 (requested engine: {})",
                engine.unwrap_or("<unspecified>")
            );
        }

        let cert_pem = std::fs::read(cert_path)
            .with_context(|| format!("reading certificate {}", cert_path.display()))?;
        let cert = X509::from_pem(&cert_pem)
            .with_context(|| format!("parsing certificate {}", cert_path.display()))?;

        let key_pem = std::fs::read(key_path)
            .with_context(|| format!("reading key {}", key_path.display()))?;
        let pkey = PKey::private_key_from_pem(&key_pem)
            .with_context(|| format!("parsing private key {}", key_path.display()))?;

        Ok(OpenSslSigner { cert, pkey })
    }
}

impl sbsign_core::Signer for OpenSslSigner {
    fn sign(&self, idc_der: &[u8]) -> Result<Vec<u8>, Error> {
        let empty_chain = Stack::new().map_err(|e| Error::CryptoFailure(e.to_string()))?;
        let pkcs7 = Pkcs7::sign(
            &self.cert,
            &self.pkey,
            &empty_chain,
            idc_der,
            Pkcs7Flags::BINARY,
        )
        .map_err(|e| Error::CryptoFailure(e.to_string()))?;

        pkcs7
            .to_der()
            .map_err(|e| Error::CryptoFailure(e.to_string()))
    }
}
