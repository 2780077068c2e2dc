// SPDX-License-Identifier: MIT OR Apache-2.0
use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use sbsign_core::diagnostics::TracingDiagnostics;
use sbsign_core::{Image, Signer};
use std::path::{Path, PathBuf};
use tracing::{debug, debug_span, info};

use crate::openssl_signer::OpenSslSigner;

#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum KeyForm {
    Pem,
    Engine,
}

#[derive(Args, Debug)]
pub struct SignArgs {
    /// Signing key (PEM-encoded RSA private key, unless --keyform ENGINE)
    #[arg(long)]
    key: PathBuf,
    /// Certificate (X.509, PEM-encoded)
    #[arg(long)]
    cert: PathBuf,
    /// Form of the key in <key>; defaults to PEM rather than being left
    /// uninitialized when unspecified
    #[arg(long, value_enum, default_value_t = KeyForm::Pem)]
    keyform: KeyForm,
    /// Engine to load the key from (required when --keyform engine)
    #[arg(long)]
    engine: Option<String>,
    /// Write a detached PKCS#7 signature instead of a signed binary
    #[arg(long)]
    detached: bool,
    /// Allow signing an image that already carries one or more signatures
    #[arg(long)]
    add: bool,
    /// Output path (default: <image>.signed, or <image>.pk7 if --detached)
    #[arg(long)]
    output: Option<PathBuf>,
    /// The EFI boot image to sign
    image: PathBuf,
}

impl SignArgs {
    pub fn run(self) -> Result<()> {
        let _span = debug_span!("sign", image = %self.image.display()).entered();

        if self.keyform == KeyForm::Engine && self.engine.is_none() {
            bail!("specified keyform as engine but no engine specified");
        }

        let raw = std::fs::read(&self.image)
            .with_context(|| format!("reading {}", self.image.display()))?;

        let mut image = Image::load_with_diagnostics(raw, &mut TracingDiagnostics)
            .context("parsing PE/COFF image")?;

        if image.signature_count() > 0 && !self.add {
            bail!(
                "{} already has {} signature(s); pass --add to append another",
                self.image.display(),
                image.signature_count()
            );
        }

        let digest = image.hash_sha256();
        debug!(digest = %hex(&digest), "computed authenticode digest");

        let idc_der = sbsign_core::idc::build_indirect_data_content(&digest);

        let signer = OpenSslSigner::load(&self.cert, &self.key, self.keyform, self.engine.as_deref())
            .context("loading signing key/certificate")?;
        let pkcs7_der = signer.sign(&idc_der).context("signing authenticode digest")?;

        image.add_signature(&pkcs7_der);
        info!(
            count = image.signature_count(),
            "appended WIN_CERTIFICATE entry"
        );

        let outfilename = self
            .output
            .clone()
            .unwrap_or_else(|| default_outfilename(&self.image, self.detached));

        if self.detached {
            let index = image.signature_count() - 1;
            let detached = image.write_detached(index)?;
            std::fs::write(&outfilename, detached)
                .with_context(|| format!("writing {}", outfilename.display()))?;
        } else {
            let attached = image.write_attached();
            std::fs::write(&outfilename, attached)
                .with_context(|| format!("writing {}", outfilename.display()))?;
        }

        info!(output = %outfilename.display(), "wrote signed output");
        Ok(())
    }
}

/// `<input>.signed` normally, `<input>.pk7` for `--detached`.
fn default_outfilename(infile: &Path, detached: bool) -> PathBuf {
    let extension = if detached { "pk7" } else { "signed" };
    let mut out = infile.as_os_str().to_owned();
    out.push(".");
    out.push(extension);
    PathBuf::from(out)
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
