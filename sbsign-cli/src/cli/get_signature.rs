// SPDX-License-Identifier: MIT OR Apache-2.0
use anyhow::{Context, Result};
use clap::Args;
use sbsign_core::diagnostics::TracingDiagnostics;
use sbsign_core::Image;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub struct GetSignatureArgs {
    /// Index of the signature entry to extract
    #[arg(long)]
    index: usize,
    /// Where to write the raw PKCS#7 DER payload
    #[arg(long)]
    output: PathBuf,
    /// The EFI boot image to read from
    image: PathBuf,
}

impl GetSignatureArgs {
    pub fn run(self) -> Result<()> {
        let raw = std::fs::read(&self.image)
            .with_context(|| format!("reading {}", self.image.display()))?;
        let image = Image::load_with_diagnostics(raw, &mut TracingDiagnostics)
            .context("parsing PE/COFF image")?;

        let detached = image
            .write_detached(self.index)
            .with_context(|| format!("extracting signature {}", self.index))?;

        std::fs::write(&self.output, &detached)
            .with_context(|| format!("writing {}", self.output.display()))?;

        info!(
            output = %self.output.display(),
            len = detached.len(),
            "wrote detached signature"
        );
        Ok(())
    }
}
