// SPDX-License-Identifier: MIT OR Apache-2.0
use anyhow::{Context, Result};
use clap::Args;
use sbsign_core::diagnostics::TracingDiagnostics;
use sbsign_core::Image;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Args, Debug)]
pub struct RemoveSignatureArgs {
    /// Index of the signature entry to remove
    #[arg(long)]
    index: usize,
    /// Output path (default: overwrite <image> in place)
    #[arg(long)]
    output: Option<PathBuf>,
    /// The EFI boot image to edit
    image: PathBuf,
}

impl RemoveSignatureArgs {
    pub fn run(self) -> Result<()> {
        let raw = std::fs::read(&self.image)
            .with_context(|| format!("reading {}", self.image.display()))?;
        let mut image = Image::load_with_diagnostics(raw, &mut TracingDiagnostics)
            .context("parsing PE/COFF image")?;

        image
            .remove_signature(self.index)
            .with_context(|| format!("removing signature {}", self.index))?;

        let outfilename: &Path = self.output.as_deref().unwrap_or(&self.image);
        let attached = image.write_attached();
        std::fs::write(outfilename, attached)
            .with_context(|| format!("writing {}", outfilename.display()))?;

        info!(
            output = %outfilename.display(),
            remaining = image.signature_count(),
            "removed signature"
        );
        Ok(())
    }
}
