// SPDX-License-Identifier: MIT OR Apache-2.0
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use sbsign_core::diagnostics::TracingDiagnostics;
use sbsign_core::Image;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Output {
    Human,
    Json,
    JsonPretty,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the PE/COFF image to inspect
    image: PathBuf,
    /// Output format (human by default)
    #[arg(long, value_enum, default_value_t = Output::Human)]
    format: Output,
}

#[derive(Debug, serde::Serialize)]
struct Report {
    variant: &'static str,
    machine: &'static str,
    data_size: usize,
    digest_sha256: String,
    regions: Vec<RegionInfo>,
    signatures: Vec<SignatureInfo>,
}

#[derive(Debug, serde::Serialize)]
struct RegionInfo {
    label: String,
    offset: usize,
    len: usize,
}

#[derive(Debug, serde::Serialize)]
struct SignatureInfo {
    index: usize,
    len: usize,
}

impl InspectArgs {
    pub fn run(self) -> Result<()> {
        let raw = std::fs::read(&self.image)
            .with_context(|| format!("reading {}", self.image.display()))?;
        let image = Image::load_with_diagnostics(raw, &mut TracingDiagnostics)
            .context("parsing PE/COFF image")?;

        let regions = image
            .regions()
            .iter()
            .map(|r| RegionInfo {
                label: r.label.clone(),
                offset: r.offset,
                len: r.len,
            })
            .collect();

        let signatures = (0..image.signature_count())
            .map(|i| SignatureInfo {
                index: i,
                len: image.get_signature(i).expect("index < signature_count").len(),
            })
            .collect();

        let report = Report {
            variant: match image.variant() {
                sbsign_core::header::PeVariant::Pe32 => "PE32",
                sbsign_core::header::PeVariant::Pe32Plus => "PE32+",
            },
            machine: image.machine_name(),
            data_size: image.data_size(),
            digest_sha256: hex(&image.hash_sha256()),
            regions,
            signatures,
        };

        match self.format {
            Output::Human => print_human(&report)?,
            Output::Json => {
                serde_json::to_writer(io::stdout(), &report)?;
                io::stdout().write_all(b"\n")?;
            }
            Output::JsonPretty => {
                serde_json::to_writer_pretty(io::stdout(), &report)?;
                io::stdout().write_all(b"\n")?;
            }
        }
        Ok(())
    }
}

fn print_human(r: &Report) -> Result<()> {
    let mut out = io::BufWriter::new(io::stdout());

    writeln!(out, "{} • {}", r.variant, r.machine)?;
    writeln!(out, "data_size: {:#x}", r.data_size)?;
    writeln!(out, "authenticode digest (sha256): {}", r.digest_sha256)?;

    writeln!(out, "regions:")?;
    for region in &r.regions {
        writeln!(
            out,
            "  {:<24} [{:#x}, {:#x})",
            region.label,
            region.offset,
            region.offset + region.len
        )?;
    }

    if r.signatures.is_empty() {
        writeln!(out, "signatures: none")?;
    } else {
        writeln!(out, "signatures:")?;
        for sig in &r.signatures {
            writeln!(out, "  [{}] {} bytes", sig.index, sig.len)?;
        }
    }

    out.flush()?;
    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
