//! Warning sink: an injected callback so callers (and tests) can observe
//! or assert on recoverable conditions instead of having them printed
//! straight to stderr.
//!
//! Region construction emits these for recoverable conditions: gaps,
//! overflowing sections, trailing data.

/// A recoverable condition noticed while building checksum regions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A section's declared extent runs past the current file length.
    SectionBeyondEof {
        name: String,
        end: usize,
        file_len: usize,
    },
    /// A section header failed to parse (truncated `PointerToRawData`/
    /// `SizeOfRawData`); the section is dropped from the region set.
    MalformedSectionHeader { index: usize, detail: String },
    /// Two adjacent (by offset) regions are not contiguous.
    RegionGap {
        prev: String,
        prev_range: (usize, usize),
        next: String,
        next_range: (usize, usize),
    },
    /// Summary warning emitted once after any `RegionGap`s.
    GapsMayAffectChecksum,
    /// Regions don't cover the whole file before the certificate table;
    /// an `endjunk` region was appended to cover the remainder.
    TrailingData { covered: usize, file_len: usize },
    /// Regions (plus the certificate table) cover more than the file
    /// contains — likely an invalid section table.
    RegionsExceedFileSize { covered: usize, file_len: usize },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::SectionBeyondEof { name, end, file_len } => write!(
                f,
                "file-aligned section {name} extends beyond end of file ({end:#x} > {file_len:#x})"
            ),
            Warning::MalformedSectionHeader { index, detail } => write!(
                f,
                "section header {index} is malformed and was dropped from the checksum regions: {detail}"
            ),
            Warning::RegionGap {
                prev,
                prev_range,
                next,
                next_range,
            } => write!(
                f,
                "gap in section table: {prev} {prev_range:#x?} .. {next} {next_range:#x?}"
            ),
            Warning::GapsMayAffectChecksum => {
                write!(f, "gaps in the section table may result in different checksums")
            }
            Warning::TrailingData { covered, file_len } => write!(
                f,
                "data remaining [{covered:#x} vs {file_len:#x}]: gaps between PE/COFF sections?"
            ),
            Warning::RegionsExceedFileSize { covered, file_len } => write!(
                f,
                "checksum areas ({covered:#x}) are greater than image size ({file_len:#x}); invalid section table?"
            ),
        }
    }
}

/// Receives [`Warning`]s as they're produced.
pub trait Diagnostics {
    fn warn(&mut self, warning: Warning);
}

/// A no-op sink, for callers that don't care about warnings.
#[derive(Debug, Default)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn warn(&mut self, _warning: Warning) {}
}

/// Collects every warning into a `Vec`, for tests that assert on the
/// exact warning set a gap or overflowing section produces.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    pub warnings: Vec<Warning>,
}

impl Diagnostics for CollectingDiagnostics {
    fn warn(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }
}

/// Forwards every warning to `tracing::warn!`, for the CLI.
#[derive(Debug, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn warn(&mut self, warning: Warning) {
        tracing::warn!(%warning, "image warning");
    }
}
