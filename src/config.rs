//src/config.rs

use std::path::PathBuf;

use crate::error::{PacificError, Result};
use crate::fastx::FileFormat;
use crate::kmer::{DEFAULT_KMER_SIZE, READ_WINDOW};

pub const DEFAULT_THRESHOLD: f32 = 0.95;
pub const DEFAULT_CHUNK_SIZE: usize = 50_000;

/// Parameters of one classification run.
#[derive(Debug, Clone)]
pub struct PacificConfig {
    pub input: PathBuf,
    pub file_format: FileFormat,
    pub outdir: PathBuf,
    pub kmer_size: usize,
    pub threshold: f32,
    pub chunk_size: usize,
    /// Write the per-read annotated FASTA.
    pub output_fasta: bool,
}

impl PacificConfig {
    /// A config with the default parameters for `input`.
    pub fn new<P: Into<PathBuf>>(input: P) -> Self {
        Self {
            input: input.into(),
            file_format: FileFormat::Fasta,
            outdir: PathBuf::from("."),
            kmer_size: DEFAULT_KMER_SIZE,
            threshold: DEFAULT_THRESHOLD,
            chunk_size: DEFAULT_CHUNK_SIZE,
            output_fasta: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.kmer_size == 0 || self.kmer_size > READ_WINDOW {
            return Err(PacificError::InvalidConfig(format!(
                "k-mer size must be between 1 and {} (got {})",
                READ_WINDOW, self.kmer_size
            )));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(PacificError::InvalidConfig(format!(
                "prediction threshold must be within [0, 1] (got {})",
                self.threshold
            )));
        }
        if self.chunk_size == 0 {
            return Err(PacificError::InvalidConfig(
                "chunk size must be greater than 0".to_string(),
            ));
        }
        if !self.input.exists() {
            return Err(PacificError::InvalidConfig(format!(
                "input file not found: {}",
                self.input.display()
            )));
        }
        Ok(())
    }
}
