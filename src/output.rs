//src/output.rs

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempPath};

use crate::error::{PacificError, Result};
use crate::types::AnnotatedRead;

/// Name of the merged per-read output inside the output directory.
pub const ANNOTATED_FASTA_NAME: &str = "output_PACIFIC.fasta";

/// Name of the summary table inside the output directory.
pub const SUMMARY_TABLE_NAME: &str = "output_PACIFIC.txt";

const TEMP_PREFIX: &str = "tmp_output_";

/// Writes one temporary FASTA file per chunk into the output directory and
/// concatenates them in chunk order on `finish`.
///
/// Each part is closed as soon as its chunk is written; only the path is
/// kept. The parts are removed when the writer is dropped, whether the run
/// finished or bailed out with an error.
pub struct AnnotatedFastaWriter {
    outdir: PathBuf,
    parts: Vec<TempPath>,
}

impl AnnotatedFastaWriter {
    pub fn new<P: AsRef<Path>>(outdir: P) -> Self {
        Self {
            outdir: outdir.as_ref().to_path_buf(),
            parts: Vec::new(),
        }
    }

    /// Writes the records of one chunk to a fresh temporary file.
    pub fn write_chunk(&mut self, records: &[AnnotatedRead]) -> Result<()> {
        let mut part = Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&self.outdir)
            .map_err(|e| PacificError::io(&self.outdir, e))?;
        log::info!("Writing temporary output file {}", part.path().display());

        let path = part.path().to_path_buf();
        write_records(&mut part, records).map_err(|e| PacificError::io(&path, e))?;
        // drop the handle, keep the file until finish
        self.parts.push(part.into_temp_path());
        Ok(())
    }

    /// Concatenates every chunk file into `dest` and deletes them.
    /// Returns the number of bytes written.
    pub fn finish(self, dest: &Path) -> Result<u64> {
        log::info!(
            "Writing final output FASTA {} from {} chunk files",
            dest.display(),
            self.parts.len()
        );
        let out = File::create(dest).map_err(|e| PacificError::io(dest, e))?;
        let mut writer = BufWriter::new(out);

        let mut written = 0u64;
        for part in &self.parts {
            let part_path: &Path = part;
            let mut input = File::open(part_path).map_err(|e| PacificError::io(part_path, e))?;
            written += io::copy(&mut input, &mut writer).map_err(|e| PacificError::io(dest, e))?;
        }
        writer.flush().map_err(|e| PacificError::io(dest, e))?;

        for part in self.parts {
            let path = part.to_path_buf();
            part.close().map_err(|e| PacificError::io(&path, e))?;
            log::debug!("Deleted temporary file {}", path.display());
        }
        Ok(written)
    }
}

fn write_records<W: Write>(out: W, records: &[AnnotatedRead]) -> io::Result<()> {
    let mut writer = BufWriter::new(out);
    for record in records {
        writeln!(writer, "{}", record.header())?;
        writeln!(writer, "{}", record.sequence)?;
    }
    writer.flush()
}
