use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use flate2::read::MultiGzDecoder;

use crate::error::{PacificError, Result};
use crate::types::Read;

/// Input record format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Fasta,
    Fastq,
}

impl FromStr for FileFormat {
    type Err = PacificError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fasta" | "fa" => Ok(FileFormat::Fasta),
            "fastq" | "fq" => Ok(FileFormat::Fastq),
            other => Err(PacificError::InvalidConfig(format!(
                "unknown file type '{}', expected fasta or fastq",
                other
            ))),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Fasta => f.write_str("fasta"),
            FileFormat::Fastq => f.write_str("fastq"),
        }
    }
}

/// Streaming FASTA/FASTQ reader that also supports .gz.
///
/// Yields one `Read` at a time so a chunk never holds more than `chunk_size`
/// records. Lines are read as bytes; malformed records, including ones that
/// are not valid UTF-8, are skipped and counted in `skipped()`.
pub struct FastxReader {
    reader: Box<dyn BufRead>,
    format: FileFormat,
    path: PathBuf,
    line: Vec<u8>,
    // header line already consumed while scanning the previous record
    pending: Option<Vec<u8>>,
    skipped: u64,
    done: bool,
}

impl FastxReader {
    pub fn open<P: AsRef<Path>>(path: P, format: FileFormat) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| PacificError::io(path, e))?;

        // If the file ends with ".gz", wrap it in a MultiGzDecoder
        let is_gz = path
            .extension()
            .map(|ext| ext == "gz")
            .unwrap_or(false);

        let reader: Box<dyn BufRead> = if is_gz {
            Box::new(BufReader::new(MultiGzDecoder::new(f)))
        } else {
            Box::new(BufReader::with_capacity(1024 * 1024, f))
        };

        Ok(Self::from_reader(reader, format, path))
    }

    pub fn from_reader<R: BufRead + 'static>(reader: R, format: FileFormat, path: &Path) -> Self {
        Self {
            reader: Box::new(reader),
            format,
            path: path.to_path_buf(),
            line: Vec::with_capacity(256),
            pending: None,
            skipped: 0,
            done: false,
        }
    }

    /// Number of malformed records dropped so far.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Pull up to `size` records. An empty vector means end of input.
    pub fn next_chunk(&mut self, size: usize) -> Result<Vec<Read>> {
        let mut chunk = Vec::with_capacity(size.min(65_536));
        while chunk.len() < size {
            match self.next() {
                Some(read) => chunk.push(read?),
                None => break,
            }
        }
        Ok(chunk)
    }

    /// Reads one line into `self.line` without its trailing whitespace.
    fn read_line(&mut self) -> Result<bool> {
        self.line.clear();
        let n = self
            .reader
            .read_until(b'\n', &mut self.line)
            .map_err(|e| PacificError::io(&self.path, e))?;
        while self.line.last().is_some_and(|b| b.is_ascii_whitespace()) {
            self.line.pop();
        }
        Ok(n > 0)
    }

    /// Like `read_line`, but hands back a stashed header first.
    fn next_line(&mut self) -> Result<bool> {
        if let Some(line) = self.pending.take() {
            self.line = line;
            return Ok(true);
        }
        self.read_line()
    }

    fn next_fasta(&mut self) -> Result<Option<Read>> {
        loop {
            // Find the header, skipping anything before the first '>'
            let header = loop {
                if !self.next_line()? {
                    return Ok(None);
                }
                if self.line.first() == Some(&b'>') {
                    break self.line[1..].to_vec();
                }
                if !self.line.is_empty() {
                    log::debug!("skipping line outside of a FASTA record");
                }
            };

            let mut seq = Vec::new();
            while self.read_line()? {
                if self.line.first() == Some(&b'>') {
                    self.pending = Some(std::mem::take(&mut self.line));
                    break;
                }
                seq.extend(self.line.iter().filter(|b| !b.is_ascii_whitespace()));
            }

            match decode_record(&header, seq) {
                Some(read) => return Ok(Some(read)),
                None => {
                    log::debug!(
                        "skipping FASTA record '{}' that is not valid UTF-8",
                        String::from_utf8_lossy(&header)
                    );
                    self.skipped += 1;
                }
            }
        }
    }

    fn next_fastq(&mut self) -> Result<Option<Read>> {
        loop {
            // 1) header
            if !self.next_line()? {
                return Ok(None);
            }
            if self.line.is_empty() {
                continue;
            }
            if self.line.first() != Some(&b'@') {
                log::debug!(
                    "skipping malformed FASTQ header: {}",
                    String::from_utf8_lossy(&self.line)
                );
                self.skipped += 1;
                continue;
            }
            let header = self.line[1..].to_vec();

            // 2) sequence
            if !self.read_line()? {
                self.skipped += 1;
                return Ok(None);
            }
            let seq = self.line.clone();

            // 3) plus line
            if !self.read_line()? {
                self.skipped += 1;
                return Ok(None);
            }
            if self.line.first() != Some(&b'+') {
                log::debug!(
                    "skipping FASTQ record '{}' without '+' separator",
                    String::from_utf8_lossy(&header)
                );
                self.skipped += 1;
                if self.line.first() == Some(&b'@') {
                    // truncated record, this line starts the next one
                    self.pending = Some(std::mem::take(&mut self.line));
                } else {
                    // drop the quality line of the broken record
                    self.read_line()?;
                }
                continue;
            }

            // 4) quality, length must match the sequence
            if !self.read_line()? {
                self.skipped += 1;
                return Ok(None);
            }
            if self.line.len() != seq.len() {
                log::debug!(
                    "skipping FASTQ record '{}' with mismatched quality length",
                    String::from_utf8_lossy(&header)
                );
                self.skipped += 1;
                continue;
            }

            match decode_record(&header, seq) {
                Some(read) => return Ok(Some(read)),
                None => {
                    log::debug!(
                        "skipping FASTQ record '{}' that is not valid UTF-8",
                        String::from_utf8_lossy(&header)
                    );
                    self.skipped += 1;
                }
            }
        }
    }
}

impl Iterator for FastxReader {
    type Item = Result<Read>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let next = match self.format {
            FileFormat::Fasta => self.next_fasta(),
            FileFormat::Fastq => self.next_fastq(),
        };
        match next {
            Ok(Some(read)) => Some(Ok(read)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// `None` when the header or the sequence is not valid UTF-8.
fn decode_record(header: &[u8], seq: Vec<u8>) -> Option<Read> {
    let header = std::str::from_utf8(header).ok()?.to_string();
    let seq = String::from_utf8(seq).ok()?;
    Some(Read {
        id: header.split_whitespace().next().unwrap_or_default().to_string(),
        header_line: header,
        seq,
    })
}
