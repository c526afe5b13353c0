// src/lib.rs
pub mod classify;
pub mod config;
pub mod error;
pub mod fastx;
pub mod kmer;
pub mod labels;
pub mod logging;
pub mod model;
pub mod output;
pub mod tokenizer;
pub mod types;

use std::fmt::Write as FmtWrite;
use std::fs;
use std::path::{Path, PathBuf};

use crate::classify::{predict_chunk, ChunkAggregate, Summary};
use crate::config::PacificConfig;
use crate::error::{PacificError, Result};
use crate::fastx::FastxReader;
use crate::labels::{accuracy, AccuracyOutcome, LabelEncoder, TruthTable};
use crate::model::Classifier;
use crate::output::{AnnotatedFastaWriter, ANNOTATED_FASTA_NAME, SUMMARY_TABLE_NAME};
use crate::tokenizer::Tokenize;
use crate::types::VirusClass;

/// Everything a run produced besides the summary itself.
pub struct ClassificationResults {
    /// Per-class winning probabilities across all chunks
    pub aggregate: ChunkAggregate,

    /// Path of the merged per-read FASTA, if it was requested
    pub annotated_fasta: Option<PathBuf>,

    /// `(read id, label)` for every classified read, only kept on request
    pub predictions: Vec<(String, VirusClass)>,

    /// Malformed input records the reader dropped
    pub skipped_records: u64,
}

impl ClassificationResults {
    /// Build the summary table, `NoProcessedReads` if nothing was classified.
    pub fn summary(&self, threshold: f32) -> Result<Summary> {
        Summary::from_aggregate(&self.aggregate, threshold)
    }

    /// One-line account of how many reads were discarded.
    pub fn get_discarded_message(&self) -> String {
        let mut output = String::new();
        write!(
            output,
            "From a total of {} reads, {} were discarded (non-standard nucleotides or reads shorter than {} bp)",
            self.aggregate.total_sequences(),
            self.aggregate.discarded_reads(),
            kmer::READ_WINDOW
        )
        .unwrap();
        if self.skipped_records > 0 {
            write!(
                output,
                "; {} malformed input records were skipped",
                self.skipped_records
            )
            .unwrap();
        }
        output
    }
}

/// Stream the input in chunks and classify every read that passes the filter.
///
/// Per-read FASTA output goes through temporary files in `config.outdir`
/// that are merged into `output_PACIFIC.fasta` at the end and removed even if
/// the run fails midway.
pub fn classify_reads(
    config: &PacificConfig,
    tokenizer: &dyn Tokenize,
    classifier: &dyn Classifier,
    labels: &LabelEncoder,
    keep_predictions: bool,
) -> Result<ClassificationResults> {
    // 1. Check parameters and artifacts agree
    config.validate()?;
    if classifier.num_classes() != labels.len() {
        return Err(PacificError::ShapeMismatch {
            expected: labels.len(),
            actual: classifier.num_classes(),
        });
    }
    fs::create_dir_all(&config.outdir).map_err(|e| PacificError::io(&config.outdir, e))?;

    // 2. Prepare outputs
    let mut reader = FastxReader::open(&config.input, config.file_format)?;
    let mut fasta_writer = config
        .output_fasta
        .then(|| AnnotatedFastaWriter::new(&config.outdir));
    let keep_annotations = config.output_fasta || keep_predictions;

    let mut aggregate = ChunkAggregate::new();
    let mut predictions = Vec::new();
    log::info!("Reading input file {}", config.input.display());

    // 3. Classify chunk by chunk
    loop {
        let reads = reader.next_chunk(config.chunk_size)?;
        if reads.is_empty() {
            break;
        }
        let start = aggregate.total_sequences();
        let end = start + reads.len() as u64;
        log::info!("Predicting reads: {} {}", start, end);

        let chunk = predict_chunk(
            &reads,
            config.kmer_size,
            tokenizer,
            classifier,
            labels,
            keep_annotations,
        )?;
        aggregate = aggregate.merge(chunk.aggregate);

        if let Some(writer) = fasta_writer.as_mut() {
            writer.write_chunk(&chunk.annotated)?;
        }
        if keep_predictions {
            predictions.extend(
                chunk
                    .annotated
                    .into_iter()
                    .map(|a| (a.read_id, a.prediction.class)),
            );
        }
    }

    // 4. Merge the per-chunk FASTA files
    let annotated_fasta = match fasta_writer {
        Some(writer) => {
            let dest = config.outdir.join(ANNOTATED_FASTA_NAME);
            writer.finish(&dest)?;
            Some(dest)
        }
        None => None,
    };

    if reader.skipped() > 0 {
        log::warn!("Skipped {} malformed input records", reader.skipped());
    }

    Ok(ClassificationResults {
        aggregate,
        annotated_fasta,
        predictions,
        skipped_records: reader.skipped(),
    })
}

/// Write the summary table into `outdir` and return its path.
pub fn write_summary(summary: &Summary, outdir: &Path) -> Result<PathBuf> {
    let dest = outdir.join(SUMMARY_TABLE_NAME);
    fs::write(&dest, summary.to_table()).map_err(|e| PacificError::io(&dest, e))?;
    Ok(dest)
}

/// Score predictions against known labels. Reads missing from the truth
/// table are ignored.
pub fn evaluate_predictions(
    truth: &TruthTable,
    predictions: &[(String, VirusClass)],
) -> AccuracyOutcome {
    let (expected, predicted): (Vec<VirusClass>, Vec<VirusClass>) = predictions
        .iter()
        .filter_map(|(id, class)| truth.get(id).map(|t| (*t, *class)))
        .unzip();
    accuracy(&expected, &predicted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_only_reads_with_known_labels() {
        let truth: TruthTable = [
            ("r1".to_string(), VirusClass::SarsCov2),
            ("r2".to_string(), VirusClass::Human),
        ]
        .into_iter()
        .collect();
        let predictions = vec![
            ("r1".to_string(), VirusClass::SarsCov2),
            ("r2".to_string(), VirusClass::Influenza),
            ("r3".to_string(), VirusClass::Human),
        ];
        assert_eq!(
            evaluate_predictions(&truth, &predictions),
            AccuracyOutcome::Accuracy(0.5)
        );
        assert_eq!(evaluate_predictions(&truth, &[]), AccuracyOutcome::Empty);
    }

    #[test]
    fn discarded_message_mentions_skipped_records() {
        let mut aggregate = ChunkAggregate::new();
        aggregate.add_sequences(3);
        let mut results = ClassificationResults {
            aggregate,
            annotated_fasta: None,
            predictions: Vec::new(),
            skipped_records: 0,
        };
        let message = results.get_discarded_message();
        assert!(message.starts_with("From a total of 3 reads, 3 were discarded"));
        assert!(!message.contains("malformed"));

        results.skipped_records = 2;
        assert!(results
            .get_discarded_message()
            .ends_with("; 2 malformed input records were skipped"));
    }
}
