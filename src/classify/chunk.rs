// src/classify/chunk.rs

use super::aggregate::ChunkAggregate;
use crate::error::{PacificError, Result};
use crate::kmer::{process_reads, READ_WINDOW};
use crate::labels::LabelEncoder;
use crate::model::Classifier;
use crate::tokenizer::Tokenize;
use crate::types::{AnnotatedRead, Read};

/// What one chunk contributes to the run.
#[derive(Debug, Default)]
pub struct ChunkPrediction {
    /// Counts and winning probabilities for this chunk only.
    pub aggregate: ChunkAggregate,
    /// Per-read results, filled only when requested.
    pub annotated: Vec<AnnotatedRead>,
}

/// Runs one chunk through filter, encoder, tokenizer, classifier and label
/// resolver.
///
/// Reads rejected by the filter are counted in `total_sequences` but never
/// reach the tokenizer.
pub fn predict_chunk(
    reads: &[Read],
    kmer_size: usize,
    tokenizer: &dyn Tokenize,
    classifier: &dyn Classifier,
    labels: &LabelEncoder,
    keep_annotations: bool,
) -> Result<ChunkPrediction> {
    let mut result = ChunkPrediction::default();
    result.aggregate.add_sequences(reads.len());

    let (kept, kmer_strings) = process_reads(reads, kmer_size);
    if kept.is_empty() {
        log::debug!("no read of this chunk passed the filter");
        return Ok(result);
    }

    let token_sequences = tokenizer.texts_to_sequences(&kmer_strings);
    drop(kmer_strings);

    let predictions = classifier.predict(&token_sequences)?;
    if predictions.len() != kept.len() {
        return Err(PacificError::ShapeMismatch {
            expected: kept.len(),
            actual: predictions.len(),
        });
    }

    if keep_annotations {
        result.annotated.reserve(kept.len());
    }

    for (read, probabilities) in kept.into_iter().zip(&predictions) {
        let Some(prediction) = labels.resolve(probabilities)? else {
            log::debug!("read {} has no finite prediction, dropping it", read.id);
            continue;
        };
        result.aggregate.record(prediction);

        if keep_annotations {
            result.annotated.push(AnnotatedRead {
                read_id: read.id.clone(),
                prediction,
                sequence: read.seq[..READ_WINDOW].to_string(),
            });
        }
    }

    Ok(result)
}
