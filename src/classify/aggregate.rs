// src/classify/aggregate.rs

use crate::types::{Prediction, VirusClass};

/// Winning probabilities per class, accumulated over every chunk of a run.
///
/// Values are only ever appended. The accumulator is passed by value through
/// the chunk loop and handed to the summary at the end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkAggregate {
    probabilities: [Vec<f32>; VirusClass::COUNT],
    /// Input records seen, including the ones the filter rejected.
    total_sequences: u64,
}

impl ChunkAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sequences(&mut self, n: usize) {
        self.total_sequences += n as u64;
    }

    pub fn record(&mut self, prediction: Prediction) {
        self.probabilities[prediction.class.index()].push(prediction.probability);
    }

    /// Appends everything from `other`, keeping per-class order.
    pub fn merge(mut self, other: ChunkAggregate) -> Self {
        for (mine, theirs) in self.probabilities.iter_mut().zip(other.probabilities) {
            mine.extend(theirs);
        }
        self.total_sequences += other.total_sequences;
        self
    }

    pub fn probabilities(&self, class: VirusClass) -> &[f32] {
        &self.probabilities[class.index()]
    }

    pub fn count(&self, class: VirusClass) -> u64 {
        self.probabilities[class.index()].len() as u64
    }

    /// Reads that received a label.
    pub fn processed_reads(&self) -> u64 {
        self.probabilities.iter().map(|v| v.len() as u64).sum()
    }

    pub fn total_sequences(&self) -> u64 {
        self.total_sequences
    }

    /// Reads dropped by the filter or left without a label.
    pub fn discarded_reads(&self) -> u64 {
        self.total_sequences.saturating_sub(self.processed_reads())
    }

    /// Reads of `class` whose winning probability is strictly above `threshold`.
    pub fn count_above(&self, class: VirusClass, threshold: f32) -> u64 {
        self.probabilities(class)
            .iter()
            .filter(|&&p| p > threshold)
            .count() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pred(class: VirusClass, probability: f32) -> Prediction {
        Prediction { class, probability }
    }

    #[test]
    fn records_and_counts_per_class() {
        let mut agg = ChunkAggregate::new();
        agg.add_sequences(5);
        agg.record(pred(VirusClass::Human, 0.99));
        agg.record(pred(VirusClass::Human, 0.50));
        agg.record(pred(VirusClass::Rhinovirus, 0.96));

        assert_eq!(agg.count(VirusClass::Human), 2);
        assert_eq!(agg.count(VirusClass::SarsCov2), 0);
        assert_eq!(agg.processed_reads(), 3);
        assert_eq!(agg.discarded_reads(), 2);
        assert_eq!(agg.count_above(VirusClass::Human, 0.95), 1);
        assert_eq!(agg.probabilities(VirusClass::Human), &[0.99, 0.50]);
    }

    #[test]
    fn threshold_comparison_is_strict() {
        let mut agg = ChunkAggregate::new();
        agg.record(pred(VirusClass::Influenza, 0.95));
        assert_eq!(agg.count_above(VirusClass::Influenza, 0.95), 0);
    }

    #[test]
    fn merge_appends_in_order() {
        let mut a = ChunkAggregate::new();
        a.add_sequences(1);
        a.record(pred(VirusClass::SarsCov2, 0.1));
        let mut b = ChunkAggregate::new();
        b.add_sequences(2);
        b.record(pred(VirusClass::SarsCov2, 0.2));
        b.record(pred(VirusClass::Human, 0.3));

        let merged = a.merge(b);
        assert_eq!(merged.probabilities(VirusClass::SarsCov2), &[0.1, 0.2]);
        assert_eq!(merged.total_sequences(), 3);
        assert_eq!(merged.processed_reads(), 2);
    }
}
