// src/classify/summary.rs

use std::fmt::Write as FmtWrite;

use super::aggregate::ChunkAggregate;
use crate::error::{PacificError, Result};
use crate::types::{SummaryRow, VirusClass};

/// Per-class proportions of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub rows: [SummaryRow; VirusClass::COUNT],
    pub threshold: f32,
    pub total_sequences: u64,
    pub processed_reads: u64,
    pub reads_above_threshold: u64,
}

impl Summary {
    /// Builds the table from the run aggregate.
    ///
    /// Fails with `NoProcessedReads` when no read received a label. When
    /// no read clears the threshold the above-threshold percentages are 0.
    pub fn from_aggregate(aggregate: &ChunkAggregate, threshold: f32) -> Result<Self> {
        let processed_reads = aggregate.processed_reads();
        if processed_reads == 0 {
            return Err(PacificError::NoProcessedReads);
        }

        let above: [u64; VirusClass::COUNT] =
            VirusClass::ALL.map(|class| aggregate.count_above(class, threshold));
        let reads_above_threshold: u64 = above.iter().sum();

        let rows = VirusClass::ALL.map(|class| {
            let reads = aggregate.count(class);
            let reads_above = above[class.index()];
            SummaryRow {
                class,
                reads,
                pct: percentage(reads, processed_reads),
                reads_above_threshold: reads_above,
                pct_above_threshold: percentage(reads_above, reads_above_threshold),
            }
        });

        Ok(Self {
            rows,
            threshold,
            total_sequences: aggregate.total_sequences(),
            processed_reads,
            reads_above_threshold,
        })
    }

    pub fn row(&self, class: VirusClass) -> &SummaryRow {
        &self.rows[class.index()]
    }

    /// Tab-delimited table with a header line, classes in `VirusClass::ALL` order.
    pub fn to_table(&self) -> String {
        let mut output = String::new();
        let t = self.threshold;
        writeln!(
            output,
            "Class\t# predicted reads\t# predicted reads (%)\t# predicted reads above {t}\t# predicted reads above {t} (%)"
        )
        .unwrap();

        for row in &self.rows {
            writeln!(
                output,
                "{}\t{}\t{:.4}\t{}\t{:.4}",
                row.class, row.reads, row.pct, row.reads_above_threshold, row.pct_above_threshold
            )
            .unwrap();
        }
        output
    }
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
