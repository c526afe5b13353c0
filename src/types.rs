//src/types.rs

use std::fmt;
use std::str::FromStr;

use crate::error::PacificError;

/// The fixed class vocabulary of the classifier.
/// Declaration order is the order rows appear in the summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VirusClass {
    SarsCov2,
    Coronaviridae,
    Influenza,
    Metapneumovirus,
    Rhinovirus,
    Human,
}

impl VirusClass {
    pub const COUNT: usize = 6;

    pub const ALL: [VirusClass; VirusClass::COUNT] = [
        VirusClass::SarsCov2,
        VirusClass::Coronaviridae,
        VirusClass::Influenza,
        VirusClass::Metapneumovirus,
        VirusClass::Rhinovirus,
        VirusClass::Human,
    ];

    /// Position of this class in `ALL`, used to index per-class arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Name used in the summary table and the annotated FASTA headers.
    pub fn report_name(self) -> &'static str {
        match self {
            VirusClass::SarsCov2 => "SARS-CoV-2",
            VirusClass::Coronaviridae => "Coronaviridae",
            VirusClass::Influenza => "Influenza",
            VirusClass::Metapneumovirus => "Metapneumovirus",
            VirusClass::Rhinovirus => "Rhinovirus",
            VirusClass::Human => "Human",
        }
    }
}

impl fmt::Display for VirusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.report_name())
    }
}

impl FromStr for VirusClass {
    type Err = PacificError;

    /// Accepts both the label-encoder spelling (`Sars_cov_2`) and the report
    /// spelling (`SARS-CoV-2`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "sarscov2" => Ok(VirusClass::SarsCov2),
            "coronaviridae" => Ok(VirusClass::Coronaviridae),
            "influenza" => Ok(VirusClass::Influenza),
            "metapneumovirus" => Ok(VirusClass::Metapneumovirus),
            "rhinovirus" => Ok(VirusClass::Rhinovirus),
            "human" => Ok(VirusClass::Human),
            _ => Err(PacificError::InvalidLabels(format!(
                "unknown class name '{}'",
                s
            ))),
        }
    }
}

/// A minimal representation of a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Read {
    pub id: String,
    pub header_line: String,
    pub seq: String,
}

/// A resolved label together with its winning probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub class: VirusClass,
    pub probability: f32,
}

/// One classified read as written to the annotated FASTA output.
#[derive(Debug, Clone)]
pub struct AnnotatedRead {
    pub read_id: String,
    pub prediction: Prediction,
    pub sequence: String, // truncated to the encoded window
}

impl AnnotatedRead {
    /// `>{id}:{probability}:{label}` header line, without the trailing newline.
    pub fn header(&self) -> String {
        format!(
            ">{}:{}:{}",
            self.read_id, self.prediction.probability, self.prediction.class
        )
    }
}

/// A structured representation of one row in the summary table.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub class: VirusClass,
    pub reads: u64,
    pub pct: f64,
    pub reads_above_threshold: u64,
    pub pct_above_threshold: f64,
}
