//src/labels.rs

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use ahash::AHashMap;
use serde::Deserialize;

use crate::error::{PacificError, Result};
use crate::types::{Prediction, VirusClass};

#[derive(Debug, Deserialize)]
struct LabelEncoderJson {
    classes: Vec<String>,
}

/// Class vocabulary of the fitted label binarizer, in model output order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<VirusClass>,
}

impl LabelEncoder {
    /// Loads `{"classes": [...]}`.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| PacificError::io(path, e))?;
        let parsed: LabelEncoderJson =
            serde_json::from_str(&text).map_err(|e| PacificError::json(path, e))?;

        let classes = parsed
            .classes
            .iter()
            .map(|name| name.parse::<VirusClass>())
            .collect::<Result<Vec<_>>>()?;
        let encoder = Self::new(classes)?;
        log::info!("Loaded label encoder from {} ({} classes)", path.display(), encoder.len());
        Ok(encoder)
    }

    pub fn new(classes: Vec<VirusClass>) -> Result<Self> {
        if classes.is_empty() {
            return Err(PacificError::InvalidLabels("no classes".to_string()));
        }
        for (i, class) in classes.iter().enumerate() {
            if classes[..i].contains(class) {
                return Err(PacificError::InvalidLabels(format!(
                    "class '{}' listed twice",
                    class
                )));
            }
        }
        Ok(Self { classes })
    }

    pub fn classes(&self) -> &[VirusClass] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Picks the most probable class (first one on ties).
    ///
    /// Non-finite probabilities never win; a vector without any finite value
    /// resolves to `None`.
    pub fn resolve(&self, probabilities: &[f32]) -> Result<Option<Prediction>> {
        if probabilities.len() != self.classes.len() {
            return Err(PacificError::ShapeMismatch {
                expected: self.classes.len(),
                actual: probabilities.len(),
            });
        }

        let mut best: Option<(usize, f32)> = None;
        for (i, &p) in probabilities.iter().enumerate() {
            if !p.is_finite() {
                continue;
            }
            if best.map_or(true, |(_, bp)| p > bp) {
                best = Some((i, p));
            }
        }

        Ok(best.map(|(i, probability)| Prediction {
            class: self.classes[i],
            probability,
        }))
    }
}

/// Result of comparing predicted labels against known labels.
#[derive(Debug, Clone, PartialEq)]
pub enum AccuracyOutcome {
    /// Fraction of positions where both agree.
    Accuracy(f64),
    ShapeMismatch { labels: usize, predictions: usize },
    /// Nothing to compare.
    Empty,
}

pub fn accuracy(labels: &[VirusClass], predictions: &[VirusClass]) -> AccuracyOutcome {
    if labels.len() != predictions.len() {
        return AccuracyOutcome::ShapeMismatch {
            labels: labels.len(),
            predictions: predictions.len(),
        };
    }
    if labels.is_empty() {
        return AccuracyOutcome::Empty;
    }

    let correct = labels
        .iter()
        .zip(predictions)
        .filter(|(l, p)| l == p)
        .count();
    AccuracyOutcome::Accuracy(correct as f64 / labels.len() as f64)
}

/// Known class per read id, as `read_id<TAB>class` lines.
pub type TruthTable = AHashMap<String, VirusClass>;

pub fn read_truth_table<P: AsRef<Path>>(path: P) -> Result<TruthTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PacificError::io(path, e))?;
    let reader = BufReader::new(file);

    let mut table = TruthTable::new();
    for line_result in reader.lines() {
        let line = line_result.map_err(|e| PacificError::io(path, e))?;
        let parts: Vec<&str> = line.split('\t').collect();

        // Skip blank and malformed lines
        if parts.len() < 2 || parts[0].trim().is_empty() {
            continue;
        }
        match parts[1].parse::<VirusClass>() {
            Ok(class) => {
                table.insert(parts[0].trim().to_string(), class);
            }
            Err(_) => log::debug!("skipping truth line with unknown class: {}", line),
        }
    }
    Ok(table)
}
