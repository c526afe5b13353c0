//src/model.rs

use std::fs;
use std::path::Path;

use rayon::prelude::*;
use serde::Deserialize;

use crate::error::{PacificError, Result};

/// Maps token sequences to per-class probability vectors.
pub trait Classifier: Send + Sync {
    /// Width of every prediction vector.
    fn num_classes(&self) -> usize;

    /// One probability vector per input sequence, in input order.
    fn predict(&self, batch: &[Vec<u32>]) -> Result<Vec<Vec<f32>>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Linear,
    Relu,
    Softmax,
}

/// A fully connected layer, `weights` is `[out][in]`.
#[derive(Debug, Clone, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
    pub activation: Activation,
}

impl DenseLayer {
    fn input_dim(&self) -> usize {
        self.weights.first().map_or(0, Vec::len)
    }

    fn output_dim(&self) -> usize {
        self.weights.len()
    }

    fn forward(&self, input: &[f32]) -> Vec<f32> {
        let mut out: Vec<f32> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>() + b)
            .collect();

        match self.activation {
            Activation::Linear => {}
            Activation::Relu => out.iter_mut().for_each(|v| *v = v.max(0.0)),
            Activation::Softmax => softmax_in_place(&mut out),
        }
        out
    }
}

fn softmax_in_place(values: &mut [f32]) {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f32;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    if sum > 0.0 {
        values.iter_mut().for_each(|v| *v /= sum);
    }
}

/// Serialized weights of the bundled classifier.
#[derive(Debug, Deserialize)]
struct ModelJson {
    embedding: Vec<Vec<f32>>,
    layers: Vec<DenseLayer>,
}

/// Embedding bag followed by dense layers.
///
/// Token id 0 is padding, ids outside the embedding table are ignored. The
/// read representation is the mean of the remaining embedding rows.
#[derive(Debug, Clone)]
pub struct SequenceClassifier {
    embedding: Vec<Vec<f32>>,
    layers: Vec<DenseLayer>,
}

impl SequenceClassifier {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| PacificError::io(path, e))?;
        let parsed: ModelJson =
            serde_json::from_str(&text).map_err(|e| PacificError::json(path, e))?;

        let model = Self::new(parsed.embedding, parsed.layers)?;
        log::info!(
            "Loaded model from {} (vocab {}, dim {}, {} layers, {} classes)",
            path.display(),
            model.embedding.len(),
            model.embedding_dim(),
            model.layers.len(),
            model.num_classes()
        );
        Ok(model)
    }

    /// Validates the layer shapes and builds the model.
    pub fn new(embedding: Vec<Vec<f32>>, layers: Vec<DenseLayer>) -> Result<Self> {
        let dim = embedding.first().map_or(0, Vec::len);
        if dim == 0 {
            return Err(PacificError::InvalidModel("empty embedding table".to_string()));
        }
        if let Some(bad) = embedding.iter().position(|row| row.len() != dim) {
            return Err(PacificError::InvalidModel(format!(
                "embedding row {} has {} values, expected {}",
                bad,
                embedding[bad].len(),
                dim
            )));
        }

        let mut expected_in = dim;
        for (i, layer) in layers.iter().enumerate() {
            if layer.output_dim() == 0 || layer.input_dim() != expected_in {
                return Err(PacificError::InvalidModel(format!(
                    "layer {} expects input {}, previous output is {}",
                    i,
                    layer.input_dim(),
                    expected_in
                )));
            }
            if layer.weights.iter().any(|row| row.len() != expected_in) {
                return Err(PacificError::InvalidModel(format!("layer {} has ragged weights", i)));
            }
            if layer.bias.len() != layer.output_dim() {
                return Err(PacificError::InvalidModel(format!(
                    "layer {} bias has {} values, expected {}",
                    i,
                    layer.bias.len(),
                    layer.output_dim()
                )));
            }
            expected_in = layer.output_dim();
        }

        match layers.last() {
            Some(last) if last.activation == Activation::Softmax => {}
            _ => {
                return Err(PacificError::InvalidModel(
                    "the last layer must use a softmax activation".to_string(),
                ))
            }
        }

        Ok(Self { embedding, layers })
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding.first().map_or(0, Vec::len)
    }

    /// Forward pass for a single token sequence.
    pub fn predict_one(&self, tokens: &[u32]) -> Vec<f32> {
        let dim = self.embedding_dim();
        let mut pooled = vec![0.0f32; dim];
        let mut n = 0usize;

        for &t in tokens {
            if t == 0 {
                continue;
            }
            if let Some(row) = self.embedding.get(t as usize) {
                pooled.iter_mut().zip(row).for_each(|(p, v)| *p += v);
                n += 1;
            }
        }
        if n > 0 {
            pooled.iter_mut().for_each(|p| *p /= n as f32);
        }

        self.layers
            .iter()
            .fold(pooled, |hidden, layer| layer.forward(&hidden))
    }
}

impl Classifier for SequenceClassifier {
    fn num_classes(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::output_dim)
    }

    fn predict(&self, batch: &[Vec<u32>]) -> Result<Vec<Vec<f32>>> {
        Ok(batch.par_iter().map(|tokens| self.predict_one(tokens)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_class_model() -> SequenceClassifier {
        // token 1 pushes towards class 0, token 2 towards class 1
        let embedding = vec![vec![0.0, 0.0], vec![4.0, 0.0], vec![0.0, 4.0]];
        let layers = vec![DenseLayer {
            weights: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            bias: vec![0.0, 0.0],
            activation: Activation::Softmax,
        }];
        SequenceClassifier::new(embedding, layers).unwrap()
    }

    #[test]
    fn predictions_are_probabilities_in_input_order() {
        let model = two_class_model();
        let out = model.predict(&[vec![1, 1, 0], vec![2, 2], vec![]]).unwrap();
        assert_eq!(out.len(), 3);
        for p in &out {
            assert_eq!(p.len(), 2);
            assert!((p.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        }
        assert!(out[0][0] > 0.9);
        assert!(out[1][1] > 0.9);
        // no usable tokens: softmax of the bias
        assert!((out[2][0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn unknown_token_ids_are_ignored() {
        let model = two_class_model();
        assert_eq!(model.predict_one(&[1, 99]), model.predict_one(&[1]));
    }

    #[test]
    fn relu_hidden_layer_feeds_softmax() {
        let embedding = vec![vec![0.0], vec![-1.0], vec![1.0]];
        let layers = vec![
            DenseLayer {
                weights: vec![vec![1.0], vec![-1.0]],
                bias: vec![0.0, 0.0],
                activation: Activation::Relu,
            },
            DenseLayer {
                weights: vec![vec![3.0, 0.0], vec![0.0, 3.0]],
                bias: vec![0.0, 0.0],
                activation: Activation::Softmax,
            },
        ];
        let model = SequenceClassifier::new(embedding, layers).unwrap();
        assert_eq!(model.num_classes(), 2);
        assert!(model.predict_one(&[2])[0] > 0.9);
        assert!(model.predict_one(&[1])[1] > 0.9);
    }

    #[test]
    fn rejects_bad_shapes() {
        let embedding = vec![vec![0.0, 0.0]];
        let wrong_input = vec![DenseLayer {
            weights: vec![vec![1.0, 0.0, 0.0]],
            bias: vec![0.0],
            activation: Activation::Softmax,
        }];
        assert!(matches!(
            SequenceClassifier::new(embedding.clone(), wrong_input),
            Err(PacificError::InvalidModel(_))
        ));

        let no_softmax = vec![DenseLayer {
            weights: vec![vec![1.0, 0.0]],
            bias: vec![0.0],
            activation: Activation::Linear,
        }];
        assert!(matches!(
            SequenceClassifier::new(embedding, no_softmax),
            Err(PacificError::InvalidModel(_))
        ));
    }
}
