//src/tokenizer.rs

use std::fs;
use std::path::Path;

use ahash::AHashMap;
use serde::Deserialize;

use crate::error::{PacificError, Result};

/// Maps k-mer strings to the integer sequences the classifier consumes.
pub trait Tokenize: Send + Sync {
    fn texts_to_sequences(&self, texts: &[String]) -> Vec<Vec<u32>>;
}

/// Top level of the JSON written by a Keras `Tokenizer.to_json()`.
#[derive(Debug, Deserialize)]
struct TokenizerJson {
    #[serde(default)]
    class_name: Option<String>,
    config: TokenizerConfig,
}

#[derive(Debug, Deserialize)]
struct TokenizerConfig {
    #[serde(default)]
    num_words: Option<usize>,
    #[serde(default)]
    filters: Option<String>,
    #[serde(default = "default_lower")]
    lower: bool,
    #[serde(default = "default_split")]
    split: String,
    #[serde(default)]
    char_level: bool,
    #[serde(default)]
    oov_token: Option<String>,
    /// Keras stores the vocabulary as a JSON document inside a string.
    word_index: String,
}

fn default_lower() -> bool {
    true
}

fn default_split() -> String {
    " ".to_string()
}

/// Word-level tokenizer with the lookup rules of the Keras tokenizer the
/// models were trained with.
#[derive(Debug, Clone)]
pub struct KmerTokenizer {
    word_index: AHashMap<String, u32>,
    num_words: Option<usize>,
    filters: Vec<char>,
    lower: bool,
    split: String,
    oov_index: Option<u32>,
}

impl KmerTokenizer {
    /// Loads a tokenizer exported with `tokenizer.to_json()`.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| PacificError::io(path, e))?;
        let parsed: TokenizerJson =
            serde_json::from_str(&text).map_err(|e| PacificError::json(path, e))?;

        if let Some(name) = &parsed.class_name {
            if name != "Tokenizer" {
                return Err(PacificError::InvalidTokenizer(format!(
                    "expected class_name 'Tokenizer', found '{}'",
                    name
                )));
            }
        }

        let word_index: AHashMap<String, u32> = serde_json::from_str(&parsed.config.word_index)
            .map_err(|e| PacificError::json(path, e))?;

        let tokenizer = Self::from_parts(parsed.config, word_index)?;
        log::info!(
            "Loaded tokenizer from {} ({} words)",
            path.display(),
            tokenizer.vocab_len()
        );
        Ok(tokenizer)
    }

    fn from_parts(config: TokenizerConfig, word_index: AHashMap<String, u32>) -> Result<Self> {
        if config.char_level {
            return Err(PacificError::InvalidTokenizer(
                "character-level tokenizers are not supported".to_string(),
            ));
        }
        if config.split.is_empty() {
            return Err(PacificError::InvalidTokenizer("empty split string".to_string()));
        }
        if word_index.is_empty() {
            return Err(PacificError::InvalidTokenizer("empty word_index".to_string()));
        }

        let oov_index = match &config.oov_token {
            Some(token) => Some(*word_index.get(token).ok_or_else(|| {
                PacificError::InvalidTokenizer(format!(
                    "oov_token '{}' missing from word_index",
                    token
                ))
            })?),
            None => None,
        };

        Ok(Self {
            word_index,
            num_words: config.num_words,
            filters: config.filters.unwrap_or_default().chars().collect(),
            lower: config.lower,
            split: config.split,
            oov_index,
        })
    }

    /// Builds a tokenizer straight from a vocabulary, with Keras defaults.
    pub fn from_word_index(word_index: AHashMap<String, u32>) -> Result<Self> {
        Self::from_parts(
            TokenizerConfig {
                num_words: None,
                filters: None,
                lower: true,
                split: default_split(),
                char_level: false,
                oov_token: None,
                word_index: String::new(),
            },
            word_index,
        )
    }

    pub fn vocab_len(&self) -> usize {
        self.word_index.len()
    }

    /// Converts one text into token ids.
    pub fn text_to_sequence(&self, text: &str) -> Vec<u32> {
        let mut normalized = if self.lower {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        if !self.filters.is_empty() {
            normalized = normalized
                .chars()
                .map(|c| if self.filters.contains(&c) { ' ' } else { c })
                .collect();
            if self.split != " " {
                normalized = normalized.replace(' ', &self.split);
            }
        }

        normalized
            .split(self.split.as_str())
            .filter(|w| !w.is_empty())
            .filter_map(|word| match self.word_index.get(word) {
                Some(&idx) if self.within_limit(idx) => Some(idx),
                _ => self.oov_index,
            })
            .collect()
    }

    fn within_limit(&self, idx: u32) -> bool {
        self.num_words.map_or(true, |n| (idx as usize) < n)
    }
}

impl Tokenize for KmerTokenizer {
    fn texts_to_sequences(&self, texts: &[String]) -> Vec<Vec<u32>> {
        texts.iter().map(|t| self.text_to_sequence(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vocab() -> AHashMap<String, u32> {
        [("aaa", 1u32), ("ccc", 2), ("ggg", 3), ("<oov>", 4)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn lowercases_and_drops_unknown_words() {
        let tok = KmerTokenizer::from_word_index(vocab()).unwrap();
        assert_eq!(tok.text_to_sequence("AAA CCC TTT GGG"), vec![1, 2, 3]);
    }

    #[test]
    fn loads_keras_export_with_oov_and_num_words() {
        let json = r##"{
            "class_name": "Tokenizer",
            "config": {
                "num_words": 3,
                "filters": "!\"#$%&()*+,-./:;<=>?@[\\]^_`{|}~\t\n",
                "lower": true,
                "split": " ",
                "char_level": false,
                "oov_token": "<oov>",
                "document_count": 2,
                "word_index": "{\"aaa\": 1, \"ccc\": 2, \"ggg\": 3, \"<oov>\": 4}"
            }
        }"##;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let tok = KmerTokenizer::from_json_file(file.path()).unwrap();
        assert_eq!(tok.vocab_len(), 4);
        // "ggg" is beyond num_words, "ttt" is unknown: both become the OOV id
        assert_eq!(
            tok.texts_to_sequences(&["AAA GGG TTT CCC".to_string()]),
            vec![vec![1, 4, 4, 2]]
        );
    }

    #[test]
    fn rejects_missing_oov_entry() {
        let json = r#"{"config": {"oov_token": "<x>", "word_index": "{\"aaa\": 1}"}}"#;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let err = KmerTokenizer::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, PacificError::InvalidTokenizer(_)));
    }
}
