//! # Configuração do Parser
//!
//! Todos os campos têm valor padrão (`#[serde(default)]`), então um JSON parcial
//! sobrescreve só o que traz:
//!
//! ```json
//! { "markovization": 1, "threads": 4, "unknown": { "bias_factor": 1.0 } }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::binarize::Markovization;
use crate::error::ConfigError;
use crate::tagger::UnknownWordConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Ordem `h` da markovização horizontal (`-1` = ilimitada).
    pub markovization: Markovization,
    /// Tamanho do pool de decodificação; `None` = metade dos núcleos disponíveis.
    pub threads: Option<usize>,
    pub start_symbol: String,
    /// Rótulo que envolve toda árvore produzida.
    pub top_symbol: String,
    /// POS usada na árvore plana quando não há parse.
    pub baseline_tag: String,
    /// Intervalo, em sentenças, entre mensagens de progresso.
    pub progress_every: usize,
    pub unknown: UnknownWordConfig,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            markovization: Markovization::Unbounded,
            threads: None,
            start_symbol: "S".to_string(),
            top_symbol: "TOP".to_string(),
            baseline_tag: "NN".to_string(),
            progress_every: 10,
            unknown: UnknownWordConfig::default(),
        }
    }
}

impl ParserConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: ParserConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.threads {
            Some(0) => Err(ConfigError::Threads(0)),
            _ => Ok(()),
        }
    }

    /// Threads efetivas do pool: o valor configurado, ou metade do paralelismo
    /// disponível (no mínimo 1).
    pub fn thread_count(&self) -> usize {
        self.threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| (n.get() / 2).max(1))
                .unwrap_or(1)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            ParserConfig::from_json_str(r#"{ "markovization": 2, "unknown": { "bias_factor": 1.0 } }"#)
                .unwrap();
        assert_eq!(config.markovization, Markovization::Order(2));
        assert_eq!(config.start_symbol, "S");
        assert_eq!(config.unknown.bias_factor, 1.0);
        assert_eq!(config.unknown.cardinal_tag, "CD");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            ParserConfig::from_json_str(r#"{ "markovization": -3 }"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            ParserConfig::from_json_str(r#"{ "threads": 0 }"#),
            Err(ConfigError::Threads(0))
        ));
    }

    #[test]
    fn test_thread_count() {
        let config = ParserConfig {
            threads: Some(3),
            ..ParserConfig::default()
        };
        assert_eq!(config.thread_count(), 3);
        assert!(ParserConfig::default().thread_count() >= 1);
    }
}
