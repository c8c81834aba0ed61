//! # Pipeline de Parsing em Lote
//!
//! Decodifica um conjunto de sentenças em paralelo, com um pool `rayon` de tamanho fixo:
//!
//! 1. cada sentença é decodificada de forma independente (chart próprio);
//! 2. sem parse → árvore plana `(TOP (NN w1) (NN w2) ...)`, sem afetar as demais;
//! 3. a árvore é desbinarizada ainda no worker;
//! 4. os resultados voltam **na ordem de entrada**.
//!
//! A gramática e o decodificador são só leitura e compartilhados por referência.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cky::Decoder;
use crate::config::ParserConfig;
use crate::error::ConfigError;
use crate::grammar::Grammar;
use crate::tree::{debinarize, Node};

/// Resultado de uma sentença.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseOutcome {
    /// Árvore desbinarizada, enraizada no símbolo de topo.
    pub tree: Node,
    /// Custo da derivação; `None` quando a árvore é a baseline.
    pub cost: Option<f64>,
    pub fallback: bool,
}

/// Resumo de uma execução em lote.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub sentences: usize,
    pub parsed: usize,
    pub fallbacks: usize,
    pub threads: usize,
    pub elapsed_ms: u128,
}

pub struct BatchParser<'g> {
    decoder: Decoder<'g>,
    pool: ThreadPool,
    threads: usize,
    top_symbol: String,
    baseline_tag: String,
    progress_every: usize,
}

impl<'g> BatchParser<'g> {
    pub fn new(grammar: &'g Grammar, config: &ParserConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let decoder = Decoder::new(grammar, config)?;
        let threads = config.thread_count();
        let pool = ThreadPoolBuilder::new().num_threads(threads).build()?;
        Ok(Self {
            decoder,
            pool,
            threads,
            top_symbol: config.top_symbol.clone(),
            baseline_tag: config.baseline_tag.clone(),
            progress_every: config.progress_every,
        })
    }

    pub fn decoder(&self) -> &Decoder<'g> {
        &self.decoder
    }

    /// Decodifica uma sentença, recorrendo à árvore baseline quando não há parse.
    pub fn parse_one<S: AsRef<str>>(&self, words: &[S]) -> ParseOutcome {
        match self.decoder.decode(words) {
            Ok(derivation) => ParseOutcome {
                tree: debinarize(&derivation.tree),
                cost: Some(derivation.cost),
                fallback: false,
            },
            Err(e) => {
                debug!(error = %e, "usando árvore baseline");
                ParseOutcome {
                    tree: Node::baseline(words, &self.baseline_tag, &self.top_symbol),
                    cost: None,
                    fallback: true,
                }
            }
        }
    }

    /// Decodifica todas as sentenças no pool, preservando a ordem de entrada.
    pub fn parse_all<S: AsRef<str> + Sync>(&self, sentences: &[Vec<S>]) -> (Vec<ParseOutcome>, BatchSummary) {
        let started = Instant::now();
        let total = sentences.len();
        let done = AtomicUsize::new(0);

        let outcomes: Vec<ParseOutcome> = self.pool.install(|| {
            sentences
                .par_iter()
                .map(|words| {
                    let outcome = self.parse_one(words);
                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    if self.progress_every > 0 && finished % self.progress_every == 0 {
                        info!(finished, total, "sentenças decodificadas");
                    }
                    outcome
                })
                .collect()
        });

        let fallbacks = outcomes.iter().filter(|o| o.fallback).count();
        let summary = BatchSummary {
            sentences: total,
            parsed: total - fallbacks,
            fallbacks,
            threads: self.threads,
            elapsed_ms: started.elapsed().as_millis(),
        };
        info!(
            sentences = summary.sentences,
            fallbacks = summary.fallbacks,
            threads = summary.threads,
            elapsed_ms = summary.elapsed_ms as u64,
            "lote concluído"
        );
        (outcomes, summary)
    }
}
