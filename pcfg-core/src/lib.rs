//! # pcfg-core: Indução de PCFG e Parsing CKY
//!
//! Este crate aprende uma gramática livre de contexto probabilística (PCFG) a partir de
//! um treebank e a usa para recuperar a árvore sintática mais provável de sentenças novas.
//!
//! ## Arquitetura do Sistema
//!
//! 1.  **Entrada**: Treebank no formato entre parênteses ([`corpus`], [`tree`]).
//! 2.  **Treinamento** ([`train`]): extração de regras, binarização com markovização
//!     horizontal ([`binarize`]) e estimação por frequência relativa ([`grammar`]).
//! 3.  **Indexação** ([`index`]): mapas símbolo → regras e identificadores densos.
//! 4.  **Decodificação** ([`cky`]): CKY de Viterbi sobre um [`chart`] triangular, com
//!     fechamento unário e o etiquetador de palavras desconhecidas ([`tagger`]).
//! 5.  **Lote** ([`pipeline`]): decodificação paralela com `rayon`, fallback para a
//!     árvore plana e desbinarização.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use pcfg_core::{BatchParser, Markovization, Node, ParserConfig, Trainer};
//!
//! let gold = Node::parse("(S (NP (DT the) (NN dog)) (VP (VB runs)))").unwrap();
//! let (grammar, _) = Trainer::new(Markovization::Unbounded).train(&[gold]);
//!
//! let config = ParserConfig { threads: Some(1), ..ParserConfig::default() };
//! let parser = BatchParser::new(&grammar, &config).unwrap();
//! let outcome = parser.parse_one(&["the", "dog", "runs"]);
//! assert_eq!(outcome.tree.to_string(), "(TOP (S (NP (DT the) (NN dog)) (VP (VB runs))))");
//! ```
//!
//! ## Unidades
//!
//! Todo custo é `-ln p`: somar custos equivale a multiplicar probabilidades, e a melhor
//! derivação é a de **menor** custo.

pub mod binarize;
pub mod chart;
pub mod cky;
pub mod config;
pub mod corpus;
pub mod error;
pub mod event;
pub mod grammar;
pub mod index;
pub mod pipeline;
pub mod rule;
pub mod tagger;
pub mod train;
pub mod tree;

pub use binarize::Markovization;
pub use cky::{Decoder, Derivation};
pub use config::ParserConfig;
pub use corpus::Treebank;
pub use error::{ConfigError, DecodeError, GrammarError, TreeError};
pub use grammar::Grammar;
pub use pipeline::{BatchParser, BatchSummary, ParseOutcome};
pub use train::Trainer;
pub use tree::Node;
