//! # Tipos de Erro
//!
//! Cada estágio do sistema tem o seu próprio enum de erros:
//!
//! | Enum            | Origem                                   | Política                         |
//! |-----------------|------------------------------------------|----------------------------------|
//! | [`TreeError`]   | Leitura/validação de árvores do treebank | item descartado, treino continua |
//! | [`GrammarError`]| Gramática inconsistente ou mal formada   | fatal antes de decodificar       |
//! | [`DecodeError`] | Chart sem derivação para o símbolo inicial | recuperado com a árvore baseline |
//! | [`ConfigError`] | Configuração inválida ou pool indisponível | fatal na inicialização         |

use thiserror::Error;

/// Erros de leitura ou de forma de uma árvore de treinamento.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    #[error("árvore vazia")]
    Empty,

    #[error("parênteses desbalanceados na posição {position}")]
    Unbalanced { position: usize },

    #[error("nó sem rótulo na posição {position}")]
    MissingLabel { position: usize },

    /// Nó interno sem filhos, ex: `(NP )`.
    #[error("nó interno '{label}' sem filhos")]
    NoChildren { label: String },

    /// Nó que mistura palavras e constituintes, ex: `(NP the (NN dog))`.
    #[error("nó '{label}' mistura terminais e constituintes")]
    MixedChildren { label: String },

    /// Pré-terminal com mais de uma palavra, ex: `(NN big dog)`.
    #[error("pré-terminal '{label}' com {count} palavras")]
    WidePreTerminal { label: String, count: usize },

    #[error("conteúdo extra após a árvore na posição {position}")]
    TrailingInput { position: usize },
}

/// Erros de construção, carga ou uso da gramática.
#[derive(Debug, Error)]
pub enum GrammarError {
    /// A ordem de markovização horizontal só admite `-1` ou valores `>= 0`.
    #[error("ordem de markovização inválida: {0} (use -1 ou >= 0)")]
    InvalidMarkovization(i32),

    /// O corpus não tinha regras lexicais, logo não há distribuição para palavras desconhecidas.
    #[error("distribuição de suavização vazia: o corpus não possui regras lexicais")]
    EmptySmoothing,

    #[error("linha {line} mal formada: {reason}")]
    MalformedLine { line: usize, reason: String },

    #[error("erro de E/S: {0}")]
    Io(#[from] std::io::Error),
}

/// Erros de decodificação de uma sentença.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// Nenhuma transição com o símbolo inicial cobre a sentença inteira.
    #[error("sem parse: nenhuma derivação de '{start}' cobre as {words} palavras")]
    NoParse { start: String, words: usize },
}

/// Erros de carga da configuração.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("erro de E/S ao ler a configuração: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON de configuração inválido: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error("número de threads inválido: {0}")]
    Threads(usize),

    #[error("falha ao criar o pool de decodificação: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
