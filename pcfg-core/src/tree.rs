//! # Árvores de Constituintes
//!
//! Container simples usado tanto para as árvores do treebank (entrada do treino)
//! quanto para as árvores produzidas pelo decodificador.
//!
//! ## Formato entre parênteses
//!
//! ```text
//! (TOP (S (NP (DT the) (NN dog)) (VP (VB runs))))
//! ```
//!
//! - Um nó **folha** não tem filhos (é uma palavra).
//! - Um nó **pré-terminal** tem exatamente um filho, e esse filho é folha.
//! - Todo o resto com filhos é um nó **interno** sintático.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::binarize::MARKOVIZATION_SYMBOL;
use crate::error::TreeError;

/// Tokens do formato entre parênteses: `(`, `)` ou um átomo sem espaços.
static BRACKET_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(|\)|[^\s()]+").expect("regex de tokens válida"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub label: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(label: impl Into<String>, children: Vec<Node>) -> Self {
        Self {
            label: label.into(),
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_pre_terminal(&self) -> bool {
        self.children.len() == 1 && self.children[0].is_leaf()
    }

    /// Lê uma árvore no formato entre parênteses.
    ///
    /// Aceita também o invólucro sem rótulo usado por alguns treebanks: `( (S ...) )`.
    pub fn parse(text: &str) -> Result<Node, TreeError> {
        let tokens: Vec<(usize, &str)> = BRACKET_TOKEN
            .find_iter(text)
            .map(|m| (m.start(), m.as_str()))
            .collect();
        if tokens.is_empty() {
            return Err(TreeError::Empty);
        }

        // Pilha de nós abertos; o rótulo vazio marca o invólucro anônimo.
        let mut stack: Vec<Node> = Vec::new();
        let mut root: Option<Node> = None;
        let mut i = 0;

        while i < tokens.len() {
            let (position, token) = tokens[i];
            if root.is_some() {
                return Err(TreeError::TrailingInput { position });
            }
            match token {
                "(" => {
                    let label = match tokens.get(i + 1) {
                        Some((_, next)) if *next != "(" && *next != ")" => {
                            i += 1;
                            next.to_string()
                        }
                        Some((_, "(")) => String::new(),
                        _ => return Err(TreeError::MissingLabel { position }),
                    };
                    stack.push(Node::new(label));
                }
                ")" => {
                    let node = stack.pop().ok_or(TreeError::Unbalanced { position })?;
                    let node = if node.label.is_empty() {
                        // `( (S ...) )` → a própria subárvore.
                        match <[Node; 1]>::try_from(node.children) {
                            Ok([only]) => only,
                            Err(_) => return Err(TreeError::MissingLabel { position }),
                        }
                    } else if node.children.is_empty() {
                        return Err(TreeError::NoChildren { label: node.label });
                    } else {
                        node
                    };
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => root = Some(node),
                    }
                }
                word => match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::new(word)),
                    None => return Err(TreeError::MissingLabel { position }),
                },
            }
            i += 1;
        }

        if !stack.is_empty() {
            return Err(TreeError::Unbalanced { position: text.len() });
        }
        root.ok_or(TreeError::Empty)
    }

    /// Verifica a forma da árvore para o treino: nenhum nó entre parênteses sem filhos,
    /// nenhum nó misturando palavras e constituintes, pré-terminais com uma palavra só.
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.is_leaf() {
            return Err(TreeError::NoChildren {
                label: self.label.clone(),
            });
        }
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            let leaves = node.children.iter().filter(|c| c.is_leaf()).count();
            if leaves > 0 && leaves < node.children.len() {
                return Err(TreeError::MixedChildren {
                    label: node.label.clone(),
                });
            }
            if leaves > 1 {
                return Err(TreeError::WidePreTerminal {
                    label: node.label.clone(),
                    count: leaves,
                });
            }
            stack.extend(node.children.iter().filter(|c| !c.is_leaf()));
        }
        Ok(())
    }

    /// Sequência de folhas da esquerda para a direita.
    pub fn yield_words(&self) -> Vec<String> {
        let mut words = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.is_leaf() {
                words.push(node.label.clone());
            } else {
                stack.extend(node.children.iter().rev());
            }
        }
        words
    }

    /// Árvore plana de fallback: `(TOP (NN w1) (NN w2) ...)`.
    pub fn baseline<S: AsRef<str>>(words: &[S], tag: &str, top: &str) -> Node {
        let children = words
            .iter()
            .map(|w| Node::with_children(tag, vec![Node::new(w.as_ref())]))
            .collect();
        Node::with_children(top, children)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_leaf() {
            return f.write_str(&self.label);
        }
        write!(f, "({}", self.label)?;
        for child in &self.children {
            write!(f, " {child}")?;
        }
        f.write_str(")")
    }
}

/// Desfaz a binarização: todo nó cujo rótulo contém o separador de markovização
/// é removido e os seus filhos sobem para o pai, restaurando as produções n-árias.
pub fn debinarize(node: &Node) -> Node {
    if node.is_leaf() {
        return Node::new(node.label.clone());
    }
    let mut restored = Node::new(node.label.clone());
    for child in &node.children {
        let child = debinarize(child);
        if !child.is_leaf() && child.label.contains(MARKOVIZATION_SYMBOL) {
            restored.children.extend(child.children);
        } else {
            restored.children.push(child);
        }
    }
    restored
}
