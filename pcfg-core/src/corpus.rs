//! # Treebank
//!
//! Leitura de arquivos de árvores no formato entre parênteses. Uma árvore pode
//! ocupar várias linhas; o limite de cada item é dado pelo balanceamento dos
//! parênteses, não pelas quebras de linha:
//!
//! ```text
//! (TOP (S (NP (DT the) (NN dog))
//!         (VP (VB runs))))
//! (TOP (S (NP (NN fish)) (VP (VB swim))))
//! ```
//!
//! Itens mal formados geram `warn!` e são contados em [`Treebank::skipped`].

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::tree::Node;

#[derive(Debug, Clone, Default)]
pub struct Treebank {
    trees: Vec<Node>,
    skipped: usize,
}

impl Treebank {
    pub fn read(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let treebank = Self::parse(&text);
        info!(
            path = %path.display(),
            trees = treebank.len(),
            skipped = treebank.skipped,
            "treebank carregado"
        );
        Ok(treebank)
    }

    pub fn parse(text: &str) -> Self {
        let mut treebank = Treebank::default();
        for item in split_items(text) {
            match item {
                Item::Tree(position, source) => match Node::parse(source) {
                    Ok(tree) => treebank.trees.push(tree),
                    Err(e) => {
                        warn!(position, error = %e, "árvore ignorada");
                        treebank.skipped += 1;
                    }
                },
                Item::Stray(position) => {
                    warn!(position, "texto fora de uma árvore ignorado");
                    treebank.skipped += 1;
                }
            }
        }
        treebank
    }

    pub fn trees(&self) -> &[Node] {
        &self.trees
    }

    pub fn into_trees(self) -> Vec<Node> {
        self.trees
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Sentenças (sequências de folhas) de cada árvore, para decodificação.
    pub fn yields(&self) -> Vec<Vec<String>> {
        self.trees.iter().map(Node::yield_words).collect()
    }
}

enum Item<'a> {
    /// Posição (em bytes) e texto de uma árvore com parênteses balanceados.
    Tree(usize, &'a str),
    /// Texto fora de parênteses, ou árvore sem fechamento.
    Stray(usize),
}

fn split_items(text: &str) -> Vec<Item<'_>> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_stray = false;

    for (pos, c) in text.char_indices() {
        match c {
            '(' => {
                if depth == 0 {
                    start = pos;
                    in_stray = false;
                }
                depth += 1;
            }
            ')' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    items.push(Item::Tree(start, &text[start..=pos]));
                }
            }
            c if depth == 0 && !c.is_whitespace() => {
                if !in_stray {
                    items.push(Item::Stray(pos));
                    in_stray = true;
                }
            }
            _ => {}
        }
    }
    if depth > 0 {
        items.push(Item::Stray(start));
    }
    items
}
