//! # Treinamento: Leitura de uma PCFG a partir do Treebank
//!
//! Aprendizado supervisionado por frequência relativa, em uma única passada:
//!
//! 1. **Extração**: cada nó interno de cada árvore vira uma regra
//!    `categoria -> categorias dos filhos` (lexical se for pré-terminal, `top` se for a raiz).
//! 2. **Binarização**: regras com mais de dois filhos viram cadeias binárias
//!    (ver [`crate::binarize`]).
//! 3. **Contagem** de cada regra resultante.
//! 4. **Estimação**: custos `-ln` por lado esquerdo e distribuição de suavização
//!    para palavras desconhecidas.
//!
//! Árvores mal formadas são reportadas com `warn!` e puladas; o treino continua.

use serde::Serialize;
use tracing::{info, warn};

use crate::binarize::{Binarizer, Markovization};
use crate::error::TreeError;
use crate::event::Event;
use crate::grammar::Grammar;
use crate::rule::Rule;
use crate::tree::Node;

/// Estatísticas de uma execução de treino.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrainStats {
    pub trees: usize,
    pub skipped: usize,
    pub distinct_rules: usize,
    pub syntactic_rules: usize,
    pub lexical_entries: usize,
    pub binarized_productions: usize,
}

#[derive(Debug, Default)]
pub struct Trainer {
    binarizer: Binarizer,
}

impl Trainer {
    pub fn new(order: Markovization) -> Self {
        Self {
            binarizer: Binarizer::new(order),
        }
    }

    /// Treina a gramática com o treebank fornecido.
    ///
    /// # Exemplo
    /// ```rust
    /// use pcfg_core::binarize::Markovization;
    /// use pcfg_core::train::Trainer;
    /// use pcfg_core::tree::Node;
    ///
    /// let tree = Node::parse("(S (NP (DT the) (NN dog)) (VP (VB runs)))").unwrap();
    /// let (grammar, stats) = Trainer::new(Markovization::Unbounded).train(&[tree]);
    /// assert_eq!(stats.trees, 1);
    /// assert!(grammar.knows("dog"));
    /// ```
    pub fn train(&mut self, trees: &[Node]) -> (Grammar, TrainStats) {
        let mut grammar = Grammar::new();
        let mut stats = TrainStats::default();

        for (i, tree) in trees.iter().enumerate() {
            let rules = match extract_rules(tree) {
                Ok(rules) => rules,
                Err(e) => {
                    warn!(tree = i, error = %e, "árvore de treino mal formada, ignorada");
                    stats.skipped += 1;
                    continue;
                }
            };
            for rule in &rules {
                for binary in self.binarizer.binarize(rule) {
                    grammar.count(binary);
                }
            }
            stats.trees += 1;
        }

        grammar.estimate();

        stats.distinct_rules = grammar.counts().len();
        stats.syntactic_rules = grammar.syntactic_rules().len();
        stats.lexical_entries = grammar.lexicon().len();
        stats.binarized_productions = self.binarizer.memo_len();
        info!(
            h = %self.binarizer.order(),
            trees = stats.trees,
            skipped = stats.skipped,
            rules = stats.syntactic_rules,
            words = stats.lexical_entries,
            "gramática treinada"
        );

        (grammar, stats)
    }
}

/// Extrai as regras (ainda n-árias) de uma árvore, em pré-ordem.
pub fn extract_rules(tree: &Node) -> Result<Vec<Rule>, TreeError> {
    tree.validate()?;

    let mut rules = Vec::new();
    let mut stack = vec![(tree, true)];
    while let Some((node, is_root)) = stack.pop() {
        if node.is_leaf() {
            continue;
        }
        let rhs = Event::new(node.children.iter().map(|c| c.label.as_str().into()).collect());
        let mut rule = Rule::new(Event::single(node.label.as_str()), rhs);
        rule.lexical = node.is_pre_terminal();
        rule.top = is_root;
        rules.push(rule);

        stack.extend(node.children.iter().rev().map(|c| (c, false)));
    }
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn trees(texts: &[&str]) -> Vec<Node> {
        texts.iter().map(|t| Node::parse(t).unwrap()).collect()
    }

    #[test]
    fn test_extract_rules_flags() {
        let tree = Node::parse("(S (NP (DT the) (NN dog)) (VP (VB runs)))").unwrap();
        let rules = extract_rules(&tree).unwrap();
        let shown: Vec<String> = rules.iter().map(|r| r.to_string()).collect();
        assert_eq!(
            shown,
            vec!["S -> NP VP", "NP -> DT NN", "DT -> the", "NN -> dog", "VP -> VB", "VB -> runs"]
        );
        assert!(rules[0].top && !rules[0].lexical);
        assert!(rules[2].lexical && !rules[2].top);
        assert!(!rules[4].lexical);
    }

    #[test]
    fn test_probabilities_sum_to_one_per_lhs() {
        let corpus = trees(&[
            "(S (NP (DT the) (NN dog)) (VP (VB runs)))",
            "(S (NP (DT a) (JJ big) (JJ red) (NN cat)) (VP (VB sleeps) (NP (NN fish))))",
            "(S (NP (NN dogs)) (VP (VB bark)))",
            "(S (NP (DT the) (JJ old) (NN man)) (VP (VB sees) (NP (DT a) (NN dog)) (PP (IN in) (NP (NN town)))))",
        ]);
        for order in [Markovization::Unbounded, Markovization::Order(0), Markovization::Order(1), Markovization::Order(2)] {
            let (grammar, stats) = Trainer::new(order).train(&corpus);
            assert_eq!(stats.trees, 4);

            let mut sums: HashMap<String, f64> = HashMap::new();
            for rule in grammar.syntactic_rules() {
                assert!(rule.rhs.len() == 1 || rule.rhs.len() == 2);
                *sums.entry(rule.lhs.to_string()).or_insert(0.0) += rule.probability();
            }
            for (lhs, sum) in sums {
                assert!((sum - 1.0).abs() < 1e-9, "lhs {lhs} soma {sum} com h={order}");
            }
        }
    }

    #[test]
    fn test_repeated_productions_share_chain() {
        let corpus = trees(&[
            "(S (NP (DT a) (JJ b) (NN c)) (VP (VB d)))",
            "(S (NP (DT e) (JJ f) (NN g)) (VP (VB h)))",
        ]);
        let (grammar, stats) = Trainer::new(Markovization::Unbounded).train(&corpus);
        assert_eq!(stats.binarized_productions, 1);

        let chain_rule = Rule::syntactic("[DT]@NP", "JJ NN", 0.0);
        assert_eq!(grammar.counts().get(&chain_rule), Some(&2));
    }

    #[test]
    fn test_malformed_tree_is_skipped() {
        let good = Node::parse("(S (NP (NN dog)) (VP (VB runs)))").unwrap();
        let mixed = Node::with_children(
            "S",
            vec![Node::new("oops"), Node::parse("(VP (VB runs))").unwrap()],
        );
        let (grammar, stats) = Trainer::new(Markovization::Unbounded).train(&[mixed, good]);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.trees, 1);
        assert!(grammar.knows("dog"));
        assert!(!grammar.knows("oops"));
    }

    #[test]
    fn test_unknown_distribution_is_normalized() {
        let corpus = trees(&["(S (NP (DT the) (NN dog)) (VP (VB runs)))"]);
        let (grammar, _) = Trainer::new(Markovization::Unbounded).train(&corpus);
        let total: f64 = grammar.smoothing().iter().map(|r| r.probability()).sum();
        assert_eq!(grammar.smoothing().len(), 3);
        assert!((total - 1.0).abs() < 1e-12);
    }
}
