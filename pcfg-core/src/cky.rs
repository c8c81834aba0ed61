//! # Decodificador CKY (Viterbi)
//!
//! Programação dinâmica bottom-up sobre spans de comprimento crescente:
//!
//! ```text
//! semente [i,i+1) ──► fechamento unário ──► índices da célula
//!                                                │
//! combinação [i,j), todo k em (i,j) ──► fechamento unário ──► índices
//!                                                │
//!                         extração do símbolo inicial em [0,n)
//! ```
//!
//! ## Interseção indexada
//!
//! Para cada ponto de corte `k`, a célula `[i,k)` expõe `regra → filho esquerdo` e a
//! célula `[k,j)` expõe `regra → filho direito`. Percorremos o **menor** dos dois
//! mapas e sondamos o outro por [`RuleId`], em vez de testar todos os pares de rótulos:
//!
//! $$ custo(A_{ij}) = custo(A \to B\,C) + custo(B_{ik}) + custo(C_{kj}) $$
//!
//! ## Fechamento unário
//!
//! Em ondas: a primeira parte das transições da célula antes do fechamento, cada onda
//! seguinte só dos rótulos que melhoraram na anterior, sempre pela melhor transição
//! atual de cada rótulo. Cada regra unária dispara no máximo uma vez por fechamento,
//! o que garante término mesmo com ciclos (`X -> X`, `A -> B -> A`).

use std::collections::HashSet;

use indexmap::IndexSet;
use tracing::debug;

use crate::chart::{Chart, Transition, TransitionId};
use crate::config::ParserConfig;
use crate::error::{DecodeError, GrammarError};
use crate::event::Symbol;
use crate::grammar::Grammar;
use crate::index::{GrammarIndex, RuleId};
use crate::tagger::UnknownWordTagger;
use crate::tree::Node;

/// Melhor derivação de uma sentença.
#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    /// Árvore enraizada no símbolo de topo (ainda binarizada).
    pub tree: Node,
    /// Custo total (`-ln` da probabilidade da derivação).
    pub cost: f64,
}

/// Decodificador ligado a uma gramática. Imutável depois de construído, pode ser
/// compartilhado entre threads por referência.
#[derive(Debug)]
pub struct Decoder<'g> {
    index: GrammarIndex,
    tagger: UnknownWordTagger<'g>,
    start: Symbol,
    top: String,
}

impl<'g> Decoder<'g> {
    /// Indexa a gramática. Falha se não houver distribuição para palavras desconhecidas.
    pub fn new(grammar: &'g Grammar, config: &ParserConfig) -> Result<Self, GrammarError> {
        if grammar.smoothing().is_empty() {
            return Err(GrammarError::EmptySmoothing);
        }
        let index = GrammarIndex::build(grammar);
        debug!(rules = index.len(), words = grammar.lexicon().len(), "gramática indexada");
        Ok(Self {
            index,
            tagger: UnknownWordTagger::new(grammar, config.unknown.clone()),
            start: config.start_symbol.as_str().into(),
            top: config.top_symbol.clone(),
        })
    }

    pub fn index(&self) -> &GrammarIndex {
        &self.index
    }

    /// Melhor derivação de `words` a partir do símbolo inicial.
    pub fn decode<S: AsRef<str>>(&self, words: &[S]) -> Result<Derivation, DecodeError> {
        let n = words.len();
        let no_parse = || DecodeError::NoParse {
            start: self.start.to_string(),
            words: n,
        };
        if n == 0 {
            return Err(no_parse());
        }

        let mut chart = Chart::new(n);
        for (i, word) in words.iter().enumerate() {
            self.seed(&mut chart, i, word.as_ref());
        }
        for len in 2..=n {
            for i in 0..=n - len {
                self.combine(&mut chart, i, i + len);
            }
        }

        let root = chart
            .cell(0, n)
            .and_then(|cell| cell.get(&self.start))
            .ok_or_else(no_parse)?;
        Ok(Derivation {
            tree: Node::with_children(self.top.as_str(), vec![chart.build_tree(root)]),
            cost: chart.transition(root).cost(),
        })
    }

    fn seed(&self, chart: &mut Chart, i: usize, word: &str) {
        let terminal = chart.alloc(Transition::Terminal { word: word.into() });
        for tagging in self.tagger.tag(word) {
            chart.offer(
                i,
                i + 1,
                Transition::Unary {
                    label: tagging.pos,
                    cost: tagging.cost,
                    child: terminal,
                },
            );
        }
        self.finish_cell(chart, i, i + 1);
    }

    fn combine(&self, chart: &mut Chart, i: usize, j: usize) {
        for k in i + 1..j {
            for (rule_id, left, right) in self.matches(chart, i, k, j) {
                let rule = self.index.rule(rule_id);
                debug_assert!(rule.is_binary(), "regra não binária no índice: {rule}");
                let cost = rule.cost + chart.transition(left).cost() + chart.transition(right).cost();
                chart.offer(
                    i,
                    j,
                    Transition::Binary {
                        label: rule.label().clone(),
                        cost,
                        left,
                        right,
                    },
                );
            }
        }
        self.finish_cell(chart, i, j);
    }

    /// Regras binárias aplicáveis no corte `k`: interseção dos índices de `[i,k)` e `[k,j)`.
    fn matches(&self, chart: &Chart, i: usize, k: usize, j: usize) -> Vec<(RuleId, TransitionId, TransitionId)> {
        let (Some(left), Some(right)) = (chart.cell(i, k), chart.cell(k, j)) else {
            return Vec::new();
        };
        let (by_left, by_right) = (left.left_index(), right.right_index());

        if by_left.len() <= by_right.len() {
            by_left
                .iter()
                .filter_map(|(rule, &l)| by_right.get(rule).map(|&r| (*rule, l, r)))
                .collect()
        } else {
            by_right
                .iter()
                .filter_map(|(rule, &r)| by_left.get(rule).map(|&l| (*rule, l, r)))
                .collect()
        }
    }

    fn finish_cell(&self, chart: &mut Chart, i: usize, j: usize) {
        if chart.cell(i, j).is_none() {
            return;
        }
        self.close_unary(chart, i, j);
        chart.cell_mut(i, j).build_indexes(&self.index);
    }

    fn close_unary(&self, chart: &mut Chart, i: usize, j: usize) {
        let mut fired: HashSet<RuleId> = HashSet::new();
        let mut wave: Vec<Symbol> = match chart.cell(i, j) {
            Some(cell) => cell.entries().map(|(label, _)| label.clone()).collect(),
            None => return,
        };

        while !wave.is_empty() {
            // Uma entrada por rótulo: a onda seguinte parte da melhor transição atual.
            let mut next: IndexSet<Symbol> = IndexSet::new();
            for label in wave {
                let Some(child) = chart.cell(i, j).and_then(|cell| cell.get(&label)) else {
                    continue;
                };
                for &rule_id in self.index.unary_rules(&label) {
                    if !fired.insert(rule_id) {
                        continue;
                    }
                    let rule = self.index.rule(rule_id);
                    let cost = rule.cost + chart.transition(child).cost();
                    let offered = chart.offer(
                        i,
                        j,
                        Transition::Unary {
                            label: rule.label().clone(),
                            cost,
                            child,
                        },
                    );
                    if offered.is_some() {
                        next.insert(rule.label().clone());
                    }
                }
            }
            wave = next.into_iter().collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binarize::Markovization;
    use crate::rule::Rule;
    use crate::train::Trainer;
    use crate::tree::debinarize;

    fn scenario() -> Grammar {
        let mut g = Grammar::new();
        g.insert_syntactic(Rule::syntactic("S", "NP VP", 0.0));
        g.insert_syntactic(Rule::syntactic("NP", "DT NN", 0.0));
        g.insert_syntactic(Rule::syntactic("VP", "VB", 0.0));
        g.insert_lexical("the", "DT", 0.0);
        g.insert_lexical("dog", "NN", 0.0);
        g.insert_lexical("runs", "VB", 0.0);
        g.rebuild_smoothing();
        g
    }

    #[test]
    fn test_known_sentence() {
        let g = scenario();
        let decoder = Decoder::new(&g, &ParserConfig::default()).unwrap();
        let d = decoder.decode(&["the", "dog", "runs"]).unwrap();
        assert_eq!(d.tree.to_string(), "(TOP (S (NP (DT the) (NN dog)) (VP (VB runs))))");
        assert_eq!(d.cost, 0.0);
    }

    #[test]
    fn test_unknown_word_still_parses() {
        let g = scenario();
        let decoder = Decoder::new(&g, &ParserConfig::default()).unwrap();
        let d = decoder.decode(&["a", "dog", "runs"]).unwrap();
        assert_eq!(d.tree.children[0].label, "S");
        assert_eq!(d.tree.yield_words(), vec!["a", "dog", "runs"]);
        // "a" só encaixa como DT, que vem da suavização com custo ln 3.
        assert!((d.cost - 3f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_unary_cycles_terminate() {
        let mut g = Grammar::new();
        g.insert_syntactic(Rule::syntactic("X", "X", 0.1));
        g.insert_syntactic(Rule::syntactic("A", "A", 0.1));
        g.insert_syntactic(Rule::syntactic("B", "A", 0.1));
        g.insert_syntactic(Rule::syntactic("A", "B", 0.1));
        g.insert_syntactic(Rule::syntactic("S", "B", 0.1));
        g.insert_lexical("w", "A", 0.0);
        g.insert_lexical("x", "X", 0.0);
        g.rebuild_smoothing();

        let decoder = Decoder::new(&g, &ParserConfig::default()).unwrap();
        let d = decoder.decode(&["w"]).unwrap();
        assert_eq!(d.tree.to_string(), "(TOP (S (B (A w))))");
        assert!((d.cost - 0.2).abs() < 1e-12);

        let err = decoder.decode(&["x"]).unwrap_err();
        assert_eq!(err, DecodeError::NoParse { start: "S".into(), words: 1 });
    }

    #[test]
    fn test_unary_closure_uses_best_transition_per_label() {
        let mut g = Grammar::new();
        g.insert_syntactic(Rule::syntactic("X", "Y", 1.0));
        g.insert_syntactic(Rule::syntactic("X", "Z", 0.1));
        g.insert_syntactic(Rule::syntactic("S", "X", 0.5));
        g.insert_lexical("w", "Y", 0.0);
        g.insert_lexical("w", "Z", 0.0);
        g.rebuild_smoothing();

        // X é alcançado duas vezes na mesma onda; S deve partir do X mais barato.
        let decoder = Decoder::new(&g, &ParserConfig::default()).unwrap();
        let d = decoder.decode(&["w"]).unwrap();
        assert_eq!(d.tree.to_string(), "(TOP (S (X (Z w))))");
        assert!((d.cost - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_no_parse() {
        let g = scenario();
        let decoder = Decoder::new(&g, &ParserConfig::default()).unwrap();
        assert!(matches!(decoder.decode(&["dog"]), Err(DecodeError::NoParse { words: 1, .. })));
        assert!(matches!(decoder.decode::<&str>(&[]), Err(DecodeError::NoParse { words: 0, .. })));
    }

    #[test]
    fn test_empty_smoothing_is_rejected() {
        let mut g = Grammar::new();
        g.insert_syntactic(Rule::syntactic("S", "NP VP", 0.0));
        assert!(matches!(
            Decoder::new(&g, &ParserConfig::default()),
            Err(GrammarError::EmptySmoothing)
        ));
    }

    #[test]
    fn test_binarized_parse_debinarizes_to_gold() {
        let gold = "(S (NP (DT the) (JJ big) (JJ red) (NN dog)) (VP (VB runs) (ADV fast)))";
        let tree = Node::parse(gold).unwrap();
        for h in [Markovization::Unbounded, Markovization::Order(1), Markovization::Order(2)] {
            let (g, _) = Trainer::new(h).train(std::slice::from_ref(&tree));
            let decoder = Decoder::new(&g, &ParserConfig::default()).unwrap();
            let d = decoder.decode(&tree.yield_words()).unwrap();
            assert_eq!(debinarize(&d.tree).to_string(), format!("(TOP {gold})"), "h={h}");
        }
    }

    #[test]
    fn test_decoding_is_deterministic() {
        let corpus: Vec<Node> = [
            "(S (NP (DT the) (NN dog)) (VP (VB sees) (NP (DT a) (NN cat))))",
            "(S (NP (DT a) (NN cat)) (VP (VB sees) (NP (NN fish)) (PP (IN in) (NP (DT the) (NN sea)))))",
            "(S (NP (NN fish)) (VP (VB swim)))",
        ]
        .iter()
        .map(|t| Node::parse(t).unwrap())
        .collect();
        let (g, _) = Trainer::new(Markovization::Order(1)).train(&corpus);
        let decoder = Decoder::new(&g, &ParserConfig::default()).unwrap();

        let words = ["the", "cat", "sees", "a", "dog", "in", "the", "river"];
        let first = decoder.decode(&words).unwrap();
        for _ in 0..5 {
            assert_eq!(decoder.decode(&words).unwrap(), first);
        }
        assert_eq!(first.tree.yield_words(), words);
    }
}
