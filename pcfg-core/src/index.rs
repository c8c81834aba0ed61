//! # Índice da Gramática para o CKY
//!
//! Estrutura derivada, construída uma vez por gramática e somente leitura depois:
//!
//! - símbolo → regras unárias cujo rhs é o símbolo;
//! - símbolo → regras binárias cujo **primeiro** filho é o símbolo;
//! - símbolo → regras binárias cujo **segundo** filho é o símbolo;
//! - regra ↔ identificador inteiro denso ([`RuleId`]).
//!
//! O laço interno do CKY trabalha apenas com `RuleId`s, sem comparar strings.

use std::collections::HashMap;

use crate::event::Symbol;
use crate::grammar::Grammar;
use crate::rule::Rule;

/// Identificador denso de uma regra sintática (posição no índice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(u32);

impl RuleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Default)]
pub struct GrammarIndex {
    rules: Vec<Rule>,
    ids: HashMap<Rule, RuleId>,
    unary: HashMap<Symbol, Vec<RuleId>>,
    by_left: HashMap<Symbol, Vec<RuleId>>,
    by_right: HashMap<Symbol, Vec<RuleId>>,
}

impl GrammarIndex {
    /// Percorre cada regra sintática uma vez, na ordem da gramática.
    pub fn build(grammar: &Grammar) -> Self {
        let mut index = GrammarIndex::default();
        for rule in grammar.syntactic_rules() {
            if index.ids.contains_key(rule) {
                continue;
            }
            let id = RuleId(index.rules.len() as u32);
            let rhs = rule.rhs.symbols();
            match rhs {
                [child] => index.unary.entry(child.clone()).or_default().push(id),
                [left, right] => {
                    index.by_left.entry(left.clone()).or_default().push(id);
                    index.by_right.entry(right.clone()).or_default().push(id);
                }
                _ => {}
            }
            index.ids.insert(rule.clone(), id);
            index.rules.push(rule.clone());
        }
        index
    }

    /// Regra correspondente ao identificador.
    ///
    /// # Panics
    /// Se o identificador não veio deste índice (invariante interno).
    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.index()]
    }

    pub fn id(&self, rule: &Rule) -> Option<RuleId> {
        self.ids.get(rule).copied()
    }

    pub fn unary_rules(&self, child: &str) -> &[RuleId] {
        self.unary.get(child).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn left_rules(&self, first: &str) -> &[RuleId] {
        self.by_left.get(first).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn right_rules(&self, second: &str) -> &[RuleId] {
        self.by_right.get(second).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar() -> Grammar {
        let mut g = Grammar::new();
        g.insert_syntactic(Rule::syntactic("S", "NP VP", 0.0));
        g.insert_syntactic(Rule::syntactic("NP", "DT NN", 0.0));
        g.insert_syntactic(Rule::syntactic("VP", "VB", 0.0));
        g.insert_syntactic(Rule::syntactic("VP", "VB NP", 0.0));
        g
    }

    #[test]
    fn test_dense_ids_in_grammar_order() {
        let index = GrammarIndex::build(&grammar());
        assert_eq!(index.len(), 4);
        for (i, rule) in grammar().syntactic_rules().iter().enumerate() {
            let id = index.id(rule).unwrap();
            assert_eq!(id.index(), i);
            assert_eq!(index.rule(id), rule);
        }
    }

    #[test]
    fn test_lookup_maps() {
        let index = GrammarIndex::build(&grammar());
        let shown = |ids: &[RuleId]| -> Vec<String> {
            ids.iter().map(|&id| index.rule(id).to_string()).collect()
        };
        assert_eq!(shown(index.unary_rules("VB")), vec!["VP -> VB"]);
        assert_eq!(shown(index.left_rules("VB")), vec!["VP -> VB NP"]);
        assert_eq!(shown(index.right_rules("NP")), vec!["VP -> VB NP"]);
        assert_eq!(shown(index.left_rules("NP")), vec!["S -> NP VP"]);
        assert!(index.unary_rules("XX").is_empty());
    }
}
