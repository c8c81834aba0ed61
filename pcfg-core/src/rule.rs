//! # Regras da Gramática
//!
//! Uma regra reescreve um símbolo (lado esquerdo) em uma sequência de símbolos
//! (lado direito) e carrega o seu **custo** `-ln P(rhs | lhs)`.
//!
//! Duas regras são iguais quando têm o mesmo `lhs` e o mesmo `rhs`; custo e flags
//! não entram na identidade. Isso permite usar a regra como chave de contagem antes
//! de o custo existir.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::event::{Event, Symbol};

#[derive(Clone, Debug)]
pub struct Rule {
    pub lhs: Event,
    pub rhs: Event,
    /// `-ln p` (logaritmo natural). Zero até a estimação.
    pub cost: f64,
    /// Regra de um pré-terminal: `POS -> palavra`.
    pub lexical: bool,
    /// Regra extraída da raiz de uma árvore.
    pub top: bool,
}

impl Rule {
    pub fn new(lhs: Event, rhs: Event) -> Self {
        Self {
            lhs,
            rhs,
            cost: 0.0,
            lexical: false,
            top: false,
        }
    }

    /// Regra sintática a partir de strings, ex: `Rule::syntactic("S", "NP VP", 0.0)`.
    pub fn syntactic(lhs: &str, rhs: &str, cost: f64) -> Self {
        Self {
            cost,
            ..Self::new(Event::parse(lhs), Event::parse(rhs))
        }
    }

    /// Regra lexical `pos -> word`.
    pub fn lexical(pos: &str, word: &str, cost: f64) -> Self {
        Self {
            cost,
            lexical: true,
            ..Self::new(Event::single(pos), Event::single(word))
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    /// Símbolo do lado esquerdo.
    pub fn label(&self) -> &Symbol {
        // O construtor de eventos nunca produz lhs vazio para regras extraídas.
        &self.lhs.symbols()[0]
    }

    pub fn is_unary(&self) -> bool {
        self.rhs.len() == 1
    }

    pub fn is_binary(&self) -> bool {
        self.rhs.len() == 2
    }

    /// Probabilidade correspondente ao custo.
    pub fn probability(&self) -> f64 {
        (-self.cost).exp()
    }
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.lhs == other.lhs && self.rhs == other.rhs
    }
}

impl Eq for Rule {}

impl Hash for Rule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lhs.hash(state);
        self.rhs.hash(state);
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.lhs, self.rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_ignores_cost_and_flags() {
        let a = Rule::syntactic("NP", "DT NN", 0.3);
        let mut b = Rule::syntactic("NP", "DT NN", 1.7);
        b.top = true;
        assert_eq!(a, b);
        assert_ne!(a, Rule::syntactic("NP", "NN DT", 0.3));
    }

    #[test]
    fn test_arity() {
        assert!(Rule::syntactic("VP", "VB", 0.0).is_unary());
        assert!(Rule::syntactic("S", "NP VP", 0.0).is_binary());
        assert!(Rule::lexical("DT", "the", 0.0).lexical);
    }

    #[test]
    fn test_probability_from_cost() {
        let r = Rule::syntactic("S", "NP VP", 2f64.ln());
        assert!((r.probability() - 0.5).abs() < 1e-12);
    }
}
