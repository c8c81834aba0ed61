//! # Binarização com Markovização Horizontal
//!
//! O CKY só combina constituintes de dois em dois, então toda produção com mais de
//! dois filhos é reescrita como uma cadeia de regras binárias com não-terminais novos.
//!
//! ## Exemplo (h = -1, histórico completo)
//!
//! ```text
//! NP -> DT JJ JJ NN
//!
//! NP          -> DT [DT]@NP
//! [DT]@NP     -> JJ [DT,JJ]@NP
//! [DT,JJ]@NP  -> JJ NN
//! ```
//!
//! O nome do não-terminal novo guarda a **janela de histórico** (os irmãos já
//! consumidos) e, depois do separador `@`, o pai original:
//!
//! | Ordem `h` | Janela                                        | Exemplo            |
//! |-----------|-----------------------------------------------|--------------------|
//! | `-1`      | todos os símbolos consumidos                  | `[DT,JJ]@NP`       |
//! | `>= 1`    | os últimos `h`, completados à esquerda com `-`| `[-,DT]@NP` (h=2)  |
//! | `0`       | nenhum (cadeia sem histórico)                 | `[]@NP`            |
//!
//! Quanto menor `h`, mais regras são compartilhadas entre produções diferentes
//! (gramática menor, menos contexto).

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GrammarError;
use crate::event::{Event, Symbol};
use crate::rule::Rule;

/// Separador entre a janela de histórico e o pai nos não-terminais de binarização.
pub const MARKOVIZATION_SYMBOL: &str = "@";

/// Preenchimento da janela nos primeiros passos quando `h >= 2`.
pub const HISTORY_PLACEHOLDER: &str = "-";

/// Ordem da markovização horizontal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Markovization {
    /// `h = -1`: histórico completo.
    Unbounded,
    /// `h >= 0`: janela deslizante dos últimos `h` símbolos.
    Order(usize),
}

impl Default for Markovization {
    fn default() -> Self {
        Markovization::Unbounded
    }
}

impl TryFrom<i32> for Markovization {
    type Error = GrammarError;

    fn try_from(h: i32) -> Result<Self, Self::Error> {
        match h {
            -1 => Ok(Markovization::Unbounded),
            h if h >= 0 => Ok(Markovization::Order(h as usize)),
            h => Err(GrammarError::InvalidMarkovization(h)),
        }
    }
}

impl From<Markovization> for i32 {
    fn from(order: Markovization) -> Self {
        match order {
            Markovization::Unbounded => -1,
            Markovization::Order(h) => h as i32,
        }
    }
}

impl fmt::Display for Markovization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", i32::from(*self))
    }
}

/// Janela de histórico de uma cadeia de binarização em andamento.
struct History {
    order: Markovization,
    window: Vec<Symbol>,
}

impl History {
    /// Janela depois de consumir o primeiro símbolo.
    fn start(order: Markovization, first: &Symbol) -> Self {
        let window = match order {
            Markovization::Unbounded => vec![first.clone()],
            Markovization::Order(0) => Vec::new(),
            Markovization::Order(h) => {
                let mut window: Vec<Symbol> = vec![Symbol::from(HISTORY_PLACEHOLDER); h - 1];
                window.push(first.clone());
                window
            }
        };
        Self { order, window }
    }

    fn consume(&mut self, symbol: &Symbol) {
        match self.order {
            Markovization::Unbounded => self.window.push(symbol.clone()),
            Markovization::Order(0) => {}
            Markovization::Order(_) => {
                self.window.remove(0);
                self.window.push(symbol.clone());
            }
        }
    }

    /// Nome do não-terminal: `[a,b]@PAI`.
    fn label(&self, parent: &str) -> Symbol {
        let window: Vec<&str> = self.window.iter().map(|s| s.as_ref()).collect();
        format!("[{}]{}{}", window.join(","), MARKOVIZATION_SYMBOL, parent).into()
    }
}

/// Binarizador com memo por regra de origem.
///
/// A mesma produção (mesmo `lhs` e mesmo `rhs`) vista em árvores diferentes sempre
/// gera exatamente a mesma cadeia, com os mesmos nomes de não-terminais.
#[derive(Debug, Default)]
pub struct Binarizer {
    order: Markovization,
    memo: HashMap<Rule, Vec<Rule>>,
}

impl Binarizer {
    pub fn new(order: Markovization) -> Self {
        Self {
            order,
            memo: HashMap::new(),
        }
    }

    pub fn order(&self) -> Markovization {
        self.order
    }

    /// Número de produções distintas já binarizadas.
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    /// Reescreve a regra como regras de aridade ≤ 2.
    ///
    /// Regras com até dois filhos voltam inalteradas. Para `k > 2` filhos a saída tem
    /// exatamente `k - 1` regras binárias; a primeira herda a flag `top` da origem e
    /// nenhuma é lexical.
    pub fn binarize(&mut self, rule: &Rule) -> Vec<Rule> {
        if rule.rhs.len() <= 2 {
            return vec![rule.clone()];
        }
        if let Some(chain) = self.memo.get(rule) {
            let mut chain = chain.clone();
            chain[0].top = rule.top;
            return chain;
        }

        let chain = self.chain(rule);
        self.memo.insert(rule.clone(), chain.clone());
        chain
    }

    fn chain(&self, rule: &Rule) -> Vec<Rule> {
        let symbols = rule.rhs.symbols();
        let k = symbols.len();
        let parent = rule.lhs.as_str();

        let mut history = History::start(self.order, &symbols[0]);
        let mut current = history.label(parent);
        let mut chain = Vec::with_capacity(k - 1);

        let mut first = Rule::new(
            rule.lhs.clone(),
            Event::new(vec![symbols[0].clone(), current.clone()]),
        );
        first.top = rule.top;
        chain.push(first);

        // Elos intermediários: N_j -> s_{j+1} N_{j+1}
        for symbol in &symbols[1..k - 2] {
            history.consume(symbol);
            let next = history.label(parent);
            chain.push(Rule::new(
                Event::single(current),
                Event::new(vec![symbol.clone(), next.clone()]),
            ));
            current = next;
        }

        // Último elo: N_{k-2} -> s_{k-1} s_k
        chain.push(Rule::new(
            Event::single(current),
            Event::new(vec![symbols[k - 2].clone(), symbols[k - 1].clone()]),
        ));
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rhs_strings(chain: &[Rule]) -> Vec<String> {
        chain.iter().map(|r| r.to_string()).collect()
    }

    #[test]
    fn test_short_rules_untouched() {
        let mut b = Binarizer::new(Markovization::Unbounded);
        for rhs in ["VB", "NP VP"] {
            let rule = Rule::syntactic("S", rhs, 0.0);
            assert_eq!(b.binarize(&rule), vec![rule.clone()]);
        }
        assert_eq!(b.memo_len(), 0);
    }

    #[test]
    fn test_unbounded_history() {
        let mut b = Binarizer::new(Markovization::Unbounded);
        let chain = b.binarize(&Rule::syntactic("NP", "DT JJ JJ NN", 0.0));
        assert_eq!(
            rhs_strings(&chain),
            vec![
                "NP -> DT [DT]@NP",
                "[DT]@NP -> JJ [DT,JJ]@NP",
                "[DT,JJ]@NP -> JJ NN",
            ]
        );
    }

    #[test]
    fn test_sliding_window_order_two() {
        let mut b = Binarizer::new(Markovization::Order(2));
        let chain = b.binarize(&Rule::syntactic("S", "A B C D E", 0.0));
        assert_eq!(
            rhs_strings(&chain),
            vec![
                "S -> A [-,A]@S",
                "[-,A]@S -> B [A,B]@S",
                "[A,B]@S -> C [B,C]@S",
                "[B,C]@S -> D E",
            ]
        );
    }

    #[test]
    fn test_order_one_and_zero() {
        let mut one = Binarizer::new(Markovization::Order(1));
        let chain = one.binarize(&Rule::syntactic("VP", "VB NP PP", 0.0));
        assert_eq!(rhs_strings(&chain), vec!["VP -> VB [VB]@VP", "[VB]@VP -> NP PP"]);

        let mut zero = Binarizer::new(Markovization::Order(0));
        let chain = zero.binarize(&Rule::syntactic("VP", "VB NP PP ADV", 0.0));
        assert_eq!(
            rhs_strings(&chain),
            vec!["VP -> VB []@VP", "[]@VP -> NP []@VP", "[]@VP -> PP ADV"]
        );
    }

    #[test]
    fn test_chain_shape_and_flags() {
        let mut b = Binarizer::new(Markovization::Order(1));
        for k in 3..8 {
            let rhs: Vec<String> = (0..k).map(|i| format!("X{i}")).collect();
            let mut rule = Rule::syntactic("P", &rhs.join(" "), 0.0);
            rule.top = true;
            let chain = b.binarize(&rule);
            assert_eq!(chain.len(), k - 1);
            assert!(chain.iter().all(|r| r.is_binary() && !r.lexical));
            assert!(chain[0].top);
            assert!(chain[1..].iter().all(|r| !r.top));
        }
    }

    #[test]
    fn test_memo_is_byte_identical() {
        let mut b = Binarizer::new(Markovization::Order(2));
        let rule = Rule::syntactic("NP", "DT JJ NN NN", 0.0);
        let first = b.binarize(&rule);
        let again = b.binarize(&Rule::syntactic("NP", "DT JJ NN NN", 0.0));
        assert_eq!(b.memo_len(), 1);
        for (a, c) in first.iter().zip(&again) {
            assert_eq!(a.lhs.as_str(), c.lhs.as_str());
            assert_eq!(a.rhs.as_str(), c.rhs.as_str());
        }

        // Um binarizador novo produz os mesmos nomes.
        let fresh = Binarizer::new(Markovization::Order(2)).binarize(&rule);
        assert_eq!(rhs_strings(&first), rhs_strings(&fresh));
    }

    #[test]
    fn test_markovization_from_i32() {
        assert_eq!(Markovization::try_from(-1).unwrap(), Markovization::Unbounded);
        assert_eq!(Markovization::try_from(3).unwrap(), Markovization::Order(3));
        assert!(Markovization::try_from(-2).is_err());
    }
}
