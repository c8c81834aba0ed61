//! # Gramática Probabilística (PCFG)
//!
//! A gramática é o produto do treino e fica **imutável** depois disso. Ela guarda:
//!
//! 1. **Contagens**: quantas vezes cada regra (após a binarização) apareceu no corpus.
//! 2. **Regras sintáticas**: regras com custo `-ln P(rhs | lhs)`, aridade 1 ou 2.
//! 3. **Léxico**: palavra → regras lexicais `POS -> palavra`.
//! 4. **Suavização**: distribuição sobre POS para palavras fora do vocabulário,
//!    publicada sob a chave reservada [`UNKNOWN_WORD`].
//!
//! ## Formato texto
//!
//! ```text
//! .gram   custo<TAB>lhs<TAB>rhs
//! .lex    palavra<TAB>POS custo POS custo ...
//! ```

use std::collections::HashMap;

use indexmap::map::MutableKeys;
use indexmap::IndexMap;
use tracing::warn;

use crate::error::GrammarError;
use crate::event::{Event, Symbol};
use crate::rule::Rule;

/// Chave reservada do léxico que guarda a distribuição de suavização.
pub const UNKNOWN_WORD: &str = "UNKNOWN";

/// PCFG compilada a partir de um treebank (ou carregada de arquivos `.gram`/`.lex`).
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    /// Contagem de ocorrências por identidade de regra, em ordem de primeira aparição.
    counts: IndexMap<Rule, u64>,
    /// Regras não-lexicais com custo.
    syntactic: Vec<Rule>,
    /// Palavra → regras lexicais com custo.
    lexicon: IndexMap<String, Vec<Rule>>,
    /// Regras sintéticas `POS -> UNKNOWN`.
    smoothing: Vec<Rule>,
}

impl Grammar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra uma ocorrência da regra. As flags `lexical`/`top` são acumuladas com "ou".
    pub fn count(&mut self, rule: Rule) {
        match self.counts.get_full_mut2(&rule) {
            Some((_, stored, count)) => {
                stored.lexical |= rule.lexical;
                stored.top |= rule.top;
                *count += 1;
            }
            None => {
                self.counts.insert(rule, 1);
            }
        }
    }

    /// Converte as contagens em custos por frequência relativa:
    ///
    /// $$ custo(A \to \beta) = -\ln \frac{c(A \to \beta)}{\sum_\gamma c(A \to \gamma)} $$
    ///
    /// e deriva a distribuição de suavização a partir do conjunto de regras lexicais.
    pub fn estimate(&mut self) {
        let mut lhs_totals: HashMap<Event, u64> = HashMap::new();
        for (rule, count) in &self.counts {
            *lhs_totals.entry(rule.lhs.clone()).or_insert(0) += count;
        }

        self.syntactic.clear();
        self.lexicon.clear();
        for (rule, &count) in &self.counts {
            let total = lhs_totals[&rule.lhs] as f64;
            let rule = rule.clone().with_cost(cost_of(count as f64 / total));
            if rule.lexical {
                self.lexicon
                    .entry(rule.rhs.as_str().to_string())
                    .or_default()
                    .push(rule);
            } else {
                self.syntactic.push(rule);
            }
        }

        self.smoothing = smoothing_distribution(self.lexicon.values().flatten());
    }

    /// Insere uma regra sintática com custo já definido.
    pub fn insert_syntactic(&mut self, rule: Rule) {
        self.syntactic.push(rule);
    }

    /// Insere uma regra lexical `pos -> word` com custo já definido.
    pub fn insert_lexical(&mut self, word: &str, pos: &str, cost: f64) {
        self.lexicon
            .entry(word.to_string())
            .or_default()
            .push(Rule::lexical(pos, word, cost));
    }

    /// Insere uma entrada da distribuição de suavização.
    pub fn insert_smoothing(&mut self, pos: &str, cost: f64) {
        self.smoothing.push(Rule::lexical(pos, UNKNOWN_WORD, cost));
    }

    /// Recalcula a suavização a partir do léxico atual.
    pub fn rebuild_smoothing(&mut self) {
        self.smoothing = smoothing_distribution(self.lexicon.values().flatten());
    }

    pub fn syntactic_rules(&self) -> &[Rule] {
        &self.syntactic
    }

    pub fn lexicon(&self) -> &IndexMap<String, Vec<Rule>> {
        &self.lexicon
    }

    /// Regras lexicais da palavra; a chave [`UNKNOWN_WORD`] devolve a suavização.
    pub fn lexical_rules(&self, word: &str) -> Option<&[Rule]> {
        match self.lexicon.get(word) {
            Some(rules) => Some(rules),
            None if word == UNKNOWN_WORD && !self.smoothing.is_empty() => Some(&self.smoothing),
            None => None,
        }
    }

    pub fn knows(&self, word: &str) -> bool {
        self.lexicon.contains_key(word)
    }

    pub fn smoothing(&self) -> &[Rule] {
        &self.smoothing
    }

    pub fn counts(&self) -> &IndexMap<Rule, u64> {
        &self.counts
    }

    /// Linhas do arquivo `.gram`: `custo<TAB>lhs<TAB>rhs`.
    pub fn write_rules(&self) -> Vec<String> {
        self.syntactic
            .iter()
            .map(|r| format!("{}\t{}\t{}", r.cost, r.lhs, r.rhs))
            .collect()
    }

    /// Linhas do arquivo `.lex`: `palavra<TAB>POS custo POS custo ...`,
    /// terminando com a linha da suavização sob [`UNKNOWN_WORD`].
    ///
    /// Uma palavra do corpus igual a [`UNKNOWN_WORD`] não é gravada: a chave é reservada
    /// à suavização no formato texto.
    pub fn write_lexicon(&self) -> Vec<String> {
        let entries = self
            .lexicon
            .iter()
            .filter(|(word, _)| {
                let reserved = word.as_str() == UNKNOWN_WORD;
                if reserved {
                    warn!(word = UNKNOWN_WORD, "palavra com a chave reservada omitida do léxico");
                }
                !reserved
            })
            .map(|(word, rules)| (word.as_str(), rules.as_slice()));
        let smoothing = (!self.smoothing.is_empty()).then_some((UNKNOWN_WORD, self.smoothing.as_slice()));

        entries
            .chain(smoothing)
            .map(|(word, rules)| {
                let pairs: String = rules.iter().map(|r| format!("{} {} ", r.lhs, r.cost)).collect();
                format!("{word}\t{pairs}")
            })
            .collect()
    }

    /// Carrega uma gramática a partir do conteúdo dos arquivos `.gram` e `.lex`.
    ///
    /// Linhas em branco são ignoradas. A linha [`UNKNOWN_WORD`] do léxico vira a
    /// distribuição de suavização.
    pub fn from_text(rules: &str, lexicon: &str) -> Result<Self, GrammarError> {
        let mut grammar = Grammar::new();

        for (n, line) in rules.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let [cost, lhs, rhs] = fields[..] else {
                return Err(malformed(n, "esperado custo<TAB>lhs<TAB>rhs"));
            };
            let cost = parse_cost(n, cost)?;
            let (lhs, rhs) = (Event::parse(lhs), Event::parse(rhs));
            if lhs.len() != 1 || rhs.is_empty() || rhs.len() > 2 {
                return Err(malformed(n, "regra precisa de um lhs e de 1 ou 2 símbolos no rhs"));
            }
            grammar.insert_syntactic(Rule::new(lhs, rhs).with_cost(cost));
        }

        for (n, line) in lexicon.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let Some((word, entries)) = line.split_once('\t') else {
                return Err(malformed(n, "esperado palavra<TAB>(POS custo)+"));
            };
            let tokens: Vec<&str> = entries.split_whitespace().collect();
            if tokens.is_empty() || tokens.len() % 2 != 0 {
                return Err(malformed(n, "pares POS/custo incompletos"));
            }
            for pair in tokens.chunks(2) {
                let cost = parse_cost(n, pair[1])?;
                if word == UNKNOWN_WORD {
                    grammar.insert_smoothing(pair[0], cost);
                } else {
                    grammar.insert_lexical(word, pair[0], cost);
                }
            }
        }

        Ok(grammar)
    }
}

/// Distribuição `POS -> UNKNOWN` a partir de um conjunto de regras lexicais distintas:
/// cada par (POS, palavra) conta uma vez, então a distribuição reflete quantos tipos de
/// palavra cada POS abriga.
fn smoothing_distribution<'a>(lexical: impl Iterator<Item = &'a Rule>) -> Vec<Rule> {
    let mut per_pos: IndexMap<Symbol, u64> = IndexMap::new();
    let mut total = 0u64;
    for rule in lexical.filter(|r| r.rhs.len() == 1) {
        *per_pos.entry(rule.label().clone()).or_insert(0) += 1;
        total += 1;
    }
    per_pos
        .into_iter()
        .map(|(pos, count)| Rule::lexical(&pos, UNKNOWN_WORD, cost_of(count as f64 / total as f64)))
        .collect()
}

/// `-ln p`, sem o `-0` de `p = 1`.
fn cost_of(p: f64) -> f64 {
    0.0 - p.ln()
}

fn parse_cost(line: usize, text: &str) -> Result<f64, GrammarError> {
    text.trim()
        .parse::<f64>()
        .map_err(|e| malformed(line, &format!("custo inválido '{text}': {e}")))
}

fn malformed(line: usize, reason: &str) -> GrammarError {
    GrammarError::MalformedLine {
        line: line + 1,
        reason: reason.to_string(),
    }
}
