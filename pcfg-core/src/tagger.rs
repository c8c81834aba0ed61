//! # Etiquetador de Palavras Desconhecidas
//!
//! Chamado pelo decodificador quando a palavra exata não está no léxico. As heurísticas
//! foram pensadas para o treebank hebraico transliterado (letras maiúsculas latinas):
//!
//! | Prioridade | Heurística          | Exemplo                         | Resultado                   |
//! |------------|---------------------|---------------------------------|-----------------------------|
//! | 1          | Sufixo flexional    | `SPRIM` → `SPR` ou `SPRH`       | regras lexicais do radical  |
//! | 2          | Letra fraca final   | `SPRI` → `SPR`                  | regras lexicais do radical  |
//! | 3          | Número              | `1948`                          | `CD`, custo 0               |
//! | 4          | Marca de estrangeira| `QUNCRT`                        | `NNP`, custo 0              |
//! | 5          | Suavização          | qualquer outra                  | todas as POS, com viés      |
//!
//! A heurística 2 só é tentada quando a palavra **não** termina em um sufixo da
//! heurística 1. Todo ramo produz pelo menos um candidato, então a célula inicial
//! do CKY nunca fica vazia.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::event::Symbol;
use crate::grammar::Grammar;
use crate::rule::Rule;

static CARDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("regex de números válida"));

/// Tabelas e parâmetros das heurísticas. Os valores padrão reproduzem o etiquetador
/// usado com o treebank hebraico.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnknownWordConfig {
    /// Pares finais de plural/possessivo/construto.
    pub suffixes: Vec<String>,
    /// Letra acrescentada ao radical na segunda tentativa do sufixo (feminino).
    pub feminine_marker: String,
    /// Letras fracas finais removíveis.
    pub weak_letters: Vec<String>,
    pub cardinal_tag: String,
    /// Letra que só aparece em transliterações de palavras estrangeiras/siglas.
    pub foreign_marker: String,
    pub proper_noun_tag: String,
    /// Categorias abertas, sempre favorecidas para palavras desconhecidas.
    pub open_class_tags: Vec<String>,
    /// Categorias verbais, favorecidas quando a palavra começa com um prefixo verbal.
    pub verb_tags: Vec<String>,
    pub verb_prefixes: Vec<String>,
    /// Multiplicador do custo das categorias favorecidas (0.5 = dobra a verossimilhança).
    pub bias_factor: f64,
}

impl Default for UnknownWordConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            suffixes: strings(&["IM", "WT", "IT", "TW", "TH", "TM", "TN", "KM", "KN"]),
            feminine_marker: "H".to_string(),
            weak_letters: strings(&["I", "H", "W"]),
            cardinal_tag: "CD".to_string(),
            foreign_marker: "U".to_string(),
            proper_noun_tag: "NNP".to_string(),
            open_class_tags: strings(&["NN", "NNP", "NNT", "JJ"]),
            verb_tags: strings(&["VB"]),
            verb_prefixes: strings(&["A", "I", "T", "N", "M"]),
            bias_factor: 0.5,
        }
    }
}

/// De onde veio um candidato de POS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagSource {
    Lexicon,
    Suffix,
    WeakLetter,
    Cardinal,
    Foreign,
    Smoothing,
}

/// Candidato de POS para uma palavra.
#[derive(Debug, Clone, PartialEq)]
pub struct Tagging {
    pub pos: Symbol,
    pub cost: f64,
    pub source: TagSource,
}

/// Etiquetador de palavras, ligado a uma gramática.
#[derive(Debug)]
pub struct UnknownWordTagger<'g> {
    grammar: &'g Grammar,
    config: UnknownWordConfig,
}

impl<'g> UnknownWordTagger<'g> {
    pub fn new(grammar: &'g Grammar, config: UnknownWordConfig) -> Self {
        Self { grammar, config }
    }

    pub fn config(&self) -> &UnknownWordConfig {
        &self.config
    }

    /// Candidatos para uma palavra: as regras do léxico quando a palavra é conhecida,
    /// senão as heurísticas em ordem de prioridade.
    pub fn tag(&self, word: &str) -> Vec<Tagging> {
        if let Some(rules) = self.grammar.lexicon().get(word) {
            return from_rules(rules, TagSource::Lexicon);
        }
        let taggings = self.tag_unknown(word);
        debug!(word, source = ?taggings.first().map(|t| t.source), "palavra desconhecida");
        taggings
    }

    fn tag_unknown(&self, word: &str) -> Vec<Tagging> {
        if let Some(taggings) = self.morphology(word) {
            return taggings;
        }
        if CARDINAL.is_match(word) {
            return vec![fixed(&self.config.cardinal_tag, TagSource::Cardinal)];
        }
        if !self.config.foreign_marker.is_empty() && word.contains(self.config.foreign_marker.as_str()) {
            return vec![fixed(&self.config.proper_noun_tag, TagSource::Foreign)];
        }
        self.smoothed(word)
    }

    /// Heurísticas 1 e 2: procura um radical conhecido removendo sufixos.
    fn morphology(&self, word: &str) -> Option<Vec<Tagging>> {
        let graphemes: Vec<&str> = word.graphemes(true).collect();
        let n = graphemes.len();

        if n > 2 {
            let suffix = graphemes[n - 2..].concat();
            if self.config.suffixes.contains(&suffix) {
                let stem = graphemes[..n - 2].concat();
                let feminine = format!("{stem}{}", self.config.feminine_marker);
                return [stem, feminine]
                    .iter()
                    .find_map(|candidate| self.grammar.lexicon().get(candidate.as_str()))
                    .map(|rules| from_rules(rules, TagSource::Suffix));
            }
        }

        if n > 1 && self.config.weak_letters.iter().any(|l| l == graphemes[n - 1]) {
            let stem = graphemes[..n - 1].concat();
            return self
                .grammar
                .lexicon()
                .get(stem.as_str())
                .map(|rules| from_rules(rules, TagSource::WeakLetter));
        }

        None
    }

    /// Heurística 5: toda a distribuição de suavização, com viés para as
    /// categorias mais prováveis entre palavras não vistas.
    fn smoothed(&self, word: &str) -> Vec<Tagging> {
        let first = word.graphemes(true).next().unwrap_or_default();
        let might_be_verb = self.config.verb_prefixes.iter().any(|p| p == first);

        self.grammar
            .smoothing()
            .iter()
            .map(|rule| {
                let pos = rule.label();
                let favoured = self.config.open_class_tags.iter().any(|t| t.as_str() == &**pos)
                    || (might_be_verb && self.config.verb_tags.iter().any(|t| t.as_str() == &**pos));
                let cost = if favoured {
                    rule.cost * self.config.bias_factor
                } else {
                    rule.cost
                };
                Tagging {
                    pos: pos.clone(),
                    cost,
                    source: TagSource::Smoothing,
                }
            })
            .collect()
    }
}

fn from_rules(rules: &[Rule], source: TagSource) -> Vec<Tagging> {
    rules
        .iter()
        .map(|r| Tagging {
            pos: r.label().clone(),
            cost: r.cost,
            source,
        })
        .collect()
}

fn fixed(pos: &str, source: TagSource) -> Tagging {
    Tagging {
        pos: pos.into(),
        cost: 0.0,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grammar() -> Grammar {
        let mut g = Grammar::new();
        g.insert_lexical("SPR", "NN", 0.4);
        g.insert_lexical("MLKH", "NN", 0.2);
        g.insert_lexical("MLKH", "VB", 1.6);
        g.insert_lexical("HLK", "VB", 0.1);
        g.insert_smoothing("NN", 1.0);
        g.insert_smoothing("VB", 2.0);
        g.insert_smoothing("IN", 3.0);
        g
    }

    fn tags(taggings: &[Tagging]) -> Vec<(&str, f64, TagSource)> {
        taggings.iter().map(|t| (&*t.pos, t.cost, t.source)).collect()
    }

    #[test]
    fn test_known_word_uses_lexicon() {
        let g = grammar();
        let tagger = UnknownWordTagger::new(&g, UnknownWordConfig::default());
        assert_eq!(tags(&tagger.tag("SPR")), vec![("NN", 0.4, TagSource::Lexicon)]);
    }

    #[test]
    fn test_suffix_stem_and_feminine_stem() {
        let g = grammar();
        let tagger = UnknownWordTagger::new(&g, UnknownWordConfig::default());
        assert_eq!(tags(&tagger.tag("SPRIM")), vec![("NN", 0.4, TagSource::Suffix)]);
        // MLK + H
        assert_eq!(
            tags(&tagger.tag("MLKWT")),
            vec![("NN", 0.2, TagSource::Suffix), ("VB", 1.6, TagSource::Suffix)]
        );
    }

    #[test]
    fn test_weak_letter() {
        let g = grammar();
        let tagger = UnknownWordTagger::new(&g, UnknownWordConfig::default());
        assert_eq!(tags(&tagger.tag("HLKW")), vec![("VB", 0.1, TagSource::WeakLetter)]);
    }

    #[test]
    fn test_suffix_match_blocks_weak_letter() {
        let mut g = grammar();
        // "GDRTH" termina em "TH": a letra fraca final "H" não é tentada, mesmo com
        // "GDRT" no léxico.
        g.insert_lexical("GDRT", "JJ", 0.3);
        let tagger = UnknownWordTagger::new(&g, UnknownWordConfig::default());
        let result = tagger.tag("GDRTH");
        assert!(result.iter().all(|t| t.source == TagSource::Smoothing));
    }

    #[test]
    fn test_cardinal_and_foreign() {
        let g = grammar();
        let tagger = UnknownWordTagger::new(&g, UnknownWordConfig::default());
        assert_eq!(tags(&tagger.tag("1948")), vec![("CD", 0.0, TagSource::Cardinal)]);
        assert_eq!(tags(&tagger.tag("QUNCRT")), vec![("NNP", 0.0, TagSource::Foreign)]);
    }

    #[test]
    fn test_only_ascii_digits_are_cardinals() {
        let g = grammar();
        let tagger = UnknownWordTagger::new(&g, UnknownWordConfig::default());
        let arabic_indic = tagger.tag("١٩٤٨");
        assert!(arabic_indic.iter().all(|t| t.source == TagSource::Smoothing));
        assert_eq!(arabic_indic.len(), 3);
    }

    #[test]
    fn test_smoothing_bias() {
        let g = grammar();
        let tagger = UnknownWordTagger::new(&g, UnknownWordConfig::default());

        // Começa com "M": prefixo verbal → NN e VB favorecidos.
        assert_eq!(
            tags(&tagger.tag("MXSB")),
            vec![
                ("NN", 0.5, TagSource::Smoothing),
                ("VB", 1.0, TagSource::Smoothing),
                ("IN", 3.0, TagSource::Smoothing),
            ]
        );
        // Sem prefixo verbal → só NN favorecido.
        assert_eq!(
            tags(&tagger.tag("GDR")),
            vec![
                ("NN", 0.5, TagSource::Smoothing),
                ("VB", 2.0, TagSource::Smoothing),
                ("IN", 3.0, TagSource::Smoothing),
            ]
        );
    }

    #[test]
    fn test_bias_can_be_disabled() {
        let g = grammar();
        let config = UnknownWordConfig {
            bias_factor: 1.0,
            ..UnknownWordConfig::default()
        };
        let tagger = UnknownWordTagger::new(&g, config);
        let costs: Vec<f64> = tagger.tag("GDR").iter().map(|t| t.cost).collect();
        assert_eq!(costs, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_every_branch_yields_candidates() {
        let g = grammar();
        let tagger = UnknownWordTagger::new(&g, UnknownWordConfig::default());
        for word in ["SPR", "SPRIM", "HLKW", "42", "QUNCRT", "ZZZ", "Z", "ZIM", "שלום"] {
            assert!(!tagger.tag(word).is_empty(), "{word}");
        }
    }
}
