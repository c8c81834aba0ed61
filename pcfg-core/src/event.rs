//! # Símbolos e Eventos
//!
//! Um **símbolo** é um rótulo opaco (categoria não-terminal ou palavra). Um **evento**
//! é uma sequência ordenada e não vazia de símbolos: o lado esquerdo ou direito de uma regra.
//!
//! A identidade de um evento é a sua forma textual com os símbolos separados por espaço.
//! Como eventos são comparados e usados como chave de hash o tempo todo (contagens,
//! memo da binarização, índices), essa forma é calculada **uma única vez** na construção.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Rótulo internado. Clonar é barato (contador de referência) e pode cruzar threads.
pub type Symbol = Arc<str>;

/// Sequência ordenada de símbolos com representação textual em cache.
///
/// # Exemplo
/// ```rust
/// use pcfg_core::event::Event;
///
/// let rhs = Event::parse("DT NN");
/// assert_eq!(rhs.len(), 2);
/// assert_eq!(rhs.as_str(), "DT NN");
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct Event {
    symbols: Vec<Symbol>,
    repr: Symbol,
}

impl Event {
    /// Constrói o evento a partir de símbolos já separados.
    pub fn new(symbols: Vec<Symbol>) -> Self {
        let repr: Symbol = symbols
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<_>>()
            .join(" ")
            .into();
        Self { symbols, repr }
    }

    /// Evento de um único símbolo (lado esquerdo, palavra, etc.).
    pub fn single(symbol: impl Into<Symbol>) -> Self {
        let symbol = symbol.into();
        Self {
            repr: symbol.clone(),
            symbols: vec![symbol],
        }
    }

    /// Separa a string por espaços em branco.
    pub fn parse(text: &str) -> Self {
        Self::new(text.split_whitespace().map(Symbol::from).collect())
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Primeiro símbolo (o único, no caso de um lado esquerdo).
    pub fn head(&self) -> Option<&Symbol> {
        self.symbols.first()
    }

    pub fn as_str(&self) -> &str {
        &self.repr
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.repr == other.repr
    }
}

impl Eq for Event {}

impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.repr.hash(state);
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.repr)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event({:?})", self.repr)
    }
}

impl From<String> for Event {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

impl From<Event> for String {
    fn from(event: Event) -> Self {
        event.repr.to_string()
    }
}
