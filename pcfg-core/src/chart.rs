//! # Chart do CKY
//!
//! Matriz triangular de **células**, uma por span `[i, j)` com `0 <= i < j <= n`.
//!
//! ```text
//!          j=1     j=2     j=3
//! i=0   [0,1)   [0,2)   [0,3)   ← raiz
//! i=1           [1,2)   [1,3)
//! i=2                   [2,3)
//! ```
//!
//! Cada célula guarda, por rótulo, **apenas a melhor transição** (chart de Viterbi, não
//! uma floresta compactada). As transições vivem em uma arena da sentença e apontam
//! para os filhos por [`TransitionId`]; o chart inteiro é descartado ao fim da sentença.

use indexmap::IndexMap;

use crate::event::Symbol;
use crate::index::{GrammarIndex, RuleId};
use crate::tree::Node;

/// Posição de uma transição na arena do chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransitionId(usize);

/// Passo de uma derivação.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Folha: a palavra em si, custo 0.
    Terminal { word: Symbol },
    /// `label -> child`
    Unary {
        label: Symbol,
        cost: f64,
        child: TransitionId,
    },
    /// `label -> left right`
    Binary {
        label: Symbol,
        cost: f64,
        left: TransitionId,
        right: TransitionId,
    },
}

impl Transition {
    pub fn label(&self) -> &Symbol {
        match self {
            Transition::Terminal { word } => word,
            Transition::Unary { label, .. } | Transition::Binary { label, .. } => label,
        }
    }

    /// Custo acumulado (`-ln`) da subderivação.
    pub fn cost(&self) -> f64 {
        match self {
            Transition::Terminal { .. } => 0.0,
            Transition::Unary { cost, .. } | Transition::Binary { cost, .. } => *cost,
        }
    }
}

/// Célula de um span: melhor transição por rótulo + índices por regra.
#[derive(Debug, Default)]
pub struct Cell {
    best: IndexMap<Symbol, TransitionId>,
    /// Regra binária → transição desta célula que serve como filho **esquerdo**.
    left: IndexMap<RuleId, TransitionId>,
    /// Regra binária → transição desta célula que serve como filho **direito**.
    right: IndexMap<RuleId, TransitionId>,
}

impl Cell {
    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<TransitionId> {
        self.best.get(label).copied()
    }

    /// Rótulos e transições, em ordem de primeira inserção.
    pub fn entries(&self) -> impl Iterator<Item = (&Symbol, TransitionId)> + '_ {
        self.best.iter().map(|(label, &id)| (label, id))
    }

    pub fn left_index(&self) -> &IndexMap<RuleId, TransitionId> {
        &self.left
    }

    pub fn right_index(&self) -> &IndexMap<RuleId, TransitionId> {
        &self.right
    }

    /// Reconstrói os índices por regra a partir das transições finais da célula.
    pub fn build_indexes(&mut self, index: &GrammarIndex) {
        self.left.clear();
        self.right.clear();
        for (label, &id) in &self.best {
            for &rule in index.left_rules(label) {
                self.left.insert(rule, id);
            }
            for &rule in index.right_rules(label) {
                self.right.insert(rule, id);
            }
        }
    }
}

/// Chart de uma sentença de `n` palavras.
#[derive(Debug)]
pub struct Chart {
    n: usize,
    cells: Vec<Option<Cell>>,
    arena: Vec<Transition>,
}

impl Chart {
    pub fn new(n: usize) -> Self {
        let mut cells = Vec::new();
        cells.resize_with(n * (n + 1) / 2, || None);
        Self {
            n,
            cells,
            arena: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Posição triangular do span `[i, j)`.
    fn slot(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < j && j <= self.n, "span inválido [{i}, {j})");
        j * (j - 1) / 2 + i
    }

    pub fn cell(&self, i: usize, j: usize) -> Option<&Cell> {
        self.cells[self.slot(i, j)].as_ref()
    }

    /// Célula do span, criada sob demanda.
    pub fn cell_mut(&mut self, i: usize, j: usize) -> &mut Cell {
        let slot = self.slot(i, j);
        self.cells[slot].get_or_insert_with(Cell::default)
    }

    pub fn transition(&self, id: TransitionId) -> &Transition {
        &self.arena[id.0]
    }

    /// Coloca a transição na arena sem registrá-la em nenhuma célula.
    pub fn alloc(&mut self, transition: Transition) -> TransitionId {
        self.arena.push(transition);
        TransitionId(self.arena.len() - 1)
    }

    /// `true` se uma transição com este rótulo e custo melhoraria a célula.
    pub fn improves(&self, i: usize, j: usize, label: &str, cost: f64) -> bool {
        match self.cell(i, j).and_then(|c| c.get(label)) {
            Some(current) => cost < self.transition(current).cost(),
            None => true,
        }
    }

    /// Registra a transição na célula se ela for a de menor custo para o seu rótulo.
    /// Empates mantêm a transição registrada primeiro.
    pub fn register(&mut self, i: usize, j: usize, id: TransitionId) -> bool {
        let label = self.transition(id).label().clone();
        let cost = self.transition(id).cost();
        if !self.improves(i, j, &label, cost) {
            return false;
        }
        self.cell_mut(i, j).best.insert(label, id);
        true
    }

    /// Aloca e registra de uma vez, sem tocar na arena quando a transição perderia.
    pub fn offer(&mut self, i: usize, j: usize, transition: Transition) -> Option<TransitionId> {
        if !self.improves(i, j, transition.label(), transition.cost()) {
            return None;
        }
        let label = transition.label().clone();
        let id = self.alloc(transition);
        self.cell_mut(i, j).best.insert(label, id);
        Some(id)
    }

    /// Monta a árvore da derivação a partir de uma transição, sem recursão.
    pub fn build_tree(&self, root: TransitionId) -> Node {
        // Pós-ordem com pilha explícita: (transição, filhos já processados?)
        let mut work = vec![(root, false)];
        let mut built: Vec<Node> = Vec::new();

        while let Some((id, expanded)) = work.pop() {
            let transition = self.transition(id);
            match (transition, expanded) {
                (Transition::Terminal { word }, _) => built.push(Node::new(word.as_ref())),
                (Transition::Unary { child, .. }, false) => {
                    work.push((id, true));
                    work.push((*child, false));
                }
                (Transition::Binary { left, right, .. }, false) => {
                    work.push((id, true));
                    work.push((*right, false));
                    work.push((*left, false));
                }
                (Transition::Unary { label, .. }, true) => {
                    let child = pop_node(&mut built);
                    built.push(Node::with_children(label.as_ref(), vec![child]));
                }
                (Transition::Binary { label, .. }, true) => {
                    let right = pop_node(&mut built);
                    let left = pop_node(&mut built);
                    built.push(Node::with_children(label.as_ref(), vec![left, right]));
                }
            }
        }
        pop_node(&mut built)
    }
}

fn pop_node(built: &mut Vec<Node>) -> Node {
    built
        .pop()
        .unwrap_or_else(|| unreachable!("pilha de reconstrução esvaziada antes da hora"))
}
