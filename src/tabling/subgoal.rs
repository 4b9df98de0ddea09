//! Subgoal lifecycle and dependency edges.
use crate::tabling::answer_trie::AnswerTrie;
use crate::tabling::pattern::CallPattern;
use crate::term::Term;
use std::collections::HashMap;
use std::rc::Rc;

pub type SubgoalId = usize;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Active,
    Complete,
    Failed,
    Invalidated,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Positive,
    Negative,
}

pub struct SubgoalEntry {
    pub id: SubgoalId,
    pub pattern: CallPattern,
    pub status: Status,
    pub answers: AnswerTrie,
    pub dependencies: Vec<(SubgoalId, EdgeKind)>,
    pub ref_count: usize,
    pub change_seq: u64,
    /// The table-local fresh variables standing in for this subgoal's
    /// canonical tokens (`X0, X1,...`), in token order. Populated when
    /// an evaluator is first attached; used to map a pulled answer's
    /// bindings back onto a caller's own variables.
    pub fresh_vars: Vec<Rc<Term>>,
    pub evaluator: Option<Box<dyn crate::tabling::engine::Evaluator>>,
    /// Rebuilds a fresh evaluator for this subgoal from scratch, re-running
    /// its clause body against the table's current answers. Used to redrive
    /// every member of a dependency cycle to a shared fixed point once one
    /// evaluator alone can no longer make progress (see `Engine::ensure_complete`).
    pub restart: Option<Rc<dyn Fn() -> Box<dyn crate::tabling::engine::Evaluator>>>,
}

impl SubgoalEntry {
    pub fn new(id: SubgoalId, pattern: CallPattern) -> SubgoalEntry {
        SubgoalEntry {
            id,
            pattern,
            status: Status::Active,
            answers: AnswerTrie::new(),
            dependencies: Vec::new(),
            ref_count: 0,
            change_seq: 0,
            fresh_vars: Vec::new(),
            evaluator: None,
            restart: None,
        }
    }

    pub fn add_dependency(&mut self, target: SubgoalId, kind: EdgeKind) {
        if !self.dependencies.iter().any(|(id, k)| *id == target && *k == kind) {
            self.dependencies.push((target, kind));
        }
    }
}

/// Adjacency-list dependency graph keyed by subgoal id.
#[derive(Default)]
pub struct DependencyGraph {
    edges: HashMap<SubgoalId, Vec<(SubgoalId, EdgeKind)>>,
}

impl DependencyGraph {
    pub fn new() -> DependencyGraph {
        DependencyGraph { edges: HashMap::new() }
    }

    pub fn add_edge(&mut self, from: SubgoalId, to: SubgoalId, kind: EdgeKind) {
        let entry = self.edges.entry(from).or_insert_with(Vec::new);
        if !entry.iter().any(|(id, k)| *id == to && *k == kind) {
            entry.push((to, kind));
        }
    }

    pub fn edges_from(&self, from: SubgoalId) -> &[(SubgoalId, EdgeKind)] {
        self.edges.get(&from).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.edges.clear();
    }
}
