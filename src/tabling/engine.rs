//! The SLG engine: `Evaluate`, the subgoal table, dependency
//! tracking, completion, and well-founded negation-as-failure.
//!
//! The table lookup/creation shape (a `predicate -> id` map guarding
//! lazily-created table state) is grounded on the same idea as a forest
//! of per-goal tables driving tabled evaluation; the concurrency
//! primitives (`dashmap` for the pattern-to-id map, `parking_lot::Mutex`
//! for per-entry answer storage) are the same stack the FD parallel
//! search variant uses, chosen so the crate has one concurrency idiom
//! rather than two.
//!
//! Cycle handling tracks an explicit currently-evaluating stack and
//! treats re-entering an active subgoal as a cycle directly, which is
//! sufficient for left recursion and mutual negation without needing a
//! minimal-cyclic-counter comparison.
//!
//! Completion is gated on the dependency graph, not on one evaluator
//! reaching `Done`: a back edge recorded into an ancestor still on the
//! active stack lowers the caller's low-link (a running Tarjan-style
//! low-link over `active_stack` positions) below its own push position,
//! marking it a dependent member of that ancestor's cycle rather than a
//! standalone completion. Only the member whose low-link never drops
//! below its own position -- the leader -- closes the cycle, by
//! collecting every subgoal still active at or above its position and
//! redriving each from a fresh evaluator in turn until a full round adds
//! no new answers anywhere in the group, then marking the whole group
//! `Complete` together.
use crate::context::CancellationToken;
use crate::tabling::answer_trie::Bindings;
use crate::tabling::delay::DelaySet;
use crate::tabling::pattern::{canonicalize, CallPattern};
use crate::tabling::subgoal::{DependencyGraph, EdgeKind, Status, SubgoalEntry, SubgoalId};
use crate::term::{Term, VarId};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::rc::Rc;

/// One step of driving a subgoal's evaluator forward.
pub enum EvalStep {
    Answer(Bindings, DelaySet),
    Done,
}

/// A subgoal's proof procedure: repeatedly polled for its next answer.
/// `poll` receives the engine so an evaluator can itself call tabled
/// subgoals (recording dependency edges) or probe `negation_truth`.
pub trait Evaluator {
    fn poll(&mut self, engine: &Engine, ctx: &CancellationToken) -> EvalStep;
}

/// Three-valued truth under well-founded semantics.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Truth {
    True,
    False,
    Undefined,
}

pub struct Engine {
    table: DashMap<CallPattern, SubgoalId>,
    entries: RefCell<Vec<Rc<Mutex<SubgoalEntry>>>>,
    dependency_graph: RefCell<DependencyGraph>,
    active_stack: RefCell<Vec<SubgoalId>>,
    low_link: RefCell<std::collections::HashMap<SubgoalId, usize>>,
}

impl Default for Engine {
    fn default() -> Engine {
        Engine::new()
    }
}

impl Engine {
    pub fn new() -> Engine {
        Engine {
            table: DashMap::new(),
            entries: RefCell::new(Vec::new()),
            dependency_graph: RefCell::new(DependencyGraph::new()),
            active_stack: RefCell::new(Vec::new()),
            low_link: RefCell::new(std::collections::HashMap::new()),
        }
    }

    fn entry(&self, id: SubgoalId) -> Rc<Mutex<SubgoalEntry>> {
        Rc::clone(&self.entries.borrow()[id])
    }

    /// Looks up the subgoal for `pattern`, creating an `Active` entry
    /// (with no evaluator attached yet) if none exists. Returns the id and
    /// whether an entry was just created.
    pub fn get_or_create(&self, pattern: CallPattern) -> (SubgoalId, bool) {
        if let Some(id) = self.table.get(&pattern) {
            return (*id, false);
        }
        let mut entries = self.entries.borrow_mut();
        let id = entries.len();
        entries.push(Rc::new(Mutex::new(SubgoalEntry::new(id, pattern.clone()))));
        drop(entries);
        // Single-winner semantics: if another caller raced us and inserted
        // first, keep theirs and drop the entry we allocated.
        match self.table.entry(pattern) {
            dashmap::mapref::entry::Entry::Occupied(o) => (*o.get(), false),
            dashmap::mapref::entry::Entry::Vacant(v) => {
                v.insert(id);
                (id, true)
            }
        }
    }

    /// Attaches `factory` as the way to (re)build an evaluator for `id`,
    /// calling it once now for the initial evaluator. The factory is kept
    /// so the subgoal can be rebuilt from scratch and redriven if it turns
    /// out to be part of a dependency cycle (see `ensure_complete`).
    pub fn attach_evaluator(
        &self,
        id: SubgoalId,
        fresh_vars: Vec<Rc<Term>>,
        factory: Rc<dyn Fn() -> Box<dyn Evaluator>>,
    ) {
        let evaluator = factory();
        let entry = self.entry(id);
        let mut entry = entry.lock();
        entry.fresh_vars = fresh_vars;
        entry.evaluator = Some(evaluator);
        entry.restart = Some(factory);
    }

    pub fn fresh_vars(&self, id: SubgoalId) -> Vec<Rc<Term>> {
        self.entry(id).lock().fresh_vars.clone()
    }

    /// The subgoal currently being evaluated on top of the active stack,
    /// if any -- the caller a nested tabled call should record its
    /// dependency edge against.
    pub fn active_caller(&self) -> Option<SubgoalId> {
        self.active_stack.borrow().last().copied()
    }

    /// Records that `from` calls `to`. For a `Positive` edge landing on an
    /// ancestor still on the active stack, also lowers `from`'s low-link to
    /// that ancestor's stack position, marking `from` a dependent member of
    /// the cycle the ancestor heads rather than a subgoal that can complete
    /// on its own. `Negative` edges are recorded for the dependency graph
    /// but never lower a low-link: a negative edge closing a cycle is
    /// `negation_truth`'s `Undefined` case, not something redriving can
    /// resolve.
    pub fn record_dependency(&self, from: SubgoalId, to: SubgoalId, kind: EdgeKind) {
        self.entry(from).lock().add_dependency(to, kind);
        self.dependency_graph.borrow_mut().add_edge(from, to, kind);
        if kind == EdgeKind::Positive {
            if let Some(pos) = self.active_stack.borrow().iter().position(|&x| x == to) {
                let mut low_link = self.low_link.borrow_mut();
                let from_low = *low_link.get(&from).unwrap_or(&usize::MAX);
                low_link.insert(from, from_low.min(pos));
            }
        }
    }

    pub fn status(&self, id: SubgoalId) -> Status {
        self.entry(id).lock().status
    }

    fn restart(&self, id: SubgoalId) {
        let factory = self.entry(id).lock().restart.clone();
        if let Some(factory) = factory {
            self.entry(id).lock().evaluator = Some(factory());
        }
    }

    /// Polls `id`'s evaluator until it signals exhaustion, recording each
    /// answer it yields. Assumes `id` is already on the active stack.
    fn drive_one_round(&self, id: SubgoalId, ctx: &CancellationToken) {
        loop {
            if ctx.is_cancelled() {
                break;
            }
            let mut evaluator = {
                let entry = self.entry(id);
                let mut guard = entry.lock();
                guard.evaluator.take()
            };
            let step = match evaluator.as_mut() {
                Some(e) => e.poll(self, ctx),
                None => EvalStep::Done,
            };
            {
                let entry = self.entry(id);
                let mut guard = entry.lock();
                guard.evaluator = evaluator;
            }
            match step {
                EvalStep::Answer(bindings, delay) => {
                    let entry = self.entry(id);
                    let mut guard = entry.lock();
                    if guard.answers.insert(bindings, delay) {
                        guard.change_seq += 1;
                    }
                }
                EvalStep::Done => break,
            }
        }
    }

    /// Drives `id`'s evaluator (and, if `id` turns out to head a
    /// dependency cycle, every other subgoal in that cycle) to a shared
    /// fixed point, pushing `id` onto the active-evaluation stack for the
    /// duration so a re-entrant call onto the same subgoal is recognized
    /// as a cycle rather than looping forever. A no-op if the subgoal is
    /// already `Complete`, `Failed`, or currently active (the caller is
    /// expected to have checked `is_active` first via
    /// `negation_truth`/`ensure_answers`).
    pub fn ensure_complete(&self, id: SubgoalId, ctx: &CancellationToken) {
        if self.active_stack.borrow().contains(&id) {
            return;
        }
        {
            let entry = self.entry(id);
            let status = entry.lock().status;
            if status != Status::Active {
                return;
            }
        }
        let my_pos = self.active_stack.borrow().len();
        self.active_stack.borrow_mut().push(id);
        self.low_link.borrow_mut().insert(id, my_pos);

        self.drive_one_round(id, ctx);

        let low = *self.low_link.borrow().get(&id).unwrap_or(&my_pos);
        if low < my_pos {
            // Dependent member of a cycle headed further down the stack:
            // propagate our low-link to our caller and leave closing the
            // cycle to its leader. `my_pos > 0` always holds here since
            // `low` can never be less than the root's position, 0.
            let caller = self.active_stack.borrow()[my_pos - 1];
            let mut low_link = self.low_link.borrow_mut();
            let caller_low = *low_link.get(&caller).unwrap_or(&usize::MAX);
            low_link.insert(caller, caller_low.min(low));
            return;
        }

        // Leader: every subgoal still active at or above this position is
        // exactly the current cycle (possibly just `id` alone). Redrive
        // each from a fresh evaluator in turn until a full round adds no
        // new answer anywhere in the group, then close the whole group.
        let scc: Vec<SubgoalId> = self.active_stack.borrow()[my_pos..].to_vec();
        loop {
            if ctx.is_cancelled() {
                break;
            }
            let before: u64 = scc.iter().map(|m| self.entry(*m).lock().change_seq).sum();
            for &member in &scc {
                self.restart(member);
                self.drive_one_round(member, ctx);
            }
            let after: u64 = scc.iter().map(|m| self.entry(*m).lock().change_seq).sum();
            if after == before {
                break;
            }
        }
        for &member in &scc {
            self.active_stack.borrow_mut().retain(|x| *x != member);
            self.low_link.borrow_mut().remove(&member);
            let entry = self.entry(member);
            let mut guard = entry.lock();
            if guard.status == Status::Active {
                guard.status = Status::Complete;
            }
        }
    }

    /// Returns the live answers currently in `id`'s trie, without driving
    /// its evaluator any further.
    pub fn answers_snapshot(&self, id: SubgoalId) -> Vec<Bindings> {
        self.entry(id).lock().answers.iter().map(|a| a.bindings.clone()).collect()
    }

    pub fn answer_count(&self, id: SubgoalId) -> usize {
        self.entry(id).lock().answers.count()
    }

    /// Well-founded truth of the subgoal named by `pattern`'s predicate +
    /// args. A re-entrant probe (this subgoal is currently being
    /// evaluated higher up the call stack) is the stratification guard:
    /// it returns `Undefined` instead of recursing, matching "a negative
    /// edge closing a cycle with only positive edges is locally
    /// unstratified".
    pub fn negation_truth(&self, id: SubgoalId, ctx: &CancellationToken) -> Truth {
        if self.active_stack.borrow().contains(&id) {
            return Truth::Undefined;
        }
        self.ensure_complete(id, ctx);
        let entry = self.entry(id);
        let guard = entry.lock();
        if guard.status == Status::Failed || guard.answers.count() == 0 {
            return Truth::True;
        }
        match guard.answers.first_live() {
            Some(answer) if answer.delay.is_empty() => Truth::False,
            _ => Truth::Undefined,
        }
    }

    /// `invalidateRelation`: removes every subgoal entry for `predicate_id`.
    pub fn invalidate_relation(&self, predicate_id: &str) {
        self.table.retain(|pattern, _| pattern.predicate_id != predicate_id);
        for entry in self.entries.borrow().iter() {
            let mut guard = entry.lock();
            if guard.pattern.predicate_id == predicate_id {
                guard.status = Status::Invalidated;
                guard.evaluator = None;
            }
        }
    }

    /// `invalidateAll`: clears the whole table.
    pub fn invalidate_all(&self) {
        self.table.clear();
        for entry in self.entries.borrow().iter() {
            let mut guard = entry.lock();
            guard.status = Status::Invalidated;
            guard.evaluator = None;
        }
        self.dependency_graph.borrow_mut().clear();
    }

    pub fn invalidate_by_domain(&self, id: SubgoalId, var_id: VarId, domain: &[i64]) {
        self.entry(id).lock().answers.invalidate_by_domain(var_id, domain);
    }

    /// Canonicalizes `(predicate_id, args)` against `store` and returns
    /// the matching subgoal id, creating it (without an evaluator
    /// attached) if this is the first call with this pattern. Also
    /// returns, in positional order, the caller-space variable at each
    /// canonical token -- needed to bind a pulled answer back onto the
    /// caller's own variables.
    pub fn resolve_call(
        &self,
        predicate_id: &'static str,
        args: &[Rc<Term>],
        store: &crate::relational::store::Store,
    ) -> (SubgoalId, Vec<VarId>, bool) {
        let (pattern, tokens) = canonicalize(predicate_id, args, store);
        let (id, created) = self.get_or_create(pattern);
        (id, tokens, created)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Engine").field("subgoals", &self.entries.borrow().len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabling::pattern::CallPattern;

    fn pattern(id: &'static str) -> CallPattern {
        let store = crate::relational::store::Store::new();
        canonicalize(id, &[], &store).0
    }

    /// `p :- not q`, `q :- not p`, no base facts:
    /// each subgoal's only answer is conditional on the other, so
    /// well-founded negation must report both as `Undefined` rather than
    /// looping or guessing a value.
    struct NegationOf {
        other: SubgoalId,
        done: bool,
    }

    impl Evaluator for NegationOf {
        fn poll(&mut self, engine: &Engine, ctx: &CancellationToken) -> EvalStep {
            if self.done {
                return EvalStep::Done;
            }
            self.done = true;
            match engine.negation_truth(self.other, ctx) {
                Truth::True => EvalStep::Answer(Bindings::new(), DelaySet::empty()),
                Truth::False => EvalStep::Done,
                Truth::Undefined => EvalStep::Answer(Bindings::new(), DelaySet::of(self.other)),
            }
        }
    }

    #[test]
    fn mutual_negation_with_no_base_facts_is_undefined_both_ways() {
        let engine = Engine::new();
        let ctx = CancellationToken::new();
        let (p_id, _) = engine.get_or_create(pattern("p"));
        let (q_id, _) = engine.get_or_create(pattern("q"));
        engine.attach_evaluator(
            p_id,
            Vec::new(),
            Rc::new(move || Box::new(NegationOf { other: q_id, done: false }) as Box<dyn Evaluator>),
        );
        engine.attach_evaluator(
            q_id,
            Vec::new(),
            Rc::new(move || Box::new(NegationOf { other: p_id, done: false }) as Box<dyn Evaluator>),
        );

        assert_eq!(engine.negation_truth(p_id, &ctx), Truth::Undefined);
        assert_eq!(engine.negation_truth(q_id, &ctx), Truth::Undefined);
    }

    #[test]
    fn negation_of_a_completed_empty_subgoal_is_true() {
        let engine = Engine::new();
        let ctx = CancellationToken::new();
        struct NoAnswers;
        impl Evaluator for NoAnswers {
            fn poll(&mut self, _engine: &Engine, _ctx: &CancellationToken) -> EvalStep {
                EvalStep::Done
            }
        }
        let (id, _) = engine.get_or_create(pattern("empty"));
        engine.attach_evaluator(id, Vec::new(), Rc::new(|| Box::new(NoAnswers) as Box<dyn Evaluator>));
        assert_eq!(engine.negation_truth(id, &ctx), Truth::True);
    }
}
