//! Bridges a tabled predicate into the ordinary `Goal`/`Stream`
//! machinery: `TabledPredicate::call` canonicalizes the call, drives the
//! engine to completion (this crate's tabling is eager rather than
//! pull-by-pull lazy, a deliberate simplification noted in the grounding
//! ledger), and replays the subgoal's answers as caller-space bindings.
use crate::context::CancellationToken;
use crate::relational::goal::{Goal, GoalImpl};
use crate::relational::store::Store;
use crate::relational::stream::{LazyStream, Stream};
use crate::tabling::engine::{EvalStep, Engine, Evaluator};
use crate::term::{Term, VarId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Replaces every variable in `t` (walked against `store`) that appears
/// in `fresh_map` with its table-local fresh variable, leaving ground
/// structure and unmapped variables untouched.
fn instantiate(t: &Rc<Term>, store: &Store, fresh_map: &HashMap<VarId, Rc<Term>>) -> Rc<Term> {
    let walked = store.walk(t);
    match walked.as_ref() {
        Term::Var(id, _) => fresh_map.get(id).map(Rc::clone).unwrap_or(walked),
        Term::Atom(_) | Term::Nil => walked,
        Term::Pair(car, cdr) => Term::cons(
            instantiate(car, store, fresh_map),
            instantiate(cdr, store, fresh_map),
        ),
    }
}

/// Pulls answers one at a time from a `Goal` solved against a fresh,
/// empty store, extracting each answer as bindings over the subgoal's own
/// fresh variables (in token order).
#[derive(Debug)]
pub struct GoalEvaluator {
    stream: Stream,
    fresh_vars: Vec<Rc<Term>>,
}

impl GoalEvaluator {
    /// Builds the evaluator without running any of the clause's goal yet:
    /// the body is wrapped in a `Stream::pause` so the first step happens
    /// inside the first `poll`, by which point the engine has already
    /// pushed this subgoal onto the active-evaluation stack. A clause
    /// whose top-level goal is a leaf (`Eq`, a nested tabled call, a
    /// negation probe) that ran eagerly here, before that push, would see
    /// its own subgoal as not-yet-active and could complete prematurely
    /// on reentry instead of being recognized as a cycle.
    pub fn new(goal: &Goal, fresh_vars: Vec<Rc<Term>>) -> GoalEvaluator {
        let stream = Stream::pause(Box::new(Store::new()), goal.clone());
        GoalEvaluator { stream, fresh_vars }
    }

    fn extract(&self, store: &Store) -> crate::tabling::answer_trie::Bindings {
        self.fresh_vars
            .iter()
            .map(|v| (v.var_id().expect("fresh_vars are all Term::Var"), store.deep_walk(v)))
            .collect()
    }
}

impl Evaluator for GoalEvaluator {
    fn poll(&mut self, _engine: &Engine, ctx: &CancellationToken) -> EvalStep {
        let s = std::mem::replace(&mut self.stream, Stream::Empty).mature(ctx);
        match s {
            Stream::Empty => EvalStep::Done,
            Stream::Unit(store) => {
                let bindings = self.extract(&store);
                self.stream = Stream::Empty;
                EvalStep::Answer(bindings, crate::tabling::delay::DelaySet::empty())
            }
            Stream::Cons(store, rest) => {
                let bindings = self.extract(&store);
                self.stream = Stream::Lazy(rest);
                EvalStep::Answer(bindings, crate::tabling::delay::DelaySet::empty())
            }
            Stream::Lazy(_) => unreachable!("Stream::mature never returns Lazy"),
        }
    }
}

/// A `Goal` that ignores the store it is solved against and yields a
/// precomputed `Stream`, used to splice an eagerly-materialized answer
/// sequence back into the trampoline as an ordinary lazy continuation.
#[derive(Debug)]
struct Precomputed(RefCell<Option<Stream>>);

impl GoalImpl for Precomputed {
    fn solve(&self, _ctx: &CancellationToken, _store: Box<Store>) -> Stream {
        self.0.borrow_mut().take().unwrap_or(Stream::Empty)
    }
}

fn stream_of(stores: Vec<Box<Store>>) -> Stream {
    let mut acc = Stream::Empty;
    for s in stores.into_iter().rev() {
        let rest = LazyStream::pause(Box::new(Store::new()), Goal::dynamic(Precomputed(RefCell::new(Some(acc)))));
        acc = Stream::Cons(s, rest);
    }
    acc
}

/// A tabled predicate: a name plus the clause body that defines it, run
/// through `Engine` so repeated or recursive calls share one subgoal.
#[derive(Clone)]
pub struct TabledPredicate {
    engine: Rc<Engine>,
    predicate_id: &'static str,
    clause: Rc<dyn Fn(Vec<Rc<Term>>) -> Goal>,
}

impl TabledPredicate {
    pub fn new(
        engine: Rc<Engine>,
        predicate_id: &'static str,
        clause: impl Fn(Vec<Rc<Term>>) -> Goal + 'static,
    ) -> TabledPredicate {
        TabledPredicate { engine, predicate_id, clause: Rc::new(clause) }
    }

    pub fn call(&self, args: Vec<Rc<Term>>) -> Goal {
        Goal::dynamic(TabledCallGoal { pred: self.clone(), args })
    }

    pub fn engine(&self) -> &Rc<Engine> {
        &self.engine
    }

    /// The well-founded truth value of this predicate applied to `args`,
    /// without binding any of the caller's variables. Creates the
    /// subgoal (and drives it to completion) if it has not been called
    /// before.
    pub fn truth(&self, args: &[Rc<Term>], store: &Store, ctx: &CancellationToken) -> crate::tabling::engine::Truth {
        let (id, tokens, created) = self.engine.resolve_call(self.predicate_id, args, store);
        if let Some(caller) = self.engine.active_caller() {
            self.engine.record_dependency(caller, id, crate::tabling::subgoal::EdgeKind::Negative);
        }
        if created {
            let mut fresh_map: HashMap<VarId, Rc<Term>> = HashMap::new();
            let mut fresh_vars = Vec::with_capacity(tokens.len());
            for tok in &tokens {
                let fv = Term::fresh();
                fresh_map.insert(*tok, Rc::clone(&fv));
                fresh_vars.push(fv);
            }
            let goal_args: Vec<Rc<Term>> = args.iter().map(|a| instantiate(a, store, &fresh_map)).collect();
            let clause = Rc::clone(&self.clause);
            let factory_fresh_vars = fresh_vars.clone();
            let factory: Rc<dyn Fn() -> Box<dyn Evaluator>> = Rc::new(move || {
                let goal = (clause)(goal_args.clone());
                Box::new(GoalEvaluator::new(&goal, factory_fresh_vars.clone())) as Box<dyn Evaluator>
            });
            self.engine.attach_evaluator(id, fresh_vars, factory);
        }
        self.engine.negation_truth(id, ctx)
    }
}

#[derive(Debug)]
struct TabledCallGoal {
    pred: TabledPredicate,
    args: Vec<Rc<Term>>,
}

impl std::fmt::Debug for TabledPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("TabledPredicate").field("predicate_id", &self.predicate_id).finish()
    }
}

impl GoalImpl for TabledCallGoal {
    fn solve(&self, ctx: &CancellationToken, store: Box<Store>) -> Stream {
        let engine = &self.pred.engine;
        let (id, tokens, created) = engine.resolve_call(self.pred.predicate_id, &self.args, &store);
        if let Some(caller) = engine.active_caller() {
            engine.record_dependency(caller, id, crate::tabling::subgoal::EdgeKind::Positive);
        }
        if created {
            let mut fresh_map: HashMap<VarId, Rc<Term>> = HashMap::new();
            let mut fresh_vars = Vec::with_capacity(tokens.len());
            for tok in &tokens {
                let fv = Term::fresh();
                fresh_map.insert(*tok, Rc::clone(&fv));
                fresh_vars.push(fv);
            }
            let goal_args: Vec<Rc<Term>> =
                self.args.iter().map(|a| instantiate(a, &store, &fresh_map)).collect();
            let clause = Rc::clone(&self.pred.clause);
            let factory_fresh_vars = fresh_vars.clone();
            let factory: Rc<dyn Fn() -> Box<dyn Evaluator>> = Rc::new(move || {
                let goal = (clause)(goal_args.clone());
                Box::new(GoalEvaluator::new(&goal, factory_fresh_vars.clone())) as Box<dyn Evaluator>
            });
            engine.attach_evaluator(id, fresh_vars, factory);
        }
        engine.ensure_complete(id, ctx);
        let fresh_vars = engine.fresh_vars(id);
        let mut out = Vec::new();
        for answer in engine.answers_snapshot(id) {
            let mut cur = (*store).clone();
            let mut ok = true;
            for (tok, fv) in tokens.iter().zip(fresh_vars.iter()) {
                let fv_id = fv.var_id().expect("fresh_vars are all Term::Var");
                let value = answer.get(&fv_id).cloned().unwrap_or_else(|| Rc::clone(fv));
                let tok_term = Rc::new(Term::Var(*tok, "_"));
                match cur.unify(&tok_term, &value) {
                    Some(next) => cur = next,
                    None => {
                        ok = false;
                        break;
                    }
                }
            }
            if ok {
                out.push(Box::new(cur));
            }
        }
        stream_of(out)
    }
}

/// Negation-as-failure, folding `TabledPredicate::truth`'s three-valued
/// result into the ordinary success/failure `Goal` model: `Undefined`
/// resolves as a success here (don't-care floundering), matching plain
/// negation-as-failure in systems without a well-founded top level. Code
/// that must distinguish `Undefined` from `False` should call
/// `TabledPredicate::truth` directly instead of going through a `Goal`.
pub fn tnot(pred: TabledPredicate, args: Vec<Rc<Term>>) -> Goal {
    Goal::dynamic(TnotGoal { pred, args })
}

#[derive(Debug)]
struct TnotGoal {
    pred: TabledPredicate,
    args: Vec<Rc<Term>>,
}

impl GoalImpl for TnotGoal {
    fn solve(&self, ctx: &CancellationToken, store: Box<Store>) -> Stream {
        use crate::tabling::engine::Truth;
        match self.pred.truth(&self.args, &store, ctx) {
            Truth::True => Stream::empty(),
            Truth::False | Truth::Undefined => Stream::unit(store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relational::combinators::{conj, disj, eq, fresh};
    use crate::relational::run::run_with_context;

    fn edge_pred(engine: Rc<Engine>) -> TabledPredicate {
        TabledPredicate::new(engine, "edge", |args| {
            let x = Rc::clone(&args[0]);
            let y = Rc::clone(&args[1]);
            let facts = [("a", "b"), ("b", "c"), ("c", "d")];
            let mut goals = Vec::new();
            for (from, to) in facts {
                goals.push(conj(eq(Rc::clone(&x), Term::symbol(from)), eq(Rc::clone(&y), Term::symbol(to))));
            }
            crate::relational::combinators::disj_all(goals)
        })
    }

    /// `path(X, Y) :- edge(X, Y)`; `path(X, Y) :- edge(X, Z), path(Z, Y)`.
    /// Recursive transitive closure over `edge`, tabled so the repeated
    /// `path` calls spawned as `Z` walks the chain share one subgoal per
    /// distinct bound first argument instead of re-deriving it.
    fn path_pred(engine: Rc<Engine>) -> TabledPredicate {
        let edge = edge_pred(Rc::clone(&engine));
        let path_cell: Rc<RefCell<Option<TabledPredicate>>> = Rc::new(RefCell::new(None));
        let path_cell_for_clause = Rc::clone(&path_cell);
        let path = TabledPredicate::new(engine, "path", move |args| {
            let x = Rc::clone(&args[0]);
            let y = Rc::clone(&args[1]);
            let direct = edge.call(vec![Rc::clone(&x), Rc::clone(&y)]);
            let z = fresh("z");
            let path = path_cell_for_clause
                .borrow()
                .clone()
                .expect("path predicate is installed before its first call");
            let via = conj(edge.call(vec![Rc::clone(&x), Rc::clone(&z)]), path.call(vec![z, y]));
            disj(direct, via)
        });
        *path_cell.borrow_mut() = Some(path.clone());
        path
    }

    #[test]
    fn tabled_path_finds_every_reachable_node() {
        let engine = Rc::new(Engine::new());
        let path = path_pred(engine);
        let ctx = CancellationToken::new();
        let mut results = run_with_context(&ctx, 10, |q| path.call(vec![Term::symbol("a"), q]));
        results.sort_by_key(|t| format!("{}", t));
        assert_eq!(results, vec![Term::symbol("b"), Term::symbol("c"), Term::symbol("d")]);
    }

    /// `p(X) :- q(X)`, `p(X) :- X = a`; `q(X) :- p(X)`. Querying `q`
    /// re-enters the identical `p(X)` subgoal while `p` is still active on
    /// the evaluation stack (unlike `path_pred` above, where each
    /// recursive step binds a fresh concrete argument and so never hits
    /// the same subgoal twice): `q`'s first pass sees `p`'s trie still
    /// empty and must be redriven once `p` itself has found `X = a`.
    fn mutual_pq(engine: Rc<Engine>) -> (TabledPredicate, TabledPredicate) {
        let q_cell: Rc<RefCell<Option<TabledPredicate>>> = Rc::new(RefCell::new(None));
        let q_cell_for_p = Rc::clone(&q_cell);
        let p = TabledPredicate::new(Rc::clone(&engine), "p_mutual", move |args| {
            let x = Rc::clone(&args[0]);
            let q = q_cell_for_p.borrow().clone().expect("q is installed before its first call");
            disj(q.call(vec![Rc::clone(&x)]), eq(x, Term::symbol("a")))
        });
        let p_for_q = p.clone();
        let q = TabledPredicate::new(engine, "q_mutual", move |args| p_for_q.call(vec![Rc::clone(&args[0])]));
        *q_cell.borrow_mut() = Some(q.clone());
        (p, q)
    }

    #[test]
    fn mutually_recursive_predicates_complete_together() {
        let engine = Rc::new(Engine::new());
        let (_p, q) = mutual_pq(Rc::clone(&engine));
        let ctx = CancellationToken::new();
        let results = run_with_context(&ctx, 10, |query| q.call(vec![query]));
        assert_eq!(results, vec![Term::symbol("a")]);

        let store = Store::new();
        let (p_id, _, _) = engine.resolve_call("p_mutual", &[Term::symbol("a")], &store);
        let (q_id, _, _) = engine.resolve_call("q_mutual", &[Term::symbol("a")], &store);
        assert_eq!(engine.status(p_id), crate::tabling::subgoal::Status::Complete);
        assert_eq!(engine.status(q_id), crate::tabling::subgoal::Status::Complete);
    }

    #[test]
    fn repeated_calls_reuse_the_same_subgoal() {
        let engine = Rc::new(Engine::new());
        let path = path_pred(engine.clone());
        let ctx = CancellationToken::new();
        let _ = run_with_context(&ctx, 10, |q| path.call(vec![Term::symbol("a"), q]));
        let before = engine.answer_count(engine.resolve_call("path", &[Term::symbol("a"), Term::fresh()], &Store::new()).0);
        let _ = run_with_context(&ctx, 10, |q| path.call(vec![Term::symbol("a"), q]));
        let after = engine.answer_count(engine.resolve_call("path", &[Term::symbol("a"), Term::fresh()], &Store::new()).0);
        assert_eq!(before, after);
    }
}
