//! `Eq`, `Conj`, `Disj`, `Fresh`.
//!
//! Grounded on the conjunction/disjunction operators (the
//! `Dynamic(Rc<..>)` wrapping and `Stream::lazy_bind`/`Stream::lazy_mplus`
//! solve bodies) and the equality relation (unify-then-recheck-constraints),
//! generalized off the `User`/`Engine` parameters.
use crate::context::CancellationToken;
use crate::relational::goal::{Goal, GoalImpl};
use crate::relational::store::Store;
use crate::relational::stream::{LazyStream, Stream};
use crate::term::Term;
use std::rc::Rc;

#[derive(Debug)]
struct Eq {
    t1: Rc<Term>,
    t2: Rc<Term>,
}

impl GoalImpl for Eq {
    fn solve(&self, _ctx: &CancellationToken, store: Box<Store>) -> Stream {
        match store.unify(&self.t1, &self.t2) {
            Some(s) => Stream::unit(Box::new(s)),
            None => Stream::empty(),
        }
    }
}

/// `Eq(t1, t2)`: unify, honouring any active relational constraint.
pub fn eq(t1: Rc<Term>, t2: Rc<Term>) -> Goal {
    Goal::dynamic(Eq { t1, t2 })
}

#[derive(Debug)]
struct Conj {
    g1: Goal,
    g2: Goal,
}

impl GoalImpl for Conj {
    fn solve(&self, _ctx: &CancellationToken, store: Box<Store>) -> Stream {
        Stream::bind(Stream::pause(store, self.g1.clone()), self.g2.clone())
    }
}

/// Sequential composition: every store `g1` produces feeds into `g2`.
pub fn conj(g1: Goal, g2: Goal) -> Goal {
    if g1.is_succeed() {
        return g2;
    }
    if g2.is_succeed() {
        return g1;
    }
    if g1.is_fail() || g2.is_fail() {
        return Goal::Fail;
    }
    Goal::dynamic(Conj { g1, g2 })
}

/// Left-folds `conj` over a sequence of goals; empty input succeeds.
pub fn conj_all(goals: impl IntoIterator<Item = Goal>) -> Goal {
    let mut iter = goals.into_iter();
    let mut acc = match iter.next() {
        Some(g) => g,
        None => return Goal::Succeed,
    };
    for g in iter {
        acc = conj(acc, g);
    }
    acc
}

#[derive(Debug)]
struct Disj {
    g1: Goal,
    g2: Goal,
}

impl GoalImpl for Disj {
    fn solve(&self, _ctx: &CancellationToken, store: Box<Store>) -> Stream {
        Stream::lazy(LazyStream::mplus(
            LazyStream::pause(store.clone(), self.g1.clone()),
            LazyStream::pause(store, self.g2.clone()),
        ))
    }
}

/// Fair (breadth-first) disjunction: both branches are paused and
/// interleaved by `mplus` rather than one being run to exhaustion first, so
/// a productive second branch is not starved by a non-terminating first
/// one.
pub fn disj(g1: Goal, g2: Goal) -> Goal {
    if g1.is_fail() {
        return g2;
    }
    if g2.is_fail() {
        return g1;
    }
    Goal::dynamic(Disj { g1, g2 })
}

pub fn disj_all(goals: impl IntoIterator<Item = Goal>) -> Goal {
    let mut iter = goals.into_iter();
    let mut acc = match iter.next() {
        Some(g) => g,
        None => return Goal::Fail,
    };
    for g in iter {
        acc = disj(acc, g);
    }
    acc
}

/// Allocates a fresh logic variable. The name is cosmetic, shown in
/// `Display`/`Debug` output only; identity is always by `VarId`.
pub fn fresh(name: &'static str) -> Rc<Term> {
    Term::var(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relational::run::run;

    #[test]
    fn eq_unifies_a_fresh_query_with_an_atom() {
        let results = run(1, |q| eq(q, Term::atom(42i64)));
        assert_eq!(results, vec![Term::atom(42i64)]);
    }

    #[test]
    fn conj_threads_bindings_through_both_goals() {
        let results = run(1, |q| {
            let a = fresh("a");
            conj(eq(Rc::clone(&a), Term::atom(1i64)), eq(q, a))
        });
        assert_eq!(results, vec![Term::atom(1i64)]);
    }

    #[test]
    fn disj_produces_both_branches() {
        let mut results = run(2, |q| disj(eq(q.clone(), Term::atom(1i64)), eq(q, Term::atom(2i64))));
        results.sort_by_key(|t| format!("{}", t));
        assert_eq!(results, vec![Term::atom(1i64), Term::atom(2i64)]);
    }
}
