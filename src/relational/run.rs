//! `Run`/`RunStar`/`RunWithContext`.
//!
//! Grounded on `query.rs`'s `Query`/`run` shape (allocate a fresh query
//! variable, solve the goal it builds against an empty state, deep-walk
//! the results) generalized off the `User`/`Engine` parameters onto this
//! crate's closed `Term`/`Store`/`Goal`.
use crate::context::CancellationToken;
use crate::relational::goal::Goal;
use crate::relational::store::Store;
use crate::term::Term;
use std::rc::Rc;

/// Allocates a fresh `q`, evaluates `goal(q)` against an empty store, takes
/// up to `n` results (`n == 0` means unbounded) and deep-walks `q` in each.
pub fn run(n: usize, goal: impl FnOnce(Rc<Term>) -> Goal) -> Vec<Rc<Term>> {
    run_with_context(&CancellationToken::new(), n, goal)
}

/// Like `run`, but takes every answer; the caller is responsible for the
/// goal actually terminating.
pub fn run_star(goal: impl FnOnce(Rc<Term>) -> Goal) -> Vec<Rc<Term>> {
    run_with_context(&CancellationToken::new(), 0, goal)
}

/// `run`, but driven by a caller-supplied cancellation token so the search
/// can be aborted from another part of the program (a timer, a parallel
/// sibling finishing first, and so on).
pub fn run_with_context(
    ctx: &CancellationToken,
    n: usize,
    goal: impl FnOnce(Rc<Term>) -> Goal,
) -> Vec<Rc<Term>> {
    let q = Term::fresh();
    let g = goal(Rc::clone(&q));
    let store = Box::new(Store::new());
    let stores = g.solve(ctx, store).take(ctx, n);
    stores.into_iter().map(|s| s.deep_walk(&q)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relational::combinators::eq;

    #[test]
    fn run_of_eq_returns_the_walked_term() {
        let results = run(1, |q| eq(q, Term::atom(42i64)));
        assert_eq!(results, vec![Term::atom(42i64)]);
    }

    #[test]
    fn run_zero_n_means_unbounded_take() {
        let results = run(0, |q| eq(q, Term::symbol("x")));
        assert_eq!(results, vec![Term::symbol("x")]);
    }
}
