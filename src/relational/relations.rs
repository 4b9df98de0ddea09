//! The standard relation library: type and disequality constraint
//! posting, list deconstruction, `membero`, `appendo`, `onceo`, `conda`,
//! `condu`, `project`, and the term-inspection relations (`ground`,
//! `copy_term`, `arityo`, `functoro`, `compound_termo`, `simple_termo`).
//!
//! Grounded on the disequality/type-constraint posting idiom and the
//! once/soft-cut/project operators this library builds on, generalized
//! off `User`/`Engine`.
use crate::context::CancellationToken;
use crate::relational::combinators::{conj, disj, eq, fresh};
use crate::relational::constraint::{Absence, Disequality, TypeConstraint, TypeKind};
use crate::relational::goal::{Goal, GoalImpl};
use crate::relational::store::Store;
use crate::relational::stream::Stream;
use crate::term::{Term, VarId};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
struct Neq {
    t1: Rc<Term>,
    t2: Rc<Term>,
}

impl GoalImpl for Neq {
    fn solve(&self, _ctx: &CancellationToken, store: Box<Store>) -> Stream {
        match store.add_constraint(Rc::new(Disequality { t1: Rc::clone(&self.t1), t2: Rc::clone(&self.t2) })) {
            Some(s) => Stream::unit(Box::new(s)),
            None => Stream::empty(),
        }
    }
}

pub fn neq(t1: Rc<Term>, t2: Rc<Term>) -> Goal {
    Goal::dynamic(Neq { t1, t2 })
}

#[derive(Debug)]
struct Absento {
    needle: Rc<Term>,
    haystack: Rc<Term>,
}

impl GoalImpl for Absento {
    fn solve(&self, _ctx: &CancellationToken, store: Box<Store>) -> Stream {
        match store.add_constraint(Rc::new(Absence {
            needle: Rc::clone(&self.needle),
            haystack: Rc::clone(&self.haystack),
        })) {
            Some(s) => Stream::unit(Box::new(s)),
            None => Stream::empty(),
        }
    }
}

pub fn absento(needle: Rc<Term>, haystack: Rc<Term>) -> Goal {
    Goal::dynamic(Absento { needle, haystack })
}

#[derive(Debug)]
struct Typeo {
    t: Rc<Term>,
    kind: TypeKind,
}

impl GoalImpl for Typeo {
    fn solve(&self, _ctx: &CancellationToken, store: Box<Store>) -> Stream {
        match store.add_constraint(Rc::new(TypeConstraint { term: Rc::clone(&self.t), kind: self.kind })) {
            Some(s) => Stream::unit(Box::new(s)),
            None => Stream::empty(),
        }
    }
}

pub fn symbolo(t: Rc<Term>) -> Goal {
    Goal::dynamic(Typeo { t, kind: TypeKind::Symbol })
}
pub fn numbero(t: Rc<Term>) -> Goal {
    Goal::dynamic(Typeo { t, kind: TypeKind::Number })
}
pub fn stringo(t: Rc<Term>) -> Goal {
    Goal::dynamic(Typeo { t, kind: TypeKind::String })
}
pub fn booleano(t: Rc<Term>) -> Goal {
    Goal::dynamic(Typeo { t, kind: TypeKind::Boolean })
}
pub fn vectoro(t: Rc<Term>) -> Goal {
    Goal::dynamic(Typeo { t, kind: TypeKind::Vector })
}

/// `t` is the empty list.
pub fn nullo(t: Rc<Term>) -> Goal {
    eq(t, Term::nil)
}

/// `t` is a cons cell, with `car`/`cdr` left fresh.
pub fn pairo(t: Rc<Term>) -> Goal {
    let car = fresh("_car");
    let cdr = fresh("_cdr");
    eq(t, Term::cons(car, cdr))
}

pub fn car(pair: Rc<Term>, a: Rc<Term>) -> Goal {
    let d = fresh("_cdr");
    eq(pair, Term::cons(a, d))
}

pub fn cdr(pair: Rc<Term>, d: Rc<Term>) -> Goal {
    let a = fresh("_car");
    eq(pair, Term::cons(a, d))
}

pub fn cons(a: Rc<Term>, d: Rc<Term>, pair: Rc<Term>) -> Goal {
    eq(pair, Term::cons(a, d))
}

/// `membero(x, l)`: `x` occurs somewhere in the (possibly improper, possibly
/// partial) list `l`.
pub fn membero(x: Rc<Term>, l: Rc<Term>) -> Goal {
    let car = fresh("_car");
    let cdr = fresh("_cdr");
    conj(
        eq(Rc::clone(&l), Term::cons(Rc::clone(&car), Rc::clone(&cdr))),
        disj(eq(x.clone(), car), membero_lazy(x, cdr)),
    )
}

fn membero_lazy(x: Rc<Term>, l: Rc<Term>) -> Goal {
    #[derive(Debug)]
    struct MemberoTail {
        x: Rc<Term>,
        l: Rc<Term>,
    }
    impl GoalImpl for MemberoTail {
        fn solve(&self, ctx: &CancellationToken, store: Box<Store>) -> Stream {
            membero(Rc::clone(&self.x), Rc::clone(&self.l)).solve(ctx, store)
        }
    }
    Goal::dynamic(MemberoTail { x, l })
}

/// `appendo(front, back, whole)`: `whole` is `front` concatenated with
/// `back`; a functional round trip in all three directions when the
/// relevant arguments are ground.
pub fn appendo(front: Rc<Term>, back: Rc<Term>, whole: Rc<Term>) -> Goal {
    disj(
        conj(nullo(Rc::clone(&front)), eq(back.clone(), whole.clone())),
        appendo_recurse(front, back, whole),
    )
}

fn appendo_recurse(front: Rc<Term>, back: Rc<Term>, whole: Rc<Term>) -> Goal {
    #[derive(Debug)]
    struct AppendoRecurse {
        front: Rc<Term>,
        back: Rc<Term>,
        whole: Rc<Term>,
    }
    impl GoalImpl for AppendoRecurse {
        fn solve(&self, ctx: &CancellationToken, store: Box<Store>) -> Stream {
            let car = fresh("_car");
            let cdr = fresh("_cdr");
            let rest = fresh("_rest");
            let g = conj(
                eq(Rc::clone(&self.front), Term::cons(Rc::clone(&car), Rc::clone(&cdr))),
                conj(
                    eq(Rc::clone(&self.whole), Term::cons(car, Rc::clone(&rest))),
                    appendo(cdr, Rc::clone(&self.back), rest),
                ),
            );
            g.solve(ctx, store)
        }
    }
    Goal::dynamic(AppendoRecurse { front, back, whole })
}

/// `onceo(g)`: takes only the first answer of `g`.
pub fn onceo(g: Goal) -> Goal {
    #[derive(Debug)]
    struct Onceo(Goal);
    impl GoalImpl for Onceo {
        fn solve(&self, ctx: &CancellationToken, store: Box<Store>) -> Stream {
            let results = self.0.solve(ctx, store).take(ctx, 1);
            match results.into_iter().next() {
                Some(s) => Stream::unit(s),
                None => Stream::empty(),
            }
        }
    }
    Goal::dynamic(Onceo(g))
}

/// `conda(clauses)`: soft-cut. Tries each `(condition, body)` clause in
/// order; commits to the first whose condition succeeds at all (running
/// every answer of its body), without backtracking into later clauses even
/// if the body later fails.
pub fn conda(clauses: Vec<(Goal, Goal)>) -> Goal {
    #[derive(Debug)]
    struct Conda(Vec<(Goal, Goal)>);
    impl GoalImpl for Conda {
        fn solve(&self, ctx: &CancellationToken, store: Box<Store>) -> Stream {
            for (cond, body) in &self.0 {
                let first = cond.solve(ctx, store.clone()).take(ctx, 1);
                if let Some(committed) = first.into_iter().next() {
                    return conj(eq(Term::nil, Term::nil), body.clone())
                        .solve(ctx, committed);
                }
            }
            Stream::empty()
        }
    }
    Goal::dynamic(Conda(clauses))
}

/// `condu(clauses)`: like `conda`, but also takes only the first answer of
/// the committed condition (a combined soft-cut + `onceo` on the test).
pub fn condu(clauses: Vec<(Goal, Goal)>) -> Goal {
    condu_from(clauses.into_iter().map(|(c, b)| (onceo(c), b)).collect())
}

fn condu_from(clauses: Vec<(Goal, Goal)>) -> Goal {
    conda(clauses)
}

/// `project(vars, f)`: deep-walks `vars` under the current store and
/// builds the continuation goal from the resolved terms.
pub fn project(vars: Vec<Rc<Term>>, f: impl Fn(Vec<Rc<Term>>) -> Goal + 'static) -> Goal {
    #[derive(derivative::Derivative)]
    #[derivative(Debug)]
    struct Project {
        vars: Vec<Rc<Term>>,
        #[derivative(Debug = "ignore")]
        f: Rc<dyn Fn(Vec<Rc<Term>>) -> Goal>,
    }
    impl GoalImpl for Project {
        fn solve(&self, ctx: &CancellationToken, store: Box<Store>) -> Stream {
            let walked: Vec<Rc<Term>> = self.vars.iter().map(|v| store.deep_walk(v)).collect();
            (self.f)(walked).solve(ctx, store)
        }
    }
    Goal::dynamic(Project { vars, f: Rc::new(f) })
}

/// `ground(t)`: succeeds iff `t` has no unbound variables once deep-walked.
pub fn ground(t: Rc<Term>) -> Goal {
    #[derive(Debug)]
    struct Ground(Rc<Term>);
    impl GoalImpl for Ground {
        fn solve(&self, _ctx: &CancellationToken, store: Box<Store>) -> Stream {
            if store.deep_walk(&self.0).is_ground_shape() {
                Stream::unit(store)
            } else {
                Stream::empty()
            }
        }
    }
    Goal::dynamic(Ground(t))
}

fn copy_term_rec(t: &Rc<Term>, store: &Store, renames: &mut HashMap<VarId, Rc<Term>>) -> Rc<Term> {
    let walked = store.walk(t);
    match walked.as_ref() {
        Term::Var(id, _) => renames.entry(*id).or_insert_with(Term::fresh).clone(),
        Term::Pair(car, cdr) => {
            let car = copy_term_rec(car, store, renames);
            let cdr = copy_term_rec(cdr, store, renames);
            Term::cons(car, cdr)
        }
        _ => walked,
    }
}

/// `copy_term(t, c)`: `c` is `t` with every variable reachable from it
/// consistently renamed to a fresh one (shared variables in `t` remain
/// shared in `c`).
pub fn copy_term(t: Rc<Term>, c: Rc<Term>) -> Goal {
    #[derive(Debug)]
    struct CopyTerm {
        t: Rc<Term>,
        c: Rc<Term>,
    }
    impl GoalImpl for CopyTerm {
        fn solve(&self, ctx: &CancellationToken, store: Box<Store>) -> Stream {
            let mut renames = HashMap::new();
            let copy = copy_term_rec(&self.t, &store, &mut renames);
            eq(Rc::clone(&self.c), copy).solve(ctx, store)
        }
    }
    Goal::dynamic(CopyTerm { t, c })
}

/// `arityo(t, n)`: `n` is the length of the proper list `t`.
pub fn arityo(t: Rc<Term>, n: Rc<Term>) -> Goal {
    #[derive(Debug)]
    struct Arityo {
        t: Rc<Term>,
        n: Rc<Term>,
    }
    impl GoalImpl for Arityo {
        fn solve(&self, ctx: &CancellationToken, store: Box<Store>) -> Stream {
            let walked = store.deep_walk(&self.t);
            match walked.to_vec() {
                Some(items) => eq(Rc::clone(&self.n), Term::atom(items.len() as i64)).solve(ctx, store),
                None => Stream::empty(),
            }
        }
    }
    Goal::dynamic(Arityo { t, n })
}

/// `functoro(t, name, args)`: `t` decomposes as `(name . args)`, treating
/// the head of the list as the "functor" symbol, per the closed Term
/// algebra's absence of a separate compound/struct tag.
pub fn functoro(t: Rc<Term>, name: Rc<Term>, args: Rc<Term>) -> Goal {
    eq(t, Term::cons(name, args))
}

/// `compound_termo(t)`: `t` is a pair.
pub fn compound_termo(t: Rc<Term>) -> Goal {
    pairo(t)
}

/// `simple_termo(t)`: `t` is an atom, `nil`, or still unbound -- anything
/// that is not a pair.
pub fn simple_termo(t: Rc<Term>) -> Goal {
    #[derive(Debug)]
    struct SimpleTermo(Rc<Term>);
    impl GoalImpl for SimpleTermo {
        fn solve(&self, _ctx: &CancellationToken, store: Box<Store>) -> Stream {
            if store.walk(&self.0).is_pair() {
                Stream::empty()
            } else {
                Stream::unit(store)
            }
        }
    }
    Goal::dynamic(SimpleTermo(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relational::run::run;

    #[test]
    fn neq_then_eq_to_the_forbidden_value_fails() {
        let results = run(1, |q| {
            conj(neq(Rc::clone(&q), Term::symbol("forbidden")), eq(q, Term::symbol("forbidden")))
        });
        assert!(results.is_empty());
    }

    #[test]
    fn membero_enumerates_every_element() {
        let list = Term::from_vec(vec![Term::atom(1i64), Term::atom(2i64), Term::atom(3i64)]);
        let mut results = crate::relational::run::run_star(move |q| membero(q, Rc::clone(&list)));
        results.sort_by_key(|t| t.to_string());
        assert_eq!(results, vec![Term::atom(1i64), Term::atom(2i64), Term::atom(3i64)]);
    }

    #[test]
    fn appendo_concatenates_ground_lists() {
        let front = Term::from_vec(vec![Term::atom(1i64), Term::atom(2i64)]);
        let back = Term::from_vec(vec![Term::atom(3i64)]);
        let results = run(1, move |q| appendo(Rc::clone(&front), Rc::clone(&back), q));
        assert_eq!(
            results[0].to_vec(),
            Some(vec![Term::atom(1i64), Term::atom(2i64), Term::atom(3i64)])
        );
    }

    #[test]
    fn ground_rejects_a_fresh_variable() {
        let results = run(1, |q| conj(ground(Rc::clone(&q)), eq(q, Term::atom(1i64))));
        assert!(results.is_empty());
    }

    #[test]
    fn copy_term_shares_repeated_variables() {
        let results = run(1, |q| {
            let v = fresh("v");
            let t = Term::cons(Rc::clone(&v), v);
            copy_term(t, q)
        });
        match results[0].as_ref() {
            Term::Pair(car, cdr) => assert_eq!(car.var_id(), cdr.var_id()),
            _ => panic!("expected a pair of shared fresh variables"),
        }
    }
}
