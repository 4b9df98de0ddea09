//! The relational constraint store: substitution plus the set of active
//! relational constraints. `clone` is an independent logical
//! snapshot; persistent `Rc` sharing of the constraint list means cloning
//! a store with no new constraints is O(1).
use crate::relational::constraint::{CheckResult, RelationalConstraint};
use crate::substitution::{unify, Substitution};
use crate::term::{Term, VarId};
use std::rc::Rc;

#[derive(Clone, Debug, Default)]
pub struct Store {
    pub smap: Substitution,
    constraints: Rc<Vec<Rc<dyn RelationalConstraint>>>,
}

impl Store {
    pub fn new() -> Store {
        Store { smap: Substitution::new(), constraints: Rc::new(Vec::new()) }
    }

    pub fn walk(&self, t: &Rc<Term>) -> Rc<Term> {
        Rc::clone(self.smap.walk(t))
    }

    pub fn deep_walk(&self, t: &Rc<Term>) -> Rc<Term> {
        self.smap.deep_walk(t)
    }

    /// Extends the substitution with `var_id -> value`, then re-checks
    /// every active constraint. Returns `None` if the binding violates any
    /// of them.
    pub fn bind(&self, var_id: VarId, value: Rc<Term>) -> Option<Store> {
        let smap = self.smap.extend(var_id, value);
        let mut next = Store { smap, constraints: Rc::clone(&self.constraints) };
        next.recheck_constraints()
    }

    /// Attempts to unify `t1` and `t2`, then re-checks constraints exactly
    /// as `bind` does (unification may extend the substitution at several
    /// variables at once).
    pub fn unify(&self, t1: &Rc<Term>, t2: &Rc<Term>) -> Option<Store> {
        let smap = unify(&self.smap, t1, t2)?;
        let mut next = Store { smap, constraints: Rc::clone(&self.constraints) };
        next.recheck_constraints()
    }

    pub fn add_constraint(&self, c: Rc<dyn RelationalConstraint>) -> Option<Store> {
        match c.check(&self.smap) {
            CheckResult::Violated => None,
            CheckResult::Satisfied => Some(self.clone()),
            CheckResult::Pending => {
                let mut constraints = (*self.constraints).clone();
                constraints.push(c);
                Some(Store { smap: self.smap.clone(), constraints: Rc::new(constraints) })
            }
        }
    }

    fn recheck_constraints(&mut self) -> Option<Store> {
        let mut kept = Vec::with_capacity(self.constraints.len());
        for c in self.constraints.iter() {
            match c.check(&self.smap) {
                CheckResult::Violated => return None,
                CheckResult::Satisfied => {}
                CheckResult::Pending => kept.push(Rc::clone(c)),
            }
        }
        Some(Store { smap: self.smap.clone(), constraints: Rc::new(kept) })
    }

    pub fn active_constraint_count(&self) -> usize {
        self.constraints.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relational::constraint::Disequality;

    #[test]
    fn pending_constraint_becomes_violated_on_binding() {
        let store = Store::new();
        let v = Term::fresh();
        let store = store
            .add_constraint(Rc::new(Disequality { t1: Rc::clone(&v), t2: Term::atom(1i64) }))
            .unwrap();
        assert_eq!(store.active_constraint_count(), 1);
        assert!(store.bind(v.var_id().unwrap(), Term::atom(1i64)).is_none());
    }

    #[test]
    fn pending_constraint_survives_an_unrelated_binding() {
        let store = Store::new();
        let v = Term::fresh();
        let other = Term::fresh();
        let store = store
            .add_constraint(Rc::new(Disequality { t1: Rc::clone(&v), t2: Term::atom(1i64) }))
            .unwrap();
        let store = store.bind(other.var_id().unwrap(), Term::atom(2i64)).unwrap();
        assert_eq!(store.active_constraint_count(), 1);
    }
}
