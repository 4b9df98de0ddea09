//! Persistent substitution and structural unification.
//!
//! Mirrors the classic `SMap`/`unify_rec` pair: a substitution is an
//! immutable map from variable id to term, extended copy-on-write, walked
//! non-recursively for the variable itself and recursively (`deep_walk`) when
//! a fully resolved term is needed.
use crate::term::{Term, VarId};
use std::collections::HashMap;
use std::rc::Rc;

/// Persistent mapping from variable id to the term it is bound to.
#[derive(Clone, Debug, Default)]
pub struct Substitution {
    bindings: HashMap<VarId, Rc<Term>>,
}

impl Substitution {
    pub fn new() -> Substitution {
        Substitution {
            bindings: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Follows a chain of variable bindings until a non-variable term, an
    /// unbound variable, or a cycle guard is reached. Does not recurse into
    /// pair structure.
    pub fn walk<'a>(&'a self, term: &'a Rc<Term>) -> &'a Rc<Term> {
        let mut current = term;
        loop {
            match current.as_ref() {
                Term::Var(id, _) => match self.bindings.get(id) {
                    Some(bound) => current = bound,
                    None => return current,
                },
                _ => return current,
            }
        }
    }

    /// Walks `term`, and if it is a pair, recursively walks its car/cdr too,
    /// producing a term with no bound variables reachable from its root.
    pub fn deep_walk(&self, term: &Rc<Term>) -> Rc<Term> {
        let walked = Rc::clone(self.walk(term));
        match walked.as_ref() {
            Term::Pair(car, cdr) => Term::cons(self.deep_walk(car), self.deep_walk(cdr)),
            _ => walked,
        }
    }

    /// Returns true if extending the substitution with `var -> value` would
    /// create a cyclic binding (`var` reachable from within `value`).
    pub fn occurs_check(&self, var: &Rc<Term>, value: &Rc<Term>) -> bool {
        let var_id = match var.as_ref() {
            Term::Var(id, _) => *id,
            _ => return false,
        };
        let walked = self.walk(value);
        match walked.as_ref() {
            Term::Var(id, _) => *id == var_id,
            Term::Pair(car, cdr) => self.occurs_check(var, car) || self.occurs_check(var, cdr),
            _ => false,
        }
    }

    /// Extends the substitution, returning a new substitution (copy-on-write
    /// at the `Rc` level: unrelated entries are not touched).
    pub fn extend(&self, var_id: VarId, value: Rc<Term>) -> Substitution {
        let mut bindings = self.bindings.clone();
        bindings.insert(var_id, value);
        Substitution { bindings }
    }

    pub fn get(&self, var_id: VarId) -> Option<&Rc<Term>> {
        self.bindings.get(&var_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VarId, &Rc<Term>)> {
        self.bindings.iter()
    }
}

/// Attempts to unify `u` and `v` under substitution `smap`, returning the
/// (possibly unchanged) extended substitution on success.
///
/// Occurs-check is performed for every variable-to-term binding: a binding
/// that would make the variable reachable from its own value is rejected.
pub fn unify(smap: &Substitution, u: &Rc<Term>, v: &Rc<Term>) -> Option<Substitution> {
    let uwalk = Rc::clone(smap.walk(u));
    let vwalk = Rc::clone(smap.walk(v));
    match (uwalk.as_ref(), vwalk.as_ref()) {
        (Term::Var(uid, _), Term::Var(vid, _)) if uid == vid => Some(smap.clone()),
        (Term::Var(uid, _), _) => {
            if smap.occurs_check(&uwalk, &vwalk) {
                None
            } else {
                Some(smap.extend(*uid, vwalk))
            }
        }
        (_, Term::Var(vid, _)) => {
            if smap.occurs_check(&vwalk, &uwalk) {
                None
            } else {
                Some(smap.extend(*vid, uwalk))
            }
        }
        (Term::Atom(a), Term::Atom(b)) if a == b => Some(smap.clone()),
        (Term::Nil, Term::Nil) => Some(smap.clone()),
        (Term::Pair(ucar, ucdr), Term::Pair(vcar, vcdr)) => {
            let smap = unify(smap, ucar, vcar)?;
            unify(&smap, ucdr, vcdr)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_unifies_with_var_by_extension() {
        let smap = Substitution::new();
        let v1 = Term::fresh();
        let v2 = Term::fresh();
        let result = unify(&smap, &v1, &v2).unwrap();
        assert!(!result.is_empty());
    }

    #[test]
    fn same_var_unifies_without_extension() {
        let smap = Substitution::new();
        let v0 = Term::fresh();
        let v1 = Term::fresh();
        let v2 = Term::fresh();
        let smap = smap.extend(v1.var_id().unwrap(), Rc::clone(&v0));
        let smap = smap.extend(v2.var_id().unwrap(), Rc::clone(&v0));
        let result = unify(&smap, &v1, &v2).unwrap();
        assert_eq!(result.len(), smap.len());
    }

    #[test]
    fn var_binds_to_atom() {
        let smap = Substitution::new();
        let v = Term::fresh();
        let result = unify(&smap, &v, &Term::atom(1i64)).unwrap();
        assert_eq!(result.deep_walk(&v).as_ref(), &Term::Atom(1i64.into()));
    }

    #[test]
    fn mismatched_atoms_fail() {
        let smap = Substitution::new();
        assert!(unify(&smap, &Term::atom(1i64), &Term::atom(2i64)).is_none());
    }

    #[test]
    fn pairs_unify_elementwise() {
        let smap = Substitution::new();
        let a = Term::from_vec(vec![Term::atom(1i64)]);
        let b = Term::from_vec(vec![Term::atom(1i64)]);
        assert!(unify(&smap, &a, &b).is_some());
        let c = Term::from_vec(vec![Term::atom(2i64)]);
        assert!(unify(&smap, &a, &c).is_none());
    }

    #[test]
    fn occurs_check_rejects_cyclic_binding() {
        let smap = Substitution::new();
        let v = Term::fresh();
        let cyclic = Term::cons(Rc::clone(&v), Term::nil());
        assert!(unify(&smap, &v, &cyclic).is_none());
    }

    #[test]
    fn deep_walk_resolves_nested_bindings() {
        let smap = Substitution::new();
        let v0 = Term::fresh();
        let v1 = Term::fresh();
        let list = Term::from_vec(vec![Rc::clone(&v1)]);
        let smap = smap.extend(v0.var_id().unwrap(), list);
        let smap = smap.extend(v1.var_id().unwrap(), Term::atom(42i64));
        let resolved = smap.deep_walk(&v0);
        assert_eq!(resolved.to_vec(), Some(vec![Term::atom(42i64)]));
    }
}
