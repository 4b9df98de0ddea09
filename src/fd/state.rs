//! Copy-on-write overlay of FD variable domains over a model's initial
//! domains.
//!
//! Grounded on `state/mod.rs`'s `dstore` overlay field and its COW
//! `Rc::make_mut`-style extension; generalized into a standalone map keyed
//! by FD variable id, independent of the relational `State`.
use crate::bitset::Bitset;
use crate::fd::model::Model;
use crate::fd::variable::FdVarId;
use std::collections::HashMap;
use std::rc::Rc;

/// A persistent overlay: `map<var id, domain>` holding only the variables
/// whose domain has diverged from the model's initial domain.
#[derive(Clone, Debug)]
pub struct FdState {
    overlay: Rc<HashMap<FdVarId, Bitset>>,
}

impl FdState {
    /// The initial state of a model: no variable has been touched yet.
    pub fn initial() -> FdState {
        FdState {
            overlay: Rc::new(HashMap::new()),
        }
    }

    /// Returns the overlay entry if present, otherwise the model's initial
    /// domain for `id`.
    pub fn get_domain<'a>(&'a self, model: &'a Model, id: FdVarId) -> &'a Bitset {
        self.overlay
            .get(&id)
            .unwrap_or_else(|| &model.variable(id).domain)
    }

    /// Returns a new state with `id`'s domain set to `d`, and whether it
    /// actually changed anything (`d` differs from the current domain).
    pub fn set_domain(&self, model: &Model, id: FdVarId, d: Bitset) -> (FdState, bool) {
        if d.equal(self.get_domain(model, id)) {
            return (self.clone(), false);
        }
        let mut overlay = (*self.overlay).clone();
        overlay.insert(id, d);
        (
            FdState {
                overlay: Rc::new(overlay),
            },
            true,
        )
    }

    pub fn touched(&self) -> impl Iterator<Item = &FdVarId> {
        self.overlay.keys()
    }

    pub fn is_consistent(&self) -> bool {
        self.overlay.values().all(|d| !d.is_empty())
    }
}

impl Default for FdState {
    fn default() -> FdState {
        FdState::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fd::model::Model;

    #[test]
    fn set_domain_is_observable_and_isolated() {
        let mut model = Model::new();
        let x = model.int_var(Bitset::full(10), None);
        let y = model.int_var(Bitset::full(10), None);
        let s0 = FdState::initial();
        let (s1, changed) = s0.set_domain(&model, x, Bitset::singleton(10, 3));
        assert!(changed);
        assert_eq!(s1.get_domain(&model, x).singleton_value(), Some(3));
        assert_eq!(s1.get_domain(&model, y), s0.get_domain(&model, y));
    }

    #[test]
    fn set_domain_to_equal_value_reports_unchanged() {
        let mut model = Model::new();
        let x = model.int_var(Bitset::full(10), None);
        let s0 = FdState::initial();
        let (s1, changed) = s0.set_domain(&model, x, Bitset::full(10));
        assert!(!changed);
        assert_eq!(s1.get_domain(&model, x), s0.get_domain(&model, x));
    }
}
