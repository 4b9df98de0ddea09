//! The hybrid scheduler: runs the relational and
//! FD sub-solvers round-robin over a `UnifiedStore` until neither can
//! make further progress, bridging bindings across the two in both
//! directions.
//!
//! Grounded on `state/mod.rs::process_extension_fd`, which performs
//! exactly this bidirectional bridge (a relational binding narrows an FD
//! domain; a singleton FD domain promotes to a relational binding) inside
//! proto-vulcan's own monolithic `State`; generalized here into a
//! standalone `HybridSolver` driving a pluggable pair of sub-solvers per
//! the crate's "unified store + pluggable sub-solvers" design.
use crate::bitset::Bitset;
use crate::fd::model::Model;
use crate::fd::propagator::Failed;
use crate::fd::scheduler::propagate_to_fixpoint;
use crate::hybrid::registry::HybridRegistry;
use crate::hybrid::store::UnifiedStore;
use crate::term::{Term, Value};
use std::rc::Rc;

pub struct HybridSolver<'a> {
    pub model: &'a Model,
}

impl<'a> HybridSolver<'a> {
    pub fn new(model: &'a Model) -> HybridSolver<'a> {
        HybridSolver { model }
    }

    /// Runs the relational-to-FD and FD-to-relational bridges, and FD
    /// propagation to its own fixed point, repeatedly until a full round
    /// makes no further change. Returns `None` if the FD side fails or a
    /// promoted relational binding is rejected by an active relational
    /// constraint.
    pub fn propagate(&self, store: &UnifiedStore) -> Option<UnifiedStore> {
        let mut store = store.clone();
        loop {
            let (next, changed_rel_to_fd) = self.relational_to_fd(&store)?;
            store = next;

            store.fd = match propagate_to_fixpoint(self.model, &store.fd) {
                Ok(s) => s,
                Err(Failed) => return None,
            };

            let (next, changed_fd_to_rel) = self.fd_to_relational(&store)?;
            store = next;

            if !changed_rel_to_fd && !changed_fd_to_rel {
                return Some(store);
            }
        }
    }

    /// Bridges every registered relational binding `Var = Atom(int)` onto
    /// the corresponding FD domain by intersecting it with `{int}`.
    fn relational_to_fd(&self, store: &UnifiedStore) -> Option<(UnifiedStore, bool)> {
        let mut store = store.clone();
        let mut changed = false;
        let registry = Rc::clone(&store.registry);
        for (&rel_var, &fd_var) in registry.iter_rel_to_fd() {
            let walked = store.relational.walk(&Rc::new(Term::Var(rel_var, "_")));
            if let Term::Atom(Value::Int(v)) = walked.as_ref() {
                let max_value = self.model.variable(fd_var).domain.max_value();
                if *v < 1 || *v as u32 > max_value {
                    return None;
                }
                let narrowed = store
                    .fd
                    .get_domain(self.model, fd_var)
                    .intersect(&Bitset::singleton(max_value, *v as u32));
                if narrowed.is_empty() {
                    return None;
                }
                let (fd, did_change) = store.fd.set_domain(self.model, fd_var, narrowed);
                store.fd = fd;
                changed |= did_change;
            }
        }
        Some((store, changed))
    }

    /// Bridges every registered FD variable that has become a singleton
    /// onto a relational binding.
    fn fd_to_relational(&self, store: &UnifiedStore) -> Option<(UnifiedStore, bool)> {
        let mut store = store.clone();
        let mut changed = false;
        let registry = Rc::clone(&store.registry);
        for (&fd_var, &rel_var) in registry.iter_fd_to_rel() {
            if let Some(v) = store.fd.get_domain(self.model, fd_var).singleton_value() {
                let walked = store.relational.walk(&Rc::new(Term::Var(rel_var, "_")));
                if walked.is_var() {
                    let next = store.relational.bind(rel_var, Term::atom(v as i64))?;
                    store.relational = next;
                    changed = true;
                }
            }
        }
        Some((store, changed))
    }
}
