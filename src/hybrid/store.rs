//! The unified store: a relational `Store` and an FD `FdState`
//! that share variable identities through a `HybridRegistry`.
//!
//! Grounded directly on `state/mod.rs`'s `State` struct, which already
//! carries `smap`/`cstore`/`dstore` side by side in one value; this crate
//! splits that into a separately-testable `UnifiedStore` wrapping the
//! already-independent relational `Store` and FD `FdState`.
use crate::fd::model::Model;
use crate::fd::state::FdState;
use crate::hybrid::registry::HybridRegistry;
use crate::relational::store::Store;
use crate::term::{Term, Value, VarId};
use std::rc::Rc;

#[derive(Clone, Debug)]
pub struct UnifiedStore {
    pub relational: Store,
    pub fd: FdState,
    pub registry: Rc<HybridRegistry>,
}

impl UnifiedStore {
    pub fn new(registry: HybridRegistry) -> UnifiedStore {
        UnifiedStore {
            relational: Store::new(),
            fd: FdState::initial(),
            registry: Rc::new(registry),
        }
    }

    /// The integer a variable is bound to, if any: either a direct
    /// relational binding to an `Atom(Int)`, or a singleton FD domain for
    /// the variable it is registered against.
    pub fn get_binding(&self, model: &Model, var: VarId) -> Option<i64> {
        let walked = self.relational.walk(&Rc::new(Term::Var(var, "_")));
        if let Term::Atom(Value::Int(i)) = walked.as_ref() {
            return Some(*i);
        }
        let fd_id = self.registry.fd_var_of(var)?;
        self.fd.get_domain(model, fd_id).singleton_value().map(|v| v as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitset::Bitset;

    #[test]
    fn binding_is_visible_through_a_direct_relational_bind() {
        let model = Model::new();
        let registry = HybridRegistry::new();
        let mut store = UnifiedStore::new(registry);
        let v = Term::fresh();
        store.relational = store.relational.bind(v.var_id().unwrap(), Term::atom(7i64)).unwrap();
        assert_eq!(store.get_binding(&model, v.var_id().unwrap()), Some(7));
    }

    #[test]
    fn binding_is_visible_through_a_singleton_fd_overlay() {
        let mut model = Model::new();
        let fd_var = model.int_var(Bitset::full(10), None);
        let rel_var = VarId::fresh();
        let registry = HybridRegistry::new().map_vars(rel_var, fd_var).unwrap();
        let mut store = UnifiedStore::new(registry);
        let (fd_state, _) = store.fd.set_domain(&model, fd_var, Bitset::singleton(10, 4));
        store.fd = fd_state;
        assert_eq!(store.get_binding(&model, rel_var), Some(4));
    }
}
