//! The hybrid registry: an immutable, bidirectional mapping between
//! relational variable ids and FD variable ids.
//!
//! Grounded on `state/mod.rs::process_extension_fd`/`resolve_storable_domain`,
//! which already carry an implicit per-`State` mapping from a relational
//! `Var` to its FD domain slot; lifted here into a standalone, explicitly
//! immutable value so registration can be validated and rejected before a
//! solver ever sees it, and rejects mappings that conflict with an
//! existing one in either direction.
use crate::error::{Error, Result};
use crate::fd::variable::FdVarId;
use crate::term::VarId;
use std::collections::HashMap;

#[derive(Clone, Debug, Default)]
pub struct HybridRegistry {
    rel_to_fd: HashMap<VarId, FdVarId>,
    fd_to_rel: HashMap<FdVarId, VarId>,
}

impl HybridRegistry {
    pub fn new() -> HybridRegistry {
        HybridRegistry {
            rel_to_fd: HashMap::new(),
            fd_to_rel: HashMap::new(),
        }
    }

    /// Returns a new registry with `rel` additionally mapped to `fd`.
    /// Rejects the mapping if either id is already registered to a
    /// *different* counterpart.
    pub fn map_vars(&self, rel: VarId, fd: FdVarId) -> Result<HybridRegistry> {
        if let Some(existing) = self.rel_to_fd.get(&rel) {
            if *existing != fd {
                return Err(Error::invalid_argument(
                    "HybridRegistry::map_vars",
                    format!("relational var {:?} already mapped to a different FD var", rel),
                ));
            }
        }
        if let Some(existing) = self.fd_to_rel.get(&fd) {
            if *existing != rel {
                return Err(Error::invalid_argument(
                    "HybridRegistry::map_vars",
                    format!("FD var {:?} already mapped to a different relational var", fd),
                ));
            }
        }
        let mut rel_to_fd = self.rel_to_fd.clone();
        let mut fd_to_rel = self.fd_to_rel.clone();
        rel_to_fd.insert(rel, fd);
        fd_to_rel.insert(fd, rel);
        Ok(HybridRegistry { rel_to_fd, fd_to_rel })
    }

    pub fn fd_var_of(&self, rel: VarId) -> Option<FdVarId> {
        self.rel_to_fd.get(&rel).copied()
    }

    pub fn rel_var_of(&self, fd: FdVarId) -> Option<VarId> {
        self.fd_to_rel.get(&fd).copied()
    }

    pub fn len(&self) -> usize {
        self.rel_to_fd.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rel_to_fd.is_empty()
    }

    pub fn iter_rel_to_fd(&self) -> impl Iterator<Item = (&VarId, &FdVarId)> {
        self.rel_to_fd.iter()
    }

    pub fn iter_fd_to_rel(&self) -> impl Iterator<Item = (&FdVarId, &VarId)> {
        self.fd_to_rel.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_vars_is_queryable_from_both_directions() {
        let registry = HybridRegistry::new();
        let rel = VarId::fresh();
        let fd = FdVarId(0);
        let registry = registry.map_vars(rel, fd).unwrap();
        assert_eq!(registry.fd_var_of(rel), Some(fd));
        assert_eq!(registry.rel_var_of(fd), Some(rel));
    }

    #[test]
    fn remapping_the_same_pair_is_idempotent() {
        let registry = HybridRegistry::new();
        let rel = VarId::fresh();
        let fd = FdVarId(0);
        let registry = registry.map_vars(rel, fd).unwrap();
        assert!(registry.map_vars(rel, fd).is_ok());
    }

    #[test]
    fn conflicting_mapping_is_rejected() {
        let registry = HybridRegistry::new();
        let rel = VarId::fresh();
        let registry = registry.map_vars(rel, FdVarId(0)).unwrap();
        assert!(registry.map_vars(rel, FdVarId(1)).is_err());
    }
}
