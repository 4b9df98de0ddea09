//! Finite-domain variables and the model that owns them.
//!
//! An FD variable is identified by id and paired with its domain;
//! generalized from "a domain posted by a relation" to a first-class
//! `Model` builder, since this crate exposes `NewModel`/`IntVar` directly
//! rather than threading domains through goal posting.
use crate::bitset::Bitset;

/// Identity of an FD variable, unique within the model that created it.
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct FdVarId(pub u32);

/// An FD variable as declared on a model: its id, initial domain, and an
/// optional name used for diagnostics.
#[derive(Clone, Debug)]
pub struct FdVar {
    pub id: FdVarId,
    pub domain: Bitset,
    pub name: Option<String>,
}

impl FdVar {
    pub fn new(id: FdVarId, domain: Bitset, name: Option<String>) -> FdVar {
        FdVar { id, domain, name }
    }
}
