//! An FD model: an ordered list of variables, an ordered list of
//! propagators, and a configuration struct.
//!
//! Grounded on the FD variable bookkeeping and the `infd`/`infdrange`
//! relations that assign initial domains; generalized to a first-class
//! model builder.
use crate::bitset::Bitset;
use crate::fd::propagator::Propagator;
use crate::fd::variable::{FdVar, FdVarId};
use std::rc::Rc;

/// Variable-selection heuristic used by the backtracking search.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VariableHeuristic {
    /// Smallest remaining domain first.
    Dom,
    /// Highest constraint degree first.
    Deg,
    /// Declaration order.
    InOrder,
}

/// Value-ordering heuristic used by the backtracking search.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ValueHeuristic {
    Ascending,
    Descending,
    Random,
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    pub variable_heuristic: VariableHeuristic,
    pub value_heuristic: ValueHeuristic,
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> SearchConfig {
        SearchConfig {
            variable_heuristic: VariableHeuristic::Dom,
            value_heuristic: ValueHeuristic::Ascending,
            seed: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct Model {
    variables: Vec<FdVar>,
    constraints: Vec<Rc<dyn Propagator>>,
    pub config: SearchConfig,
}

impl Model {
    pub fn new() -> Model {
        Model {
            variables: Vec::new(),
            constraints: Vec::new(),
            config: SearchConfig::default(),
        }
    }

    /// Declares a new variable with the given initial domain, assigning it
    /// the next sequential id.
    pub fn int_var(&mut self, domain: Bitset, name: Option<&str>) -> FdVarId {
        let id = FdVarId(self.variables.len() as u32);
        self.variables
            .push(FdVar::new(id, domain, name.map(String::from)));
        id
    }

    /// Declares `count` variables sharing the same initial domain.
    pub fn int_var_values(&mut self, domain: Bitset, count: usize) -> Vec<FdVarId> {
        (0..count).map(|_| self.int_var(domain.clone(), None)).collect()
    }

    pub fn add_constraint(&mut self, propagator: Rc<dyn Propagator>) {
        self.constraints.push(propagator);
    }

    pub fn variable(&self, id: FdVarId) -> &FdVar {
        &self.variables[id.0 as usize]
    }

    pub fn variables(&self) -> &[FdVar] {
        &self.variables
    }

    pub fn constraints(&self) -> &[Rc<dyn Propagator>] {
        &self.constraints
    }

    pub fn var_count(&self) -> usize {
        self.variables.len()
    }

    /// Validates the model: every declared domain must be non-empty.
    /// Called by solver construction, not by variable declaration (a
    /// temporarily-empty domain mid-build is not an error).
    pub fn validate(&self) -> crate::error::Result<()> {
        for v in &self.variables {
            if v.domain.is_empty() {
                return Err(crate::error::Error::invalid_argument(
                    "Model::validate",
                    format!("variable {:?} has an empty initial domain", v.id),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_get_sequential_ids() {
        let mut model = Model::new();
        let a = model.int_var(Bitset::full(3), None);
        let b = model.int_var(Bitset::full(3), None);
        assert_eq!(a.0 + 1, b.0);
    }

    #[test]
    fn validate_rejects_empty_initial_domain() {
        let mut model = Model::new();
        model.int_var(Bitset::empty(3), None);
        assert!(model.validate().is_err());
    }
}
