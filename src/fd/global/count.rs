//! `NValue`/`DistinctCount`/`AtMost`/`AtLeast`.
//!
//! These describe the number of distinct values taken by a set of
//! variables as composed from per-value equality reifications and
//! per-value totals. Rather than materializing those auxiliary boolean
//! variables on the model, this propagator computes the same bound
//! directly: the number of distinct values actually taken by `vars` lies
//! between the number of values that are "forced" (some variable is
//! singleton on it) and the number of values any variable's domain
//! touches. The count variable's domain is intersected with
//! `[min_possible..max_possible]`.
use crate::bitset::Bitset;
use crate::fd::model::Model;
use crate::fd::propagator::{commit_many, Failed, PropagateResult, Propagator};
use crate::fd::state::FdState;
use crate::fd::variable::FdVarId;
use std::collections::HashSet;

fn distinct_value_bounds(model: &Model, state: &FdState, vars: &[FdVarId]) -> (u32, u32) {
    let mut touched: HashSet<u32> = HashSet::new();
    let mut forced: HashSet<u32> = HashSet::new();
    for v in vars {
        let dom = state.get_domain(model, *v);
        for val in dom.iter_values() {
            touched.insert(val);
        }
        if let Some(val) = dom.singleton_value() {
            forced.insert(val);
        }
    }
    (forced.len() as u32, touched.len() as u32)
}

/// `NValue(vars, n)`: `n` is the number of distinct values taken by `vars`.
#[derive(Debug)]
pub struct NValue {
    pub vars: Vec<FdVarId>,
    pub n: FdVarId,
}

impl Propagator for NValue {
    fn variables(&self) -> Vec<FdVarId> {
        let mut v = self.vars.clone();
        v.push(self.n);
        v
    }

    fn kind(&self) -> &'static str {
        "n_value"
    }

    fn propagate(&self, model: &Model, state: &FdState) -> PropagateResult {
        let (lo, hi) = distinct_value_bounds(model, state, &self.vars);
        let ndom = state.get_domain(model, self.n).clone();
        let pruned = ndom.remove_below(lo.saturating_sub(1)).remove_above(hi + 1);
        commit_many(model, state, std::iter::once(self.n), std::iter::once(pruned))
    }
}

/// `DistinctCount(vars, n)`, an alias of `NValue`.
pub type DistinctCount = NValue;

/// `AtMostNValues(vars, n)`: at most `n` distinct values are taken.
#[derive(Debug)]
pub struct AtMostNValues {
    pub vars: Vec<FdVarId>,
    pub n: FdVarId,
}

impl Propagator for AtMostNValues {
    fn variables(&self) -> Vec<FdVarId> {
        let mut v = self.vars.clone();
        v.push(self.n);
        v
    }

    fn kind(&self) -> &'static str {
        "at_most_n_values"
    }

    fn propagate(&self, model: &Model, state: &FdState) -> PropagateResult {
        let (lo, _hi) = distinct_value_bounds(model, state, &self.vars);
        let ndom = state.get_domain(model, self.n).clone();
        let pruned = ndom.remove_below(lo.saturating_sub(1));
        if pruned.is_empty() {
            return Err(Failed);
        }
        commit_many(model, state, std::iter::once(self.n), std::iter::once(pruned))
    }
}

/// `AtLeastNValues(vars, n)`: at least `n` distinct values are taken.
#[derive(Debug)]
pub struct AtLeastNValues {
    pub vars: Vec<FdVarId>,
    pub n: FdVarId,
}

impl Propagator for AtLeastNValues {
    fn variables(&self) -> Vec<FdVarId> {
        let mut v = self.vars.clone();
        v.push(self.n);
        v
    }

    fn kind(&self) -> &'static str {
        "at_least_n_values"
    }

    fn propagate(&self, model: &Model, state: &FdState) -> PropagateResult {
        let (_lo, hi) = distinct_value_bounds(model, state, &self.vars);
        let ndom = state.get_domain(model, self.n).clone();
        let pruned = ndom.remove_above(hi + 1);
        if pruned.is_empty() {
            return Err(Failed);
        }
        commit_many(model, state, std::iter::once(self.n), std::iter::once(pruned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn n_value_bounds_follow_domain_overlap() {
        let mut model = Model::new();
        let vars: Vec<_> = (0..3).map(|_| model.int_var(Bitset::full(3), None)).collect();
        let n = model.int_var(Bitset::full(4), None);
        let p = NValue { vars, n };
        let s1 = p.propagate(&model, &FdState::initial()).unwrap().unwrap();
        // lo = 0 (nothing forced yet), hi = 3 (touches values 1..3).
        assert_eq!(s1.get_domain(&model, n).max(), Some(3));
    }
}
