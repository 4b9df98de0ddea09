//! Fixed-point propagation scheduler.
//!
//! Grounded on the re-trigger loop implicit in FD domain extension
//! (re-running affected constraints after a domain changes), generalized
//! into an explicit worklist scheduler. Confluent by construction: every
//! propagator is re-enqueued whenever any variable it touches changes,
//! regardless of pop order, so the fixed point reached does not depend on
//! the worklist's iteration order.
use crate::fd::model::Model;
use crate::fd::propagator::Failed;
use crate::fd::state::FdState;
use crate::fd::variable::FdVarId;
use log::{debug, trace};
use std::collections::{HashSet, VecDeque};

/// Runs every propagator in `model` against `state` until no propagator can
/// tighten any further domain, or a propagator detects an empty domain.
pub fn propagate_to_fixpoint(model: &Model, state: &FdState) -> Result<FdState, Failed> {
    let mut state = state.clone();
    let n = model.constraints().len();
    if n == 0 {
        return Ok(state);
    }

    let mut touches: Vec<HashSet<FdVarId>> = Vec::with_capacity(n);
    for p in model.constraints() {
        touches.push(p.variables().into_iter().collect());
    }

    let mut queued = vec![true; n];
    let mut worklist: VecDeque<usize> = (0..n).collect();

    while let Some(i) = worklist.pop_front() {
        queued[i] = false;
        trace!("propagate: running {} on propagator {}", model.constraints()[i].kind(), i);
        let result = model.constraints()[i].propagate(model, &state).map_err(|e| {
            debug!("propagate: propagator {} ({}) failed", i, model.constraints()[i].kind());
            e
        })?;
        let changed_state = match result {
            Some(s) => s,
            None => continue,
        };
        state = changed_state;
        if !state.is_consistent() {
            debug!("propagate: propagator {} emptied a domain", i);
            return Err(Failed);
        }

        for (j, vars) in touches.iter().enumerate() {
            if !queued[j] && vars.intersection(&touches[i]).next().is_some() {
                queued[j] = true;
                worklist.push_back(j);
            }
        }
    }

    debug!("propagate: reached quiescence after {} constraints", n);
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitset::Bitset;
    use crate::fd::model::Model;
    use crate::fd::propagator::Arithmetic;
    use std::rc::Rc;

    #[test]
    fn propagates_a_chain_to_fixpoint_from_a_single_binding() {
        let mut model = Model::new();
        let x = model.int_var(Bitset::full(10), Some("x"));
        let y = model.int_var(Bitset::full(10), Some("y"));
        let z = model.int_var(Bitset::full(10), Some("z"));
        model.add_constraint(Rc::new(Arithmetic { src: x, dst: y, k: 1 }));
        model.add_constraint(Rc::new(Arithmetic { src: y, dst: z, k: 1 }));

        let s0 = FdState::initial();
        let (s0, _) = s0.set_domain(&model, x, Bitset::singleton(10, 5));
        let fixed = propagate_to_fixpoint(&model, &s0).unwrap();
        assert_eq!(fixed.get_domain(&model, y).singleton_value(), Some(6));
        assert_eq!(fixed.get_domain(&model, z).singleton_value(), Some(7));
    }

    #[test]
    fn detects_failure_from_an_emptied_domain() {
        let mut model = Model::new();
        let x = model.int_var(Bitset::singleton(10, 5), None);
        let y = model.int_var(Bitset::singleton(10, 5), None);
        model.add_constraint(Rc::new(Arithmetic { src: x, dst: y, k: 1 }));
        assert!(propagate_to_fixpoint(&model, &FdState::initial()).is_err());
    }

    #[test]
    fn a_sole_inequality_reaches_full_bounds_consistency() {
        use crate::fd::propagator::{Comparison, Inequality};
        let mut model = Model::new();
        let x = model.int_var(Bitset::from_values(10, 5..=10), Some("x"));
        let y = model.int_var(Bitset::from_values(10, 1..=6), Some("y"));
        model.add_constraint(Rc::new(Inequality { x, y, op: Comparison::Lt }));

        let fixed = propagate_to_fixpoint(&model, &FdState::initial()).unwrap();
        assert_eq!(fixed.get_domain(&model, x).singleton_value(), Some(5));
        assert_eq!(fixed.get_domain(&model, y).singleton_value(), Some(6));
    }

    /// A propagator that only removes its domain's current maximum per call,
    /// standing in for any constraint whose own pass makes partial progress
    /// and must be re-examined against its own result.
    #[derive(Debug)]
    struct Decrement {
        var: FdVarId,
        floor: u32,
    }

    impl crate::fd::propagator::Propagator for Decrement {
        fn variables(&self) -> Vec<FdVarId> {
            vec![self.var]
        }

        fn kind(&self) -> &'static str {
            "test_decrement"
        }

        fn propagate(&self, model: &Model, state: &FdState) -> crate::fd::propagator::PropagateResult {
            let dom = state.get_domain(model, self.var).clone();
            let max = match dom.max() {
                Some(m) if m > self.floor => m,
                _ => return Ok(None),
            };
            let pruned = dom.remove(max);
            if pruned.is_empty() {
                return Err(Failed);
            }
            let (s, c) = state.set_domain(model, self.var, pruned);
            Ok(if c { Some(s) } else { None })
        }
    }

    #[test]
    fn a_propagator_touching_only_its_own_variable_is_reenqueued_to_its_own_fixpoint() {
        let mut model = Model::new();
        let v = model.int_var(Bitset::full(10), None);
        model.add_constraint(Rc::new(Decrement { var: v, floor: 3 }));

        let fixed = propagate_to_fixpoint(&model, &FdState::initial()).unwrap();
        assert_eq!(fixed.get_domain(&model, v).max(), Some(3));
    }
}
