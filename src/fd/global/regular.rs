//! `Regular(vars, numStates, start, accept, delta)`: unfolds a
//! DFA over a sequence of FD variables via forward/backward reachability.
use crate::bitset::Bitset;
use crate::fd::model::Model;
use crate::fd::propagator::{Failed, PropagateResult, Propagator};
use crate::fd::state::FdState;
use crate::fd::variable::FdVarId;
use std::collections::HashSet;

/// `delta[state][value] = Some(next_state)`. `value` is 1-indexed to match
/// the bitset domains it labels.
#[derive(Debug)]
pub struct Regular {
    pub vars: Vec<FdVarId>,
    pub num_states: usize,
    pub start: usize,
    pub accept: HashSet<usize>,
    pub delta: Vec<Vec<Option<usize>>>,
}

impl Propagator for Regular {
    fn variables(&self) -> Vec<FdVarId> {
        self.vars.clone()
    }

    fn kind(&self) -> &'static str {
        "regular"
    }

    fn propagate(&self, model: &Model, state: &FdState) -> PropagateResult {
        let n = self.vars.len();
        let doms: Vec<Bitset> = self
            .vars
            .iter()
            .map(|v| state.get_domain(model, *v).clone())
            .collect();

        // forward[i] = set of states reachable at position i (before
        // consuming vars[i]); forward[0] = {start}.
        let mut forward: Vec<HashSet<usize>> = vec![HashSet::new(); n + 1];
        forward[0].insert(self.start);
        for i in 0..n {
            for &q in &forward[i].clone() {
                for v in doms[i].iter_values() {
                    if let Some(Some(next)) = self.delta.get(q).and_then(|row| row.get(v as usize)) {
                        forward[i + 1].insert(*next);
                    }
                }
            }
        }

        // backward[i] = set of states at position i from which `accept` is
        // reachable by consuming vars[i..n].
        let mut backward: Vec<HashSet<usize>> = vec![HashSet::new(); n + 1];
        backward[n] = self.accept.clone();
        for i in (0..n).rev() {
            for q in 0..self.num_states {
                for v in doms[i].iter_values() {
                    if let Some(Some(next)) = self.delta.get(q).and_then(|row| row.get(v as usize)) {
                        if backward[i + 1].contains(next) {
                            backward[i].insert(q);
                        }
                    }
                }
            }
        }

        let mut state = state.clone();
        let mut changed = false;
        for i in 0..n {
            let dom = &doms[i];
            let pruned_values: Vec<u32> = dom
                .iter_values()
                .filter(|&v| {
                    forward[i].iter().any(|&q| {
                        matches!(
                            self.delta.get(q).and_then(|row| row.get(v as usize)),
                            Some(Some(next)) if backward[i + 1].contains(next)
                        )
                    })
                })
                .collect();
            if pruned_values.is_empty() {
                return Err(Failed);
            }
            let pruned = Bitset::from_values(dom.max_value(), pruned_values);
            let (s, c) = state.set_domain(model, self.vars[i], pruned);
            state = s;
            changed |= c;
        }

        Ok(if changed { Some(state) } else { None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // "ends with symbol 1" DFA over a 2-symbol alphabet {1,2}: state 0 is
    // non-accepting ("has not just seen 1"), state 1 is accepting ("last
    // symbol seen was 1").
    #[test]
    fn ends_with_one_forces_the_last_variable() {
        let mut model = Model::new();
        let vars: Vec<_> = (0..3).map(|_| model.int_var(Bitset::full(2), None)).collect();
        let delta = vec![vec![None, Some(1), Some(0)], vec![None, Some(1), Some(0)]];
        let p = Regular {
            vars: vars.clone(),
            num_states: 2,
            start: 0,
            accept: vec![1].into_iter().collect(),
            delta,
        };
        let s1 = p.propagate(&model, &FdState::initial()).unwrap().unwrap();
        assert_eq!(s1.get_domain(&model, vars[2]).singleton_value(), Some(1));
    }
}
