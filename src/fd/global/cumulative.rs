//! `Cumulative(starts, durations, demands, capacity)`:
//! time-table filtering with compulsory parts.
use crate::bitset::Bitset;
use crate::fd::model::Model;
use crate::fd::propagator::{Failed, PropagateResult, Propagator};
use crate::fd::state::FdState;
use crate::fd::variable::FdVarId;

#[derive(Debug)]
pub struct Cumulative {
    pub starts: Vec<FdVarId>,
    pub durations: Vec<u32>,
    pub demands: Vec<u32>,
    pub capacity: u32,
}

impl Cumulative {
    fn compulsory_part(&self, model: &Model, state: &FdState, i: usize) -> Option<(u32, u32)> {
        let dom = state.get_domain(model, self.starts[i]);
        let latest_start = dom.max()?;
        let earliest_start = dom.min()?;
        let dur = self.durations[i];
        if dur == 0 {
            return None;
        }
        let lo = latest_start;
        let hi = earliest_start + dur - 1;
        if lo > hi {
            None
        } else {
            Some((lo, hi))
        }
    }

    fn max_end(&self, model: &Model, state: &FdState) -> u32 {
        self.starts
            .iter()
            .zip(self.durations.iter())
            .filter_map(|(s, d)| state.get_domain(model, *s).max().map(|m| m + d - 1))
            .max()
            .unwrap_or(0)
    }
}

impl Propagator for Cumulative {
    fn variables(&self) -> Vec<FdVarId> {
        self.starts.clone()
    }

    fn kind(&self) -> &'static str {
        "cumulative"
    }

    fn propagate(&self, model: &Model, state: &FdState) -> PropagateResult {
        let max_end = self.max_end(model, state).max(1);
        let mut profile = vec![0u32; max_end as usize + 2];
        for i in 0..self.starts.len() {
            if let Some((lo, hi)) = self.compulsory_part(model, state, i) {
                for t in lo..=hi {
                    profile[t as usize] += self.demands[i];
                }
            }
        }
        if profile.iter().any(|&load| load > self.capacity) {
            return Err(Failed);
        }

        let mut state = state.clone();
        let mut changed = false;
        for i in 0..self.starts.len() {
            let dur = self.durations[i];
            let demand = self.demands[i];
            if dur == 0 || demand == 0 {
                continue;
            }
            let own_part = self.compulsory_part(model, &state, i);
            let dom = state.get_domain(model, self.starts[i]).clone();
            let mut pruned = dom.clone();
            for s in dom.iter_values() {
                let mut ok = true;
                for t in s..s + dur {
                    let mut load = *profile.get(t as usize).unwrap_or(&0);
                    if let Some((lo, hi)) = own_part {
                        if t >= lo && t <= hi {
                            load -= demand;
                        }
                    }
                    if load + demand > self.capacity {
                        ok = false;
                        break;
                    }
                }
                if !ok {
                    pruned = pruned.remove(s);
                }
            }
            if pruned.is_empty() {
                return Err(Failed);
            }
            let (s, c) = state.set_domain(model, self.starts[i], pruned);
            state = s;
            changed |= c;
        }

        Ok(if changed { Some(state) } else { None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infeasible_overload_fails() {
        let mut model = Model::new();
        let starts: Vec<_> = (0..3)
            .map(|_| model.int_var(Bitset::from_values(2, vec![1, 2]), None))
            .collect();
        let p = Cumulative {
            starts,
            durations: vec![3, 3, 3],
            demands: vec![2, 2, 2],
            capacity: 4,
        };
        assert_eq!(p.propagate(&model, &FdState::initial()), Err(Failed));
    }

    #[test]
    fn edge_finding_prunes_k() {
        let mut model = Model::new();
        let t1 = model.int_var(Bitset::from_values(7, vec![1, 4]), None);
        let t2 = model.int_var(Bitset::singleton(7, 4), None);
        let k = model.int_var(Bitset::from_values(7, vec![2, 3, 7]), None);
        let p = Cumulative {
            starts: vec![t1, t2, k],
            durations: vec![3, 3, 2],
            demands: vec![2, 2, 2],
            capacity: 3,
        };
        let s1 = p.propagate(&model, &FdState::initial()).unwrap().unwrap();
        assert_eq!(s1.get_domain(&model, k).iter_values().collect::<Vec<_>>(), vec![7]);
    }
}
