//! `Sequence(vars, S, q, lo, hi)`: every window of `q` consecutive
//! variables contains between `lo` and `hi` values from `S`.
//!
//! This is logically a composition of `InSetReified` + window counters;
//! this propagator computes the equivalent bound directly against each
//! window, pruning a variable out of `S` when admitting it would exceed
//! `hi`, and pruning it into `S` when the window cannot otherwise reach
//! `lo`.
use crate::bitset::Bitset;
use crate::fd::model::Model;
use crate::fd::propagator::{commit_many, Failed, PropagateResult, Propagator};
use crate::fd::state::FdState;
use crate::fd::variable::FdVarId;
use std::collections::HashSet;

#[derive(Debug)]
pub struct Sequence {
    pub vars: Vec<FdVarId>,
    pub set: HashSet<u32>,
    pub window: usize,
    pub lo: u32,
    pub hi: u32,
}

impl Propagator for Sequence {
    fn variables(&self) -> Vec<FdVarId> {
        self.vars.clone()
    }

    fn kind(&self) -> &'static str {
        "sequence"
    }

    fn propagate(&self, model: &Model, state: &FdState) -> PropagateResult {
        if self.window == 0 || self.window > self.vars.len() {
            return Ok(None);
        }
        let mut doms: Vec<Bitset> = self
            .vars
            .iter()
            .map(|v| state.get_domain(model, *v).clone())
            .collect();

        for w in 0..=(self.vars.len() - self.window) {
            let window = &doms[w..w + self.window];
            let mandatory = window
                .iter()
                .filter(|d| d.iter_values().all(|v| self.set.contains(&v)))
                .count() as u32;
            let possible = mandatory
                + window
                    .iter()
                    .filter(|d| {
                        !d.iter_values().all(|v| self.set.contains(&v))
                            && d.iter_values().any(|v| self.set.contains(&v))
                    })
                    .count() as u32;

            if mandatory > self.hi || possible < self.lo {
                return Err(Failed);
            }
            if mandatory == self.hi {
                for d in doms[w..w + self.window].iter_mut() {
                    let subset = d.iter_values().all(|v| self.set.contains(&v));
                    if !subset {
                        *d = Bitset::from_values(
                            d.max_value(),
                            d.iter_values().filter(|v| !self.set.contains(v)),
                        );
                    }
                }
            }
            if possible == self.lo {
                for d in doms[w..w + self.window].iter_mut() {
                    let touches = d.iter_values().any(|v| self.set.contains(&v));
                    let subset = d.iter_values().all(|v| self.set.contains(&v));
                    if touches && !subset {
                        *d = Bitset::from_values(
                            d.max_value(),
                            d.iter_values().filter(|v| self.set.contains(v)),
                        );
                    }
                }
            }
        }

        commit_many(model, state, self.vars.iter().copied(), doms.into_iter())
    }
}
