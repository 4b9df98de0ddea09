//! `Among(vars, S, K)`.
//!
//! Classifies each variable as mandatory (domain subset of `S`), possible
//! (domain intersects `S` but isn't a subset), or disjoint (no
//! intersection); `K`'s domain encodes the admissible counts as
//! `[m+1 .. p+1]` where `actualCount = K - 1`, matching the crate's count
//! encoding convention.
use crate::bitset::Bitset;
use crate::fd::model::Model;
use crate::fd::propagator::{Failed, PropagateResult, Propagator};
use crate::fd::state::FdState;
use crate::fd::variable::FdVarId;
use std::collections::HashSet;

#[derive(Debug)]
pub struct Among {
    pub vars: Vec<FdVarId>,
    pub set: HashSet<u32>,
    pub k: FdVarId,
}

enum Class {
    Mandatory,
    Possible,
    Disjoint,
}

impl Among {
    fn classify(&self, model: &Model, state: &FdState) -> Vec<Class> {
        self.vars
            .iter()
            .map(|id| {
                let dom = state.get_domain(model, *id);
                let subset = dom.iter_values().all(|v| self.set.contains(&v));
                let intersects = dom.iter_values().any(|v| self.set.contains(&v));
                if subset {
                    Class::Mandatory
                } else if intersects {
                    Class::Possible
                } else {
                    Class::Disjoint
                }
            })
            .collect()
    }
}

impl Propagator for Among {
    fn variables(&self) -> Vec<FdVarId> {
        let mut v = self.vars.clone();
        v.push(self.k);
        v
    }

    fn kind(&self) -> &'static str {
        "among"
    }

    fn propagate(&self, model: &Model, state: &FdState) -> PropagateResult {
        let classes = self.classify(model, state);
        let m = classes.iter().filter(|c| matches!(c, Class::Mandatory)).count() as u32;
        let p = m + classes.iter().filter(|c| matches!(c, Class::Possible)).count() as u32;

        let kdom = state.get_domain(model, self.k).clone();
        let kdom = kdom.intersect(&Bitset::from_values(
            kdom.max_value(),
            (m + 1)..=(p + 1),
        ));
        if kdom.is_empty() {
            return Err(Failed);
        }

        let mut state = state.clone();
        let mut changed = false;
        let (s, c) = state.set_domain(model, self.k, kdom.clone());
        state = s;
        changed |= c;

        if kdom.is_singleton() {
            let actual_count = kdom.singleton_value().unwrap() - 1;
            if actual_count == m {
                // No possible variable may take an S-value: force them out.
                for (id, class) in self.vars.iter().zip(classes.iter()) {
                    if matches!(class, Class::Possible) {
                        let dom = state.get_domain(model, *id).clone();
                        let pruned = Bitset::from_values(
                            dom.max_value(),
                            dom.iter_values().filter(|v| !self.set.contains(v)),
                        );
                        if pruned.is_empty() {
                            return Err(Failed);
                        }
                        let (s, c) = state.set_domain(model, *id, pruned);
                        state = s;
                        changed |= c;
                    }
                }
            } else if actual_count == p {
                // Every possible variable must take an S-value.
                for (id, class) in self.vars.iter().zip(classes.iter()) {
                    if matches!(class, Class::Possible) {
                        let dom = state.get_domain(model, *id).clone();
                        let set_dom = Bitset::from_values(
                            dom.max_value(),
                            dom.iter_values().filter(|v| self.set.contains(v)),
                        );
                        if set_dom.is_empty() {
                            return Err(Failed);
                        }
                        let (s, c) = state.set_domain(model, *id, set_dom);
                        state = s;
                        changed |= c;
                    }
                }
            }
        }

        Ok(if changed { Some(state) } else { None })
    }
}
