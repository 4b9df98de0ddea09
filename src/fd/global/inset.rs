//! `InSetReified(v, S, b)`: reifies set membership into a boolean FD
//! variable, `b` encoded `1 = false, 2 = true`.
use crate::bitset::Bitset;
use crate::fd::model::Model;
use crate::fd::propagator::{Failed, PropagateResult, Propagator};
use crate::fd::state::FdState;
use crate::fd::variable::FdVarId;
use std::collections::HashSet;

#[derive(Debug)]
pub struct InSetReified {
    pub v: FdVarId,
    pub set: HashSet<u32>,
    pub b: FdVarId,
}

impl Propagator for InSetReified {
    fn variables(&self) -> Vec<FdVarId> {
        vec![self.v, self.b]
    }

    fn kind(&self) -> &'static str {
        "in_set_reified"
    }

    fn propagate(&self, model: &Model, state: &FdState) -> PropagateResult {
        let vdom = state.get_domain(model, self.v).clone();
        let mut bdom = state.get_domain(model, self.b).clone();

        let intersects = vdom.iter_values().any(|x| self.set.contains(&x));
        let subset_of_set = vdom.iter_values().all(|x| self.set.contains(&x));

        if !intersects {
            bdom = bdom.remove(2);
        } else if vdom.is_singleton() && subset_of_set {
            bdom = Bitset::singleton(bdom.max_value().max(2), 2);
        }
        if bdom.is_empty() {
            return Err(Failed);
        }

        let mut vdom = vdom;
        if bdom.singleton_value() == Some(2) {
            vdom = Bitset::from_values(
                vdom.max_value(),
                vdom.iter_values().filter(|x| self.set.contains(x)),
            );
        } else if bdom.singleton_value() == Some(1) {
            vdom = Bitset::from_values(
                vdom.max_value(),
                vdom.iter_values().filter(|x| !self.set.contains(x)),
            );
        }
        if vdom.is_empty() {
            return Err(Failed);
        }

        let mut changed = false;
        let (state, c1) = {
            let (s, c) = state.set_domain(model, self.v, vdom);
            (s, c)
        };
        changed |= c1;
        let (state, c2) = state.set_domain(model, self.b, bdom);
        changed |= c2;
        Ok(if changed { Some(state) } else { None })
    }
}
