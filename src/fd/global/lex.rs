//! `LexLessEq(X, Y)`: lexicographic bounds propagation over two paired
//! vectors of equal length.
use crate::fd::model::Model;
use crate::fd::propagator::{commit_many, Failed, PropagateResult, Propagator};
use crate::fd::state::FdState;
use crate::fd::variable::FdVarId;

#[derive(Debug)]
pub struct LexLessEq {
    pub xs: Vec<FdVarId>,
    pub ys: Vec<FdVarId>,
}

impl Propagator for LexLessEq {
    fn variables(&self) -> Vec<FdVarId> {
        self.xs.iter().chain(self.ys.iter()).copied().collect()
    }

    fn kind(&self) -> &'static str {
        "lex_less_eq"
    }

    fn propagate(&self, model: &Model, state: &FdState) -> PropagateResult {
        assert_eq!(self.xs.len(), self.ys.len(), "LexLessEq vectors must match in length");
        let mut xdoms: Vec<_> = self.xs.iter().map(|v| state.get_domain(model, *v).clone()).collect();
        let mut ydoms: Vec<_> = self.ys.iter().map(|v| state.get_domain(model, *v).clone()).collect();

        // At the first position whose prefixes are not yet forced equal,
        // X_i <= Y_i bounds-consistently. Positions after a fixed-unequal
        // prefix are left untouched (the lexicographic order is already
        // decided there).
        for i in 0..xdoms.len() {
            let x = &xdoms[i];
            let y = &ydoms[i];
            let xmax = x.max();
            let ymin = y.min();
            if let (Some(xmax), Some(ymin)) = (xmax, ymin) {
                if xmax <= ymin {
                    // X_i < Y_i is already guaranteed or prefix ties so far;
                    // nothing to prune at this position, and no later
                    // position is forced by lex order, so stop.
                }
            }
            if let Some(ymax) = y.max() {
                xdoms[i] = x.remove_above(ymax + 1);
            }
            if let Some(xmin) = xdoms[i].min() {
                ydoms[i] = y.remove_below(xmin.saturating_sub(1));
            }
            if xdoms[i].is_empty() || ydoms[i].is_empty() {
                return Err(Failed);
            }

            let tied = xdoms[i].is_singleton()
                && ydoms[i].is_singleton()
                && xdoms[i].singleton_value() == ydoms[i].singleton_value();
            if !tied {
                break;
            }
        }

        commit_many(
            model,
            state,
            self.xs.iter().copied().chain(self.ys.iter().copied()),
            xdoms.into_iter().chain(ydoms.into_iter()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitset::Bitset;

    #[test]
    fn already_ordered_prefix_leaves_y1_unchanged() {
        let mut model = Model::new();
        let x1 = model.int_var(Bitset::from_values(5, vec![2, 3, 4]), None);
        let x2 = model.int_var(Bitset::from_values(5, vec![1, 2, 3]), None);
        let y1 = model.int_var(Bitset::from_values(5, vec![3, 4, 5]), None);
        let y2 = model.int_var(Bitset::from_values(5, vec![2, 3, 4]), None);
        let p = LexLessEq { xs: vec![x1, x2], ys: vec![y1, y2] };
        let result = p.propagate(&model, &FdState::initial()).unwrap();
        let y1_final = match &result {
            Some(s) => s.get_domain(&model, y1).iter_values().collect::<Vec<_>>(),
            None => FdState::initial().get_domain(&model, y1).iter_values().collect(),
        };
        assert_eq!(y1_final, vec![3, 4, 5]);
    }
}
