//! The propagator trait and the arithmetic/comparison/AllDifferent family.
//!
//! Grounded on arithmetic propagators (`plusfd`/`minusfd`/`timesfd`),
//! inequality propagators (`ltfd`/`ltefd`), AllDifferent (`distinctfd`,
//! including its Hall-set counting pass), and the disequality-as-
//! propagator idiom, generalized from goal-posted relations to
//! free-standing propagator values held by a `Model`.
use crate::bitset::Bitset;
use crate::fd::model::Model;
use crate::fd::state::FdState;
use crate::fd::variable::FdVarId;
use std::fmt;

/// Sentinel returned by a propagator that has detected an empty domain.
/// Recovered locally by the search/scheduler; never surfaces as a crate
/// `Error`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Failed;

pub type PropagateResult = Result<Option<FdState>, Failed>;

/// A pure function of the model + input state to a possibly-new state.
/// `propagate` returns `Ok(None)` when it made no change, `Ok(Some(s'))`
/// when it tightened some domain, and `Err(Failed)` when a domain would
/// have emptied.
pub trait Propagator: fmt::Debug {
    fn variables(&self) -> Vec<FdVarId>;
    fn kind(&self) -> &'static str;
    fn propagate(&self, model: &Model, state: &FdState) -> PropagateResult;
}

fn narrow(
    model: &Model,
    state: &FdState,
    id: FdVarId,
    d: Bitset,
    mut changed: bool,
) -> Result<(FdState, bool), Failed> {
    if d.is_empty() {
        return Err(Failed);
    }
    let (state, did_change) = state.set_domain(model, id, d);
    changed |= did_change;
    Ok((state, changed))
}

/// `dst = src + k`.
#[derive(Debug)]
pub struct Arithmetic {
    pub src: FdVarId,
    pub dst: FdVarId,
    pub k: i64,
}

impl Propagator for Arithmetic {
    fn variables(&self) -> Vec<FdVarId> {
        vec![self.src, self.dst]
    }

    fn kind(&self) -> &'static str {
        "arithmetic"
    }

    fn propagate(&self, model: &Model, state: &FdState) -> PropagateResult {
        let src_dom = state.get_domain(model, self.src);
        let dst_dom = state.get_domain(model, self.dst);
        let max_value = src_dom.max_value().max(dst_dom.max_value());

        let forward = Bitset::from_values(
            max_value,
            src_dom
                .iter_values()
                .filter_map(|v| checked_shift(v, self.k, max_value)),
        );
        let backward = Bitset::from_values(
            max_value,
            dst_dom
                .iter_values()
                .filter_map(|w| checked_shift(w, -self.k, max_value)),
        );

        let new_dst = dst_dom.intersect(&forward);
        let new_src = src_dom.intersect(&backward);

        let mut changed = false;
        let (state, c1) = narrow(model, state, self.dst, new_dst, changed)?;
        changed = c1;
        let (state, c2) = narrow(model, &state, self.src, new_src, changed)?;
        changed = c2;
        Ok(if changed { Some(state) } else { None })
    }
}

fn checked_shift(v: u32, k: i64, max_value: u32) -> Option<u32> {
    let shifted = v as i64 + k;
    if shifted >= 1 && shifted <= max_value as i64 {
        Some(shifted as u32)
    } else {
        None
    }
}

/// `dst = src + k`, semantically identical to `Arithmetic`; kept as a
/// distinct named constructor for an "offset link" auxiliary-variable
/// propagator.
pub fn offset_link(src: FdVarId, dst: FdVarId, k: i64) -> Arithmetic {
    Arithmetic { src, dst, k }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    Ne,
}

#[derive(Debug)]
pub struct Inequality {
    pub x: FdVarId,
    pub y: FdVarId,
    pub op: Comparison,
}

impl Propagator for Inequality {
    fn variables(&self) -> Vec<FdVarId> {
        vec![self.x, self.y]
    }

    fn kind(&self) -> &'static str {
        "inequality"
    }

    fn propagate(&self, model: &Model, state: &FdState) -> PropagateResult {
        let xdom = state.get_domain(model, self.x).clone();
        let ydom = state.get_domain(model, self.y).clone();

        match self.op {
            Comparison::Lt | Comparison::Le => {
                let (xdom, ydom) = bounds_less(&xdom, &ydom, self.op == Comparison::Le);
                commit2(model, state, self.x, xdom, self.y, ydom)
            }
            Comparison::Gt => {
                let (ydom, xdom) = bounds_less(&ydom, &xdom, false);
                commit2(model, state, self.x, xdom, self.y, ydom)
            }
            Comparison::Ge => {
                let (ydom, xdom) = bounds_less(&ydom, &xdom, true);
                commit2(model, state, self.x, xdom, self.y, ydom)
            }
            Comparison::Ne => {
                let mut xdom = xdom.clone();
                let mut ydom = ydom.clone();
                if let Some(v) = ydom.singleton_value() {
                    xdom = xdom.remove(v);
                }
                if let Some(v) = xdom.singleton_value() {
                    ydom = ydom.remove(v);
                }
                commit2(model, state, self.x, xdom, self.y, ydom)
            }
        }
    }
}

/// Bounds-consistent pruning for `x < y` (or `x <= y` when `inclusive`).
fn bounds_less(x: &Bitset, y: &Bitset, inclusive: bool) -> (Bitset, Bitset) {
    let x = if let Some(ymax) = y.max() {
        let bound = if inclusive { ymax } else { ymax.saturating_sub(1) };
        x.remove_above(bound + 1)
    } else {
        x.clone()
    };
    let y = if let Some(xmin) = x.min() {
        let bound = if inclusive { xmin } else { xmin + 1 };
        y.remove_below(bound.saturating_sub(1))
    } else {
        y.clone()
    };
    (x, y)
}

/// Commits a batch of `(id, domain)` narrowings in one pass, failing fast on
/// the first empty domain and reporting whether anything actually changed.
pub fn commit_many(
    model: &Model,
    state: &FdState,
    ids: impl IntoIterator<Item = FdVarId>,
    doms: impl IntoIterator<Item = Bitset>,
) -> PropagateResult {
    let mut state = state.clone();
    let mut changed = false;
    for (id, d) in ids.into_iter().zip(doms.into_iter()) {
        if d.is_empty() {
            return Err(Failed);
        }
        let (s, c) = state.set_domain(model, id, d);
        state = s;
        changed |= c;
    }
    Ok(if changed { Some(state) } else { None })
}

fn commit2(
    model: &Model,
    state: &FdState,
    xid: FdVarId,
    xdom: Bitset,
    yid: FdVarId,
    ydom: Bitset,
) -> PropagateResult {
    let (state, c1) = narrow(model, state, xid, xdom, false)?;
    let (state, c2) = narrow(model, &state, yid, ydom, c1)?;
    Ok(if c2 { Some(state) } else { None })
}

/// AllDifferent over a set of variables.
///
/// Minimum acceptable pruning: (a) remove a bound variable's value from
/// every other variable, (b) fail when the union of all domains is
/// smaller than the variable count, plus a simple Hall-set counting
/// pass: if exactly `k` variables share an identical domain of size `k`,
/// that value set is removed from everyone else.
#[derive(Debug)]
pub struct AllDifferent {
    pub vars: Vec<FdVarId>,
}

impl Propagator for AllDifferent {
    fn variables(&self) -> Vec<FdVarId> {
        self.vars.clone()
    }

    fn kind(&self) -> &'static str {
        "all_different"
    }

    fn propagate(&self, model: &Model, state: &FdState) -> PropagateResult {
        let mut doms: Vec<Bitset> = self
            .vars
            .iter()
            .map(|v| state.get_domain(model, *v).clone())
            .collect();

        let mut changed = false;
        loop {
            let mut round_changed = false;

            // (a) singleton elimination.
            let singles: Vec<u32> = doms.iter().filter_map(|d| d.singleton_value()).collect();
            for (i, d) in doms.iter_mut().enumerate() {
                if d.is_singleton() {
                    continue;
                }
                for &v in &singles {
                    if d.has(v) {
                        // Only remove if some other variable, not this one, is the
                        // singleton holder.
                        let owners = doms.iter().enumerate().filter(|(j, dd)| {
                            *j != i && dd.singleton_value() == Some(v)
                        });
                        if owners.count() > 0 {
                            *d = d.remove(v);
                            round_changed = true;
                        }
                    }
                }
            }
            if doms.iter().any(|d| d.is_empty()) {
                return Err(Failed);
            }

            // (b) union-size failure.
            let max_value = doms.iter().map(|d| d.max_value()).max().unwrap_or(0);
            let mut union = Bitset::empty(max_value);
            for d in &doms {
                union = union.union(d);
            }
            if union.count() < doms.len() as u32 {
                return Err(Failed);
            }

            // Hall-set counting: any value set of size k shared identically by
            // k variables is removed from all the others.
            for k in 1..doms.len() {
                let mut groups: std::collections::HashMap<Vec<u32>, usize> =
                    std::collections::HashMap::new();
                for d in &doms {
                    if d.count() as usize == k {
                        *groups.entry(d.iter_values().collect()).or_insert(0) += 1;
                    }
                }
                for (values, count) in groups {
                    if count == k {
                        for d in doms.iter_mut() {
                            if d.count() as usize == k && d.iter_values().eq(values.iter().copied())
                            {
                                continue;
                            }
                            let before = d.count();
                            for v in &values {
                                *d = d.remove(*v);
                            }
                            if d.count() != before {
                                round_changed = true;
                            }
                        }
                    }
                }
            }
            if doms.iter().any(|d| d.is_empty()) {
                return Err(Failed);
            }

            changed |= round_changed;
            if !round_changed {
                break;
            }
        }

        if !changed {
            return Ok(None);
        }
        let mut state = state.clone();
        for (id, d) in self.vars.iter().zip(doms.into_iter()) {
            let (s, _) = state.set_domain(model, *id, d);
            state = s;
        }
        Ok(Some(state))
    }
}

/// `dividend = quotient * divisor + remainder` restricted to
/// `quotient = floor(dividend / divisor)` with `divisor` a fixed positive
/// constant.
#[derive(Debug)]
pub struct ScaledDivision {
    pub dividend: FdVarId,
    pub divisor: u32,
    pub quotient: FdVarId,
}

impl Propagator for ScaledDivision {
    fn variables(&self) -> Vec<FdVarId> {
        vec![self.dividend, self.quotient]
    }

    fn kind(&self) -> &'static str {
        "scaled_division"
    }

    fn propagate(&self, model: &Model, state: &FdState) -> PropagateResult {
        assert!(self.divisor > 0, "ScaledDivision divisor must be positive");
        let ddom = state.get_domain(model, self.dividend).clone();
        let qdom = state.get_domain(model, self.quotient).clone();
        let max_value = ddom.max_value().max(qdom.max_value());

        let forward = Bitset::from_values(
            max_value,
            ddom.iter_values()
                .map(|d| d / self.divisor)
                .filter(|q| *q >= 1 && *q <= max_value),
        );
        let backward_values: Vec<u32> = qdom
            .iter_values()
            .flat_map(|q| {
                let lo = q * self.divisor;
                let hi = (q + 1) * self.divisor - 1;
                (lo..=hi).filter(|v| *v >= 1 && *v <= max_value)
            })
            .collect();
        let backward = Bitset::from_values(max_value, backward_values);

        commit2(
            model,
            state,
            self.quotient,
            qdom.intersect(&forward),
            self.dividend,
            ddom.intersect(&backward),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fd::model::Model;

    #[test]
    fn arithmetic_chain_propagates_from_a_binding() {
        let mut model = Model::new();
        let x = model.int_var(Bitset::full(10), Some("x"));
        let y = model.int_var(Bitset::full(10), Some("y"));
        let z = model.int_var(Bitset::full(10), Some("z"));
        let p1 = Arithmetic { src: x, dst: y, k: 1 };
        let p2 = Arithmetic { src: y, dst: z, k: 1 };

        let s0 = FdState::initial();
        let (s0, _) = s0.set_domain(&model, x, Bitset::singleton(10, 5));
        let s1 = p1.propagate(&model, &s0).unwrap().unwrap();
        let s2 = p2.propagate(&model, &s1).unwrap().unwrap();
        assert_eq!(s2.get_domain(&model, y).singleton_value(), Some(6));
        assert_eq!(s2.get_domain(&model, z).singleton_value(), Some(7));
    }

    #[test]
    fn all_different_removes_bound_value_from_others() {
        let mut model = Model::new();
        let vars: Vec<_> = (0..3).map(|_| model.int_var(Bitset::full(3), None)).collect();
        let s0 = FdState::initial();
        let (s0, _) = s0.set_domain(&model, vars[0], Bitset::singleton(3, 1));
        let p = AllDifferent { vars: vars.clone() };
        let s1 = p.propagate(&model, &s0).unwrap().unwrap();
        assert!(!s1.get_domain(&model, vars[1]).has(1));
        assert!(!s1.get_domain(&model, vars[2]).has(1));
    }

    #[test]
    fn all_different_fails_when_union_too_small() {
        let mut model = Model::new();
        let vars: Vec<_> = (0..3)
            .map(|_| model.int_var(Bitset::from_values(3, vec![1, 2]), None))
            .collect();
        let p = AllDifferent { vars };
        assert_eq!(p.propagate(&model, &FdState::initial()), Err(Failed));
    }

    #[test]
    fn inequality_lt_prunes_both_sides() {
        let mut model = Model::new();
        let x = model.int_var(Bitset::full(10), None);
        let y = model.int_var(Bitset::from_values(10, vec![5]), None);
        let p = Inequality { x, y, op: Comparison::Lt };
        let s1 = p.propagate(&model, &FdState::initial()).unwrap().unwrap();
        assert_eq!(s1.get_domain(&model, x).max(), Some(4));
    }

    #[test]
    fn scaled_division_does_not_keep_an_unsupported_quotient() {
        let mut model = Model::new();
        let dividend = model.int_var(Bitset::from_values(20, vec![1, 2, 20]), None);
        let quotient = model.int_var(Bitset::full(20), None);
        let p = ScaledDivision { dividend, divisor: 10, quotient };
        let s1 = p.propagate(&model, &FdState::initial()).unwrap().unwrap();
        // floor(1/10) = floor(2/10) = 0, which is out of range and must not
        // be clamped up into a spurious quotient = 1; only floor(20/10) = 2
        // is a real witness.
        assert_eq!(s1.get_domain(&model, quotient).singleton_value(), Some(2));
    }
}
