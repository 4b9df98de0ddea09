//! Interval arithmetic helpers and the `IntervalArithmetic` propagator:
//! containment, intersection, convex-hull union, interval sum, and
//! interval difference, all operating on `[min,max]` bounds and
//! intersecting with current domains.
use crate::bitset::Bitset;
use crate::fd::model::Model;
use crate::fd::propagator::{commit_many, PropagateResult, Propagator};
use crate::fd::state::FdState;
use crate::fd::variable::FdVarId;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Interval {
    pub lo: u32,
    pub hi: u32,
}

impl Interval {
    pub fn of(d: &Bitset) -> Option<Interval> {
        Some(Interval { lo: d.min()?, hi: d.max()? })
    }

    pub fn contains(&self, other: &Interval) -> bool {
        self.lo <= other.lo && other.hi <= self.hi
    }

    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        let lo = self.lo.max(other.lo);
        let hi = self.hi.min(other.hi);
        if lo <= hi {
            Some(Interval { lo, hi })
        } else {
            None
        }
    }

    /// Convex hull union: the smallest interval containing both.
    pub fn union(&self, other: &Interval) -> Interval {
        Interval { lo: self.lo.min(other.lo), hi: self.hi.max(other.hi) }
    }

    pub fn add(&self, other: &Interval) -> Interval {
        Interval { lo: self.lo + other.lo, hi: self.hi + other.hi }
    }

    pub fn sub(&self, other: &Interval) -> Option<Interval> {
        let lo = self.lo as i64 - other.hi as i64;
        let hi = self.hi as i64 - other.lo as i64;
        if hi < 1 {
            None
        } else {
            Some(Interval { lo: lo.max(1) as u32, hi: hi as u32 })
        }
    }
}

/// `z = x + y` maintained as pure bounds propagation (complements
/// `Arithmetic`, which is domain-exact for a constant offset; this is the
/// two-variable-sum, bounds-consistent-only case module M calls for).
#[derive(Debug)]
pub struct IntervalArithmetic {
    pub x: FdVarId,
    pub y: FdVarId,
    pub z: FdVarId,
}

impl Propagator for IntervalArithmetic {
    fn variables(&self) -> Vec<FdVarId> {
        vec![self.x, self.y, self.z]
    }

    fn kind(&self) -> &'static str {
        "interval_arithmetic"
    }

    fn propagate(&self, model: &Model, state: &FdState) -> PropagateResult {
        let xdom = state.get_domain(model, self.x).clone();
        let ydom = state.get_domain(model, self.y).clone();
        let zdom = state.get_domain(model, self.z).clone();

        let (ix, iy, iz) = match (Interval::of(&xdom), Interval::of(&ydom), Interval::of(&zdom)) {
            (Some(a), Some(b), Some(c)) => (a, b, c),
            _ => return Ok(None),
        };

        let z_bound = ix.add(&iy);
        let new_z = match z_bound.intersect(&iz) {
            Some(iv) => iv,
            None => return Err(crate::fd::propagator::Failed),
        };
        let new_x = match iz.sub(&iy).and_then(|iv| iv.intersect(&ix)) {
            Some(iv) => iv,
            None => return Err(crate::fd::propagator::Failed),
        };
        let new_y = match iz.sub(&ix).and_then(|iv| iv.intersect(&iy)) {
            Some(iv) => iv,
            None => return Err(crate::fd::propagator::Failed),
        };

        let to_bitset = |iv: Interval, max_value: u32| {
            Bitset::from_values(max_value.max(iv.hi), iv.lo..=iv.hi)
        };

        commit_many(
            model,
            state,
            vec![self.x, self.y, self.z],
            vec![
                xdom.intersect(&to_bitset(new_x, xdom.max_value())),
                ydom.intersect(&to_bitset(new_y, ydom.max_value())),
                zdom.intersect(&to_bitset(new_z, zdom.max_value())),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_bounds_prune_the_result() {
        let mut model = Model::new();
        let x = model.int_var(Bitset::from_values(10, vec![1, 2]), None);
        let y = model.int_var(Bitset::from_values(10, vec![3, 4]), None);
        let z = model.int_var(Bitset::full(10), None);
        let p = IntervalArithmetic { x, y, z };
        let s1 = p.propagate(&model, &FdState::initial()).unwrap().unwrap();
        let zdom = s1.get_domain(&model, z);
        assert_eq!(zdom.min(), Some(4));
        assert_eq!(zdom.max(), Some(6));
    }
}
