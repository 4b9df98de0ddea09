//! Delay sets: the negative dependencies a conditional tabled answer
//! carries.
use crate::tabling::subgoal::SubgoalId;
use std::collections::HashSet;

/// The set of subgoals an answer is conditionally dependent on. Empty
/// means the answer is unconditional.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DelaySet(HashSet<SubgoalId>);

impl DelaySet {
    pub fn empty() -> DelaySet {
        DelaySet(HashSet::new())
    }

    pub fn of(id: SubgoalId) -> DelaySet {
        let mut s = HashSet::new();
        s.insert(id);
        DelaySet(s)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: SubgoalId) -> bool {
        self.0.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubgoalId> {
        self.0.iter()
    }

    pub fn union(&self, other: &DelaySet) -> DelaySet {
        DelaySet(self.0.union(&other.0).copied().collect())
    }
}
