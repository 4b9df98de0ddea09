//! The answer trie: a de-duplicated, ordered store of answers
//! for one tabled subgoal, with subsumption-aware insertion and
//! domain-driven invalidation.
use crate::tabling::delay::DelaySet;
use crate::term::{Term, VarId};
use std::collections::BTreeMap;
use std::rc::Rc;

pub type Bindings = BTreeMap<VarId, Rc<Term>>;

#[derive(Clone, Debug)]
pub struct Answer {
    pub bindings: Bindings,
    pub delay: DelaySet,
    retracted: bool,
}

impl Answer {
    pub fn is_retracted(&self) -> bool {
        self.retracted
    }
}

/// `a` subsumes `b` iff every key in `a` is present in `b` with an equal
/// term: `a`'s binding map is a subset of `b`'s as key-value pairs.
fn subsumes(a: &Bindings, b: &Bindings) -> bool {
    a.iter().all(|(k, v)| b.get(k).map_or(false, |bv| bv == v))
}

#[derive(Clone, Debug, Default)]
pub struct AnswerTrie {
    answers: Vec<Answer>,
}

impl AnswerTrie {
    pub fn new() -> AnswerTrie {
        AnswerTrie { answers: Vec::new() }
    }

    /// Inserts `bindings` with the given delay set. Returns whether the
    /// answer is new: a new answer subsumed by an existing one is
    /// dropped (returns `false`); an existing answer subsumed by the new
    /// one is retracted (soft-deleted) as the new one is inserted.
    pub fn insert(&mut self, bindings: Bindings, delay: DelaySet) -> bool {
        for existing in &self.answers {
            if existing.is_retracted() {
                continue;
            }
            if subsumes(&existing.bindings, &bindings) {
                return false;
            }
        }
        for existing in &mut self.answers {
            if !existing.is_retracted() && subsumes(&bindings, &existing.bindings) {
                existing.retracted = true;
            }
        }
        self.answers.push(Answer { bindings, delay, retracted: false });
        true
    }

    pub fn count(&self) -> usize {
        self.answers.iter().filter(|a| !a.is_retracted()).count()
    }

    pub fn first_live(&self) -> Option<&Answer> {
        self.answers.iter().find(|a| !a.is_retracted())
    }

    pub fn get(&self, index: usize) -> Option<&Answer> {
        self.answers.get(index).filter(|a| !a.is_retracted())
    }

    pub fn raw_len(&self) -> usize {
        self.answers.len()
    }

    /// Ordered iteration skipping retracted (soft-deleted) answers.
    pub fn iter(&self) -> impl Iterator<Item = &Answer> {
        self.answers.iter().filter(|a| !a.is_retracted())
    }

    /// Ordered iteration of live answers starting at raw index `from`.
    pub fn iter_from(&self, from: usize) -> impl Iterator<Item = &Answer> {
        self.answers[from.min(self.answers.len())..]
            .iter()
            .filter(|a| !a.is_retracted())
    }

    pub fn invalidate_index(&mut self, index: usize) {
        if let Some(a) = self.answers.get_mut(index) {
            a.retracted = true;
        }
    }

    /// Retracts every answer whose binding for `var_id` is an integer
    /// atom not contained in `domain`.
    pub fn invalidate_by_domain(&mut self, var_id: VarId, domain: &[i64]) {
        for a in &mut self.answers {
            if a.retracted {
                continue;
            }
            if let Some(term) = a.bindings.get(&var_id) {
                if let Term::Atom(crate::term::Value::Int(v)) = term.as_ref() {
                    if !domain.contains(v) {
                        a.retracted = true;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(pairs: &[(VarId, Rc<Term>)]) -> Bindings {
        pairs.iter().cloned().collect()
    }

    #[test]
    fn inserting_the_same_answer_twice_reports_not_new() {
        let mut trie = AnswerTrie::new();
        let v = VarId::fresh();
        let bindings = b(&[(v, Term::atom(1i64))]);
        assert!(trie.insert(bindings.clone(), DelaySet::empty()));
        assert!(!trie.insert(bindings, DelaySet::empty()));
        assert_eq!(trie.count(), 1);
    }

    #[test]
    fn a_more_general_answer_retracts_a_more_specific_one() {
        let mut trie = AnswerTrie::new();
        let v1 = VarId::fresh();
        let v2 = VarId::fresh();
        let specific = b(&[(v1, Term::atom(1i64)), (v2, Term::atom(2i64))]);
        let general = b(&[(v1, Term::atom(1i64))]);
        assert!(trie.insert(specific, DelaySet::empty()));
        assert!(trie.insert(general, DelaySet::empty()));
        assert_eq!(trie.count(), 1);
    }

    #[test]
    fn a_more_specific_answer_is_dropped_when_subsumed() {
        let mut trie = AnswerTrie::new();
        let v1 = VarId::fresh();
        let v2 = VarId::fresh();
        let general = b(&[(v1, Term::atom(1i64))]);
        let specific = b(&[(v1, Term::atom(1i64)), (v2, Term::atom(2i64))]);
        assert!(trie.insert(general, DelaySet::empty()));
        assert!(!trie.insert(specific, DelaySet::empty()));
        assert_eq!(trie.count(), 1);
    }

    #[test]
    fn invalidate_by_domain_retracts_out_of_range_answers() {
        let mut trie = AnswerTrie::new();
        let v = VarId::fresh();
        trie.insert(b(&[(v, Term::atom(5i64))]), DelaySet::empty());
        trie.insert(b(&[(v, Term::atom(9i64))]), DelaySet::empty());
        trie.invalidate_by_domain(v, &[1, 2, 3, 4, 5]);
        assert_eq!(trie.count(), 1);
    }
}
