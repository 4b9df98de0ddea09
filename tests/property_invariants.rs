//! Property-based checks for the universal invariants that hold
//! regardless of which concrete propagator, term, or answer happens to be
//! involved: FD state isolation, unification reflexivity/symmetry, and
//! answer-trie insert idempotence.
use gokando::prelude::*;
use gokando::tabling::{AnswerTrie, Bindings, DelaySet};
use proptest::prelude::*;
use std::rc::Rc;

/// A handful of distinct atoms to build terms from, small enough that
/// proptest's shrinker stays useful.
fn atom_label() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["a", "b", "c", "d"])
}

/// An arbitrary subset of `{1..=16}`, including the empty set.
fn small_domain() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(1u32..=16, 0..8)
}

proptest! {
    /// `setDomain(s, id, d)` only ever touches the one variable it names:
    /// the variable it was called on reads back exactly `d`, and every
    /// other variable's domain is untouched.
    #[test]
    fn set_domain_only_changes_its_own_variable(values in small_domain()) {
        let mut model = Model::new();
        let target = model.int_var(Bitset::full(16), Some("target"));
        let other = model.int_var(Bitset::full(16), Some("other"));

        let before = FdState::initial();
        let other_before = before.get_domain(&model, other).clone();

        let d = Bitset::from_values(16, values);
        let (after, _changed) = before.set_domain(&model, target, d.clone());

        prop_assert!(after.get_domain(&model, target).equal(&d));
        prop_assert!(after.get_domain(&model, other).equal(&other_before));
    }

    /// Unifying a term with itself never extends the substitution.
    #[test]
    fn unify_with_self_is_a_no_op(label in atom_label()) {
        let store = Store::new();
        let t = Term::symbol(label);
        let unified = store.unify(&t, &t).expect("an atom always unifies with itself");
        prop_assert_eq!(unified.smap.len(), store.smap.len());
    }

    /// Unification is symmetric: `unify(x, y)` succeeds exactly when
    /// `unify(y, x)` does, and when it does, both sides walk to the same
    /// value afterward.
    #[test]
    fn unify_is_symmetric(label in atom_label()) {
        let store = Store::new();
        let x = Term::fresh();
        let y = Term::fresh();
        let value = Term::symbol(label);

        let forward = store.bind(x.var_id().unwrap(), Rc::clone(&value)).unwrap();
        let forward = forward.unify(&x, &y);
        let backward = store.bind(x.var_id().unwrap(), Rc::clone(&value)).unwrap();
        let backward = backward.unify(&y, &x);

        prop_assert_eq!(forward.is_some(), backward.is_some());
        if let (Some(f), Some(b)) = (forward, backward) {
            prop_assert_eq!(f.deep_walk(&x), b.deep_walk(&x));
            prop_assert_eq!(f.deep_walk(&y), b.deep_walk(&y));
        }
    }

    /// Inserting the same answer twice leaves the trie unchanged: the
    /// second `insert` reports no change and the count doesn't grow.
    #[test]
    fn answer_trie_insert_is_idempotent(label in atom_label()) {
        let mut trie = AnswerTrie::new();
        let var = Term::fresh().var_id().unwrap();
        let mut bindings = Bindings::new();
        bindings.insert(var, Term::symbol(label));

        let first = trie.insert(bindings.clone(), DelaySet::empty());
        let count_after_first = trie.count();
        let second = trie.insert(bindings, DelaySet::empty());

        prop_assert!(first);
        prop_assert!(!second);
        prop_assert_eq!(trie.count(), count_after_first);
    }
}
