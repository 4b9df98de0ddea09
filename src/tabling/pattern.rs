//! Call-pattern canonicalization: keys the subgoal table on a
//! structurally-renamed call rather than on the caller's own variables,
//! and remembers how to map a pulled answer back onto them.
use crate::relational::store::Store;
use crate::term::{Term, VarId};
use std::collections::HashMap;
use std::rc::Rc;

/// `(predicateId, canonicalArgStructure)`. Two calls are the same table
/// entry iff their patterns are equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallPattern {
    pub predicate_id: &'static str,
    key: String,
}

impl CallPattern {
    pub fn predicate_id(&self) -> &'static str {
        self.predicate_id
    }
}

/// Canonicalizes `args` under `store`: walks each, replacing every
/// distinct `Var` encountered with a positional token (`X0`, `X1`,...),
/// assigning the next unused index on first sight and reusing it on
/// repeated occurrences. Returns the pattern plus, in token order, the
/// original (caller-space) variable at each token -- the
/// "uncanonicalize" side of the split, needed to bind a pulled answer
/// back onto the caller's own variables.
pub fn canonicalize(
    predicate_id: &'static str,
    args: &[Rc<Term>],
    store: &Store,
) -> (CallPattern, Vec<VarId>) {
    let mut tokens: Vec<VarId> = Vec::new();
    let mut seen: HashMap<VarId, usize> = HashMap::new();
    let parts: Vec<String> = args.iter().map(|a| render(a, store, &mut tokens, &mut seen)).collect();
    let key = format!("{}({})", predicate_id, parts.join(","));
    (CallPattern { predicate_id, key }, tokens)
}

fn render(
    t: &Rc<Term>,
    store: &Store,
    tokens: &mut Vec<VarId>,
    seen: &mut HashMap<VarId, usize>,
) -> String {
    let walked = store.walk(t);
    match walked.as_ref() {
        Term::Var(id, _) => {
            let idx = *seen.entry(*id).or_insert_with(|| {
                tokens.push(*id);
                tokens.len() - 1
            });
            format!("X{}", idx)
        }
        Term::Atom(v) => format!("atom({:?})", v),
        Term::Nil => "nil".to_string(),
        Term::Pair(car, cdr) => format!(
            "pair({},{})",
            render(car, store, tokens, seen),
            render(cdr, store, tokens, seen)
        ),
    }
}
