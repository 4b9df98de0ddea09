//! Logic terms: variables, atoms, and pairs.
//!
//! Terms form a small closed algebra, shared via `Rc` so that unification and
//! deep-walking never need to copy subterms that are already ground or
//! already shared between two branches of a search.
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static UNIQUE_VAR_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Identity of a logic variable. Never reused, globally unique for the
/// lifetime of the process.
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct VarId(u64);

impl VarId {
    pub fn fresh() -> VarId {
        VarId(UNIQUE_VAR_COUNTER.fetch_add(1, Ordering::SeqCst))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "_.{}", self.0)
    }
}

/// An atomic (non-compound) scalar value carried by a `Term::Atom`.
#[derive(Clone, Debug)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Symbol(Rc<str>),
    Str(Rc<str>),
}

impl Value {
    pub fn symbol(s: &str) -> Value {
        Value::Symbol(Rc::from(s))
    }

    pub fn string(s: &str) -> Value {
        Value::Str(Rc::from(s))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => false,
        }
    }
}
impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Int(i) => {
                0u8.hash(state);
                i.hash(state);
            }
            Value::Bool(b) => {
                1u8.hash(state);
                b.hash(state);
            }
            Value::Symbol(s) => {
                2u8.hash(state);
                s.hash(state);
            }
            Value::Str(s) => {
                3u8.hash(state);
                s.hash(state);
            }
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Value {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

/// A logic term: a variable, an atomic value, a cons cell, or the empty list.
///
/// Shared structurally via `Rc`; cloning a `Term` is O(1).
#[derive(Clone, Debug)]
pub enum Term {
    Var(VarId, &'static str),
    Atom(Value),
    Pair(Rc<Term>, Rc<Term>),
    Nil,
}

impl Term {
    pub fn var(name: &'static str) -> Rc<Term> {
        Rc::new(Term::Var(VarId::fresh(), name))
    }

    pub fn fresh() -> Rc<Term> {
        Term::var("_")
    }

    pub fn atom<V: Into<Value>>(v: V) -> Rc<Term> {
        Rc::new(Term::Atom(v.into()))
    }

    pub fn symbol(s: &str) -> Rc<Term> {
        Rc::new(Term::Atom(Value::symbol(s)))
    }

    pub fn string(s: &str) -> Rc<Term> {
        Rc::new(Term::Atom(Value::string(s)))
    }

    pub fn nil() -> Rc<Term> {
        Rc::new(Term::Nil)
    }

    pub fn cons(car: Rc<Term>, cdr: Rc<Term>) -> Rc<Term> {
        Rc::new(Term::Pair(car, cdr))
    }

    pub fn from_vec(items: Vec<Rc<Term>>) -> Rc<Term> {
        let mut list = Term::nil();
        for item in items.into_iter().rev() {
            list = Term::cons(item, list);
        }
        list
    }

    pub fn is_var(&self) -> bool {
        matches!(self, Term::Var(_, _))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Term::Nil)
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Term::Pair(_, _))
    }

    pub fn is_atom(&self) -> bool {
        matches!(self, Term::Atom(_))
    }

    pub fn var_id(&self) -> Option<VarId> {
        match self {
            Term::Var(id, _) => Some(*id),
            _ => None,
        }
    }

    /// True iff the term contains no unbound variables directly in its own
    /// structure (does not walk through a substitution).
    pub fn is_ground_shape(&self) -> bool {
        match self {
            Term::Var(_, _) => false,
            Term::Atom(_) | Term::Nil => true,
            Term::Pair(car, cdr) => car.is_ground_shape() && cdr.is_ground_shape(),
        }
    }

    /// Collects the sequence of list elements, if `self` is a proper list.
    pub fn to_vec(self: &Rc<Term>) -> Option<Vec<Rc<Term>>> {
        let mut out = Vec::new();
        let mut cur = Rc::clone(self);
        loop {
            match cur.as_ref() {
                Term::Nil => return Some(out),
                Term::Pair(car, cdr) => {
                    out.push(Rc::clone(car));
                    cur = Rc::clone(cdr);
                }
                _ => return None,
            }
        }
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Term) -> bool {
        match (self, other) {
            (Term::Var(a, _), Term::Var(b, _)) => a == b,
            (Term::Atom(a), Term::Atom(b)) => a == b,
            (Term::Nil, Term::Nil) => true,
            (Term::Pair(a1, a2), Term::Pair(b1, b2)) => a1 == b1 && a2 == b2,
            _ => false,
        }
    }
}
impl Eq for Term {}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Term::Var(id, name) => write!(f, "{}{}", name, id),
            Term::Atom(Value::Int(i)) => write!(f, "{}", i),
            Term::Atom(Value::Bool(b)) => write!(f, "{}", b),
            Term::Atom(Value::Symbol(s)) => write!(f, "{}", s),
            Term::Atom(Value::Str(s)) => write!(f, "{:?}", s),
            Term::Nil => write!(f, "()"),
            Term::Pair(car, cdr) => write!(f, "({} . {})", car, cdr),
        }
    }
}
