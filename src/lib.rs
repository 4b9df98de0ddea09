//! A relational logic programming core with finite-domain constraints
//! and SLG tabling.
//!
//! Three layers share one crate: a miniKanren-style relational engine
//! (`term`, `substitution`, `relational`) with fair disjunction and an
//! occurs-checked unifier; a finite-domain constraint solver
//! (`bitset`, `fd`) with a confluent propagation scheduler, backtracking
//! search, and a catalogue of global constraints; and an SLG tabling
//! engine (`tabling`) giving recursive relations well-founded
//! negation-as-failure instead of infinite regress. `hybrid` bridges the
//! first two so a relational variable and an FD variable can stand for
//! the same unknown.
pub mod bitset;
pub mod context;
pub mod error;
pub mod fd;
pub mod hybrid;
pub mod relational;
pub mod substitution;
pub mod tabling;
pub mod term;

/// Re-exports the crate's everyday surface: term construction, the goal
/// combinators and standard relations, the runners, and the FD/hybrid/
/// tabling entry points. `use gokando::prelude::*;` is the intended way
/// to consume this crate.
pub mod prelude {
    pub use crate::context::CancellationToken;
    pub use crate::error::{Error, Result};
    pub use crate::term::{Term, Value, VarId};

    pub use crate::relational::*;

    pub use crate::bitset::Bitset;
    pub use crate::fd::model::{Model, SearchConfig, ValueHeuristic, VariableHeuristic};
    pub use crate::fd::propagator::{
        AllDifferent, Arithmetic, Comparison, Failed, Inequality, Propagator, ScaledDivision,
    };
    pub use crate::fd::reify::Reify;
    pub use crate::fd::scheduler::propagate_to_fixpoint;
    pub use crate::fd::search::{solve, solve_parallel, Solution};
    pub use crate::fd::state::FdState;
    pub use crate::fd::variable::FdVarId;
    pub use crate::fd::global::{
        Among, AtLeastNValues, AtMostNValues, Cumulative, DistinctCount, Interval,
        IntervalArithmetic, InSetReified, LexLessEq, NValue, Regular, Sequence,
    };

    pub use crate::hybrid::{HybridRegistry, HybridSolver, UnifiedStore};

    pub use crate::tabling::{tnot, CallPattern, Engine, TabledPredicate, Truth};
}
