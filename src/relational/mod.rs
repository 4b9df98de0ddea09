//! The relational search core (modules I/J): constraint store, goals,
//! lazy stream, the standard goal combinators, the standard relation
//! library, and `Run`/`RunStar`.
pub mod combinators;
pub mod constraint;
pub mod goal;
pub mod relations;
pub mod run;
pub mod store;
pub mod stream;

pub use combinators::{conj, conj_all, disj, disj_all, eq, fresh};
pub use constraint::{Absence, CheckResult, Disequality, RelationalConstraint, TypeConstraint, TypeKind};
pub use goal::{Goal, GoalImpl};
pub use relations::*;
pub use run::{run, run_star, run_with_context};
pub use store::Store;
pub use stream::{Lazy, LazyStream, Stream};
