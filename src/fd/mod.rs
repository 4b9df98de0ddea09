//! The finite-domain constraint engine: variables, model, copy-on-write
//! state, propagators, the fixed-point scheduler, and backtracking search.
pub mod global;
pub mod model;
pub mod propagator;
pub mod reify;
pub mod scheduler;
pub mod search;
pub mod state;
pub mod variable;

pub use model::Model;
pub use state::FdState;
pub use variable::FdVarId;
