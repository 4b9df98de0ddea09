//! The unified/hybrid store: a relational store and an FD
//! overlay sharing variable identity, plus the round-robin bridge that
//! keeps them mutually consistent.
pub mod registry;
pub mod solver;
pub mod store;

pub use registry::HybridRegistry;
pub use solver::HybridSolver;
pub use store::UnifiedStore;
