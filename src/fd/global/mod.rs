//! Global constraints: Cumulative, Regular, Among,
//! NValue/DistinctCount/AtMost/AtLeast, LexLessEq, Sequence,
//! InSetReified, IntervalArithmetic. `ScaledDivision` lives with the
//! arithmetic family in `fd::propagator` since it shares that module's
//! forward/backward-image shape.
pub mod among;
pub mod count;
pub mod cumulative;
pub mod interval;
pub mod inset;
pub mod lex;
pub mod regular;
pub mod sequence;

pub use among::Among;
pub use count::{AtLeastNValues, AtMostNValues, DistinctCount, NValue};
pub use cumulative::Cumulative;
pub use interval::{Interval, IntervalArithmetic};
pub use inset::InSetReified;
pub use lex::LexLessEq;
pub use regular::Regular;
pub use sequence::Sequence;
