//! A goal: a pure function `(ctx, store) -> Stream<store>`.
//!
//! Grounded on the `Goal<U, E>` enum (`Succeed`/`Fail`/`Breakpoint`/
//! `Dynamic`) and its `Solve` trait, generalized away from the
//! `User`/`Engine` type parameters: this crate has one closed `Term`
//! algebra and one fair `Disj`, so there is nothing left to parameterize
//! over.
use crate::context::CancellationToken;
use crate::relational::store::Store;
use crate::relational::stream::Stream;
use std::fmt;
use std::rc::Rc;

pub trait GoalImpl: fmt::Debug {
    fn solve(&self, ctx: &CancellationToken, store: Box<Store>) -> Stream;
}

#[derive(Clone, Debug)]
pub enum Goal {
    Succeed,
    Fail,
    Dynamic(Rc<dyn GoalImpl>),
}

impl Goal {
    pub fn dynamic(g: impl GoalImpl + 'static) -> Goal {
        Goal::Dynamic(Rc::new(g))
    }

    pub fn is_succeed(&self) -> bool {
        matches!(self, Goal::Succeed)
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Goal::Fail)
    }

    pub fn solve(&self, ctx: &CancellationToken, store: Box<Store>) -> Stream {
        if ctx.is_cancelled() {
            return Stream::Empty;
        }
        match self {
            Goal::Succeed => Stream::unit(store),
            Goal::Fail => Stream::empty(),
            Goal::Dynamic(d) => d.solve(ctx, store),
        }
    }
}
