//! Lazy, cancellable stream of stores.
//!
//! Grounded on the `Lazy`/`LazyStream`/`Stream` trampoline and
//! `StreamEngine::step`, generalized from `User`/`Engine`-parameterized
//! types to the closed `Goal`/`Store` pair this crate uses everywhere.
//! The trampoline shape (an explicit `step` function rather than direct
//! recursion) is kept because it is what lets `Disj` interleave fairly
//! instead of exhausting its left branch first.
use crate::context::CancellationToken;
use crate::relational::goal::Goal;
use crate::relational::store::Store;

#[derive(Debug)]
pub enum Lazy {
    Bind(LazyStream, Goal),
    MPlus(LazyStream, LazyStream),
    Pause(Box<Store>, Goal),
}

#[derive(Debug)]
pub struct LazyStream(pub Box<Lazy>);

impl LazyStream {
    pub fn bind(ls: LazyStream, goal: Goal) -> LazyStream {
        LazyStream(Box::new(Lazy::Bind(ls, goal)))
    }

    pub fn mplus(ls1: LazyStream, ls2: LazyStream) -> LazyStream {
        LazyStream(Box::new(Lazy::MPlus(ls1, ls2)))
    }

    pub fn pause(store: Box<Store>, goal: Goal) -> LazyStream {
        LazyStream(Box::new(Lazy::Pause(store, goal)))
    }
}

#[derive(Debug)]
pub enum Stream {
    Empty,
    Unit(Box<Store>),
    Lazy(LazyStream),
    Cons(Box<Store>, LazyStream),
}

impl Stream {
    pub fn unit(s: Box<Store>) -> Stream {
        Stream::Unit(s)
    }

    pub fn empty() -> Stream {
        Stream::Empty
    }

    pub fn cons(s: Box<Store>, lazy: LazyStream) -> Stream {
        Stream::Cons(s, lazy)
    }

    pub fn lazy(lazy: LazyStream) -> Stream {
        Stream::Lazy(lazy)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Stream::Empty)
    }

    pub fn is_mature(&self) -> bool {
        !matches!(self, Stream::Lazy(_))
    }

    pub fn mplus(stream: Stream, lazy: LazyStream) -> Stream {
        match stream {
            Stream::Empty => Stream::lazy(lazy),
            Stream::Lazy(lazy_hat) => Stream::lazy(LazyStream::mplus(lazy, lazy_hat)),
            Stream::Unit(a) => Stream::cons(a, lazy),
            Stream::Cons(head, lazy_hat) => {
                Stream::cons(head, LazyStream::mplus(lazy, lazy_hat))
            }
        }
    }

    pub fn bind(stream: Stream, goal: Goal) -> Stream {
        if goal.is_succeed() {
            stream
        } else if goal.is_fail() {
            Stream::empty()
        } else {
            match stream {
                Stream::Empty => Stream::Empty,
                Stream::Lazy(lazy) => Stream::lazy(LazyStream::bind(lazy, goal)),
                Stream::Unit(a) => Stream::lazy(LazyStream::pause(a, goal)),
                Stream::Cons(store, lazy) => Stream::lazy(LazyStream::mplus(
                    LazyStream::pause(store, goal.clone()),
                    LazyStream::bind(lazy, goal),
                )),
            }
        }
    }

    pub fn pause(store: Box<Store>, goal: Goal) -> Stream {
        Stream::lazy(LazyStream::pause(store, goal))
    }

    /// Advances a suspended `Lazy` computation by exactly one trampoline
    /// step, honouring cancellation at every suspension point: a
    /// cancelled context collapses any pending computation to `Empty`
    /// instead of continuing to unfold it.
    pub fn step(ctx: &CancellationToken, lazy: Lazy) -> Stream {
        if ctx.is_cancelled() {
            return Stream::Empty;
        }
        match lazy {
            Lazy::Pause(store, goal) => goal.solve(ctx, store),
            Lazy::MPlus(s1, s2) => {
                let stream = Stream::step(ctx, *s1.0);
                Stream::mplus(stream, s2)
            }
            Lazy::Bind(s, goal) => {
                let stream = Stream::step(ctx, *s.0);
                Stream::bind(stream, goal)
            }
        }
    }

    /// Forces the stream to a mature head (`Empty`, `Unit`, or `Cons`) by
    /// repeatedly stepping through any pending `Lazy` suspension.
    pub fn mature(self, ctx: &CancellationToken) -> Stream {
        let mut s = self;
        while let Stream::Lazy(lazy) = s {
            s = Stream::step(ctx, *lazy.0);
        }
        s
    }

    /// Takes up to `n` stores from the stream (`n == 0` means unbounded).
    pub fn take(self, ctx: &CancellationToken, n: usize) -> Vec<Box<Store>> {
        let mut out = Vec::new();
        let mut s = self;
        loop {
            if n != 0 && out.len() >= n {
                return out;
            }
            if ctx.is_cancelled() {
                return out;
            }
            s = s.mature(ctx);
            match s {
                Stream::Empty => return out,
                Stream::Unit(store) => {
                    out.push(store);
                    return out;
                }
                Stream::Cons(store, rest) => {
                    out.push(store);
                    s = Stream::Lazy(rest);
                }
                Stream::Lazy(_) => unreachable!("mature never returns Lazy"),
            }
        }
    }
}
