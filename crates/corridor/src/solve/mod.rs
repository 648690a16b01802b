//! Path solves, cost recomputation and lower bounds.
//!
//! A solve never touches elements outside its path: the graph resolves the
//! ids, the assembler lends out the path's bindings, the rewriter turns them
//! into a conic program and one backend session solves it. All of it reads
//! shared state only, so distinct `thread_id`s can solve concurrently.

mod lower_bound;
mod path;

use nalgebra::DVector;

pub use lower_bound::LowerBoundEstimator;
pub use path::PathSolver;

pub use crate::backend::SolveStatus;
use crate::graph::{EdgeId, ResolvedPath, VertexId};
use crate::trajectory::CompositeTrajectory;

/// One path query.
#[derive(Clone, Copy, Debug)]
pub struct SolveRequest<'a> {
    pub vertices: &'a [VertexId],
    /// Explicit transitions; looked up from consecutive vertices when `None`.
    pub edges: Option<&'a [EdgeId]>,
    /// Full decision vector in induced column order (path order, then slot order).
    pub initial_guess: Option<&'a DVector<f64>>,
    /// Solver session to run on.
    pub thread_id: usize,
}

impl<'a> SolveRequest<'a> {
    pub fn new(vertices: &'a [VertexId]) -> Self {
        Self {
            vertices,
            edges: None,
            initial_guess: None,
            thread_id: 0,
        }
    }

    pub fn edges(mut self, edges: &'a [EdgeId]) -> Self {
        self.edges = Some(edges);
        self
    }

    pub fn initial_guess(mut self, guess: &'a DVector<f64>) -> Self {
        self.initial_guess = Some(guess);
        self
    }

    pub fn thread_id(mut self, thread_id: usize) -> Self {
        self.thread_id = thread_id;
        self
    }
}

/// Outcome flags of one solve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolveResult {
    pub success: bool,
    pub status: SolveStatus,
    /// Optimal objective; `f64::INFINITY` unless `success`.
    pub cost: f64,
    pub iterations: u32,
    /// Seconds spent inside the backend.
    pub solve_time: f64,
}

/// Trajectory plus solver outcome. The trajectory is present iff the solve succeeded.
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
    pub trajectory: Option<CompositeTrajectory>,
    pub result: SolveResult,
    /// The resolved path the solve ran on.
    pub path: ResolvedPath,
    /// Optimized decision columns (no slacks); empty unless `success`.
    pub x: DVector<f64>,
}

impl Solution {
    #[inline]
    pub fn success(&self) -> bool {
        self.result.success
    }

    #[inline]
    pub fn cost(&self) -> f64 {
        self.result.cost
    }
}
