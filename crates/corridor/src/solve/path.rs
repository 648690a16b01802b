//! Full-order solve of one path and trajectory reconstruction.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use super::{Solution, SolveRequest, SolveResult};
use crate::backend::SolverBackend;
use crate::error::{GcsError, Result};
use crate::formulate::{Assembler, Block, InducedProblem};
use crate::graph::RegionGraph;
use crate::rewrite::ConicProgram;
use crate::trajectory::{BezierSegment, CompositeTrajectory};

/// Read-only view over the pieces a path solve needs.
#[derive(Clone, Copy, Debug)]
pub struct PathSolver<'a> {
    graph: &'a RegionGraph,
    assembler: &'a Assembler,
    backend: &'a SolverBackend,
}

impl<'a> PathSolver<'a> {
    pub fn new(graph: &'a RegionGraph, assembler: &'a Assembler, backend: &'a SolverBackend) -> Self {
        Self {
            graph,
            assembler,
            backend,
        }
    }

    /// Solve the problem induced by `req`'s path.
    ///
    /// Structural problems (unknown ids, revisits, bad edges, guess size) and
    /// an unavailable session are errors; an infeasible or unconverged
    /// program is a `Solution` with `success == false`.
    pub fn solve(&self, req: &SolveRequest<'_>) -> Result<Solution> {
        let path = self.graph.resolve_path(req.vertices, req.edges)?;
        let problem = self.assembler.induce(&path)?;
        if let Some(guess) = req.initial_guess {
            check_guess(&problem, guess)?;
        }
        let prog = ConicProgram::from_induced(&problem)?;
        debug!(
            vertices = path.vertices.len(),
            edges = path.edges.len(),
            vars = problem.num_vars,
            slacks = prog.num_slacks,
            rows = prog.num_rows(),
            "induced path problem"
        );
        let raw = self.backend.session(req.thread_id)?.solve(&prog)?;
        if !raw.success {
            warn!(status = %raw.status, vertices = path.vertices.len(), "path solve failed");
            return Ok(Solution {
                trajectory: None,
                result: SolveResult {
                    success: false,
                    status: raw.status,
                    cost: f64::INFINITY,
                    iterations: raw.iterations,
                    solve_time: raw.solve_time,
                },
                path,
                x: DVector::zeros(0),
            });
        }
        let x = DVector::from_column_slice(&raw.x[..problem.num_vars]);
        let trajectory = reconstruct(&problem.blocks, &x);
        Ok(Solution {
            trajectory: Some(trajectory),
            result: SolveResult {
                success: true,
                status: raw.status,
                cost: raw.objective,
                iterations: raw.iterations,
                solve_time: raw.solve_time,
            },
            path,
            x,
        })
    }

    /// Realized cost of a successful solution: every cost binding of its path
    /// evaluated at the optimized control points and durations. Slacks and the
    /// solver's objective are not consulted. Failed solutions cost infinity.
    pub fn calculate_cost(&self, solution: &Solution) -> Result<f64> {
        if !solution.success() {
            return Ok(f64::INFINITY);
        }
        let problem = self.assembler.induce(&solution.path)?;
        if solution.x.len() != problem.num_vars {
            return Err(GcsError::DimensionMismatch {
                expected: problem.num_vars,
                got: solution.x.len(),
            });
        }
        Ok(problem.cost_at(solution.x.as_slice()))
    }
}

/// The backend is interior-point and cannot warm start, so a guess is only
/// checked for shape and reported.
fn check_guess(problem: &InducedProblem<'_>, guess: &DVector<f64>) -> Result<()> {
    if guess.len() != problem.num_vars {
        return Err(GcsError::DimensionMismatch {
            expected: problem.num_vars,
            got: guess.len(),
        });
    }
    debug!(
        guess_cost = problem.cost_at(guess.as_slice()),
        guess_violation = problem.violation_at(guess.as_slice()),
        "initial guess"
    );
    Ok(())
}

/// One segment per region vertex in path order; start/goal blocks only pin
/// endpoints and are skipped unless the path has nothing else.
fn reconstruct(blocks: &[Block], x: &DVector<f64>) -> CompositeTrajectory {
    let timed: Vec<&Block> = blocks.iter().filter(|b| b.vars.order() > 0).collect();
    let chosen: Vec<&Block> = if timed.is_empty() {
        blocks.iter().take(1).collect()
    } else {
        timed
    };
    let mut t = 0.0;
    let segments = chosen
        .into_iter()
        .map(|b| {
            let layout = b.vars.layout;
            let cp = DMatrix::from_fn(layout.num_positions, layout.num_control_points(), |d, k| {
                x[b.offset + layout.control_slot(k, d)]
            });
            let h = x[b.offset + layout.duration_slot()].max(0.0);
            let seg = BezierSegment::new(cp, t, t + h);
            t += h;
            seg
        })
        .collect();
    CompositeTrajectory::new(segments)
}
