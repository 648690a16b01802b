//! Admissible lower bounds on a path's optimal cost.
//!
//! The relaxation keeps every vertex at order 1 (a straight segment), keeps
//! region membership, duration bounds, start/goal pinning, position
//! continuity and the same costs, and drops velocity bounds and
//! higher-derivative continuity.
//!
//! Admissibility: a feasible order-k solution `(x_0..x_k, h)` maps to the
//! order-1 point `(x_0, x_k, h)`, which stays inside each convex region, keeps
//! the shared endpoints and durations, and has `‖W(x_k − x_0)‖ <= Σ‖W Δx‖` by
//! the triangle inequality. Costs are non-negative and a prefix carries a
//! subset of the extended path's bindings, so bounds grow along a path.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::backend::{SolveStatus, SolverBackend};
use crate::cfg::GcsCfg;
use crate::error::Result;
use crate::formulate::{Assembler, AssemblerCfg, TimeCostModel};
use crate::graph::{EdgeId, RegionGraph, ResolvedPath, VertexId};
use crate::rewrite::ConicProgram;

/// Owns the relaxed formulation; the primary assembler is never touched.
#[derive(Clone, Debug)]
pub struct LowerBoundEstimator {
    assembler: Assembler,
}

impl LowerBoundEstimator {
    pub fn new(
        graph: &RegionGraph,
        cfg: &GcsCfg,
        time_model: Arc<dyn TimeCostModel>,
    ) -> Result<Self> {
        let acfg = AssemblerCfg {
            order: 1,
            num_positions: graph.dim(),
            h_min: cfg.h_min,
            h_max: cfg.h_max,
        };
        let mut assembler = Assembler::new(graph, acfg, time_model)?;
        if cfg.path_length_weight > 0.0 {
            assembler.add_path_length_cost(graph, cfg.path_length_weight)?;
        }
        if cfg.time_weight > 0.0 {
            assembler.add_time_cost(graph, cfg.time_weight)?;
        }
        assembler.add_path_continuity_constraint(graph, 0)?;
        Ok(Self { assembler })
    }

    #[inline]
    pub fn assembler(&self) -> &Assembler {
        &self.assembler
    }

    pub(crate) fn assembler_mut(&mut self) -> &mut Assembler {
        &mut self.assembler
    }

    /// Bound for an already resolved path; `f64::INFINITY` when even the
    /// relaxation is infeasible.
    ///
    /// A converged relaxation is lowered by the solver's gap allowance so the
    /// bound never exceeds the optimum. When the relaxation stops without
    /// converging, the bound falls back to the largest converged bound over
    /// the path's proper prefixes (0 if none converge), which keeps bounds
    /// non-decreasing along a path.
    pub fn bound(&self, backend: &SolverBackend, path: &ResolvedPath, thread_id: usize) -> Result<f64> {
        if let Some(bound) = self.relaxed(backend, path, thread_id)? {
            return Ok(bound);
        }
        let mut fallback = 0.0_f64;
        for len in (1..path.vertices.len()).rev() {
            if let Some(b) = self.relaxed(backend, &path.prefix(len), thread_id)? {
                fallback = fallback.max(b);
            }
        }
        warn!(
            vertices = path.vertices.len(),
            fallback, "relaxation did not converge, using prefix bound"
        );
        Ok(fallback)
    }

    /// One relaxed solve; `None` when the solver stopped without an answer.
    fn relaxed(
        &self,
        backend: &SolverBackend,
        path: &ResolvedPath,
        thread_id: usize,
    ) -> Result<Option<f64>> {
        let problem = self.assembler.induce(path)?;
        let prog = ConicProgram::from_induced(&problem)?;
        let raw = backend.session(thread_id)?.solve(&prog)?;
        let bound = match raw.status {
            _ if raw.success => {
                let almost = raw.status == SolveStatus::AlmostSolved;
                let slack = backend.cfg().gap_allowance(almost, raw.objective);
                Some((raw.objective - slack).max(0.0))
            }
            SolveStatus::Infeasible => Some(f64::INFINITY),
            _ => None,
        };
        debug!(
            vertices = path.vertices.len(),
            status = %raw.status,
            bound = ?bound,
            "lower bound"
        );
        Ok(bound)
    }

    /// Resolve `vertices` on `graph` and bound it.
    pub fn bound_path(
        &self,
        graph: &RegionGraph,
        backend: &SolverBackend,
        vertices: &[VertexId],
        edges: Option<&[EdgeId]>,
        thread_id: usize,
    ) -> Result<f64> {
        let path = graph.resolve_path(vertices, edges)?;
        self.bound(backend, &path, thread_id)
    }
}
