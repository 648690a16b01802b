//! `GcsOpt`: the engine façade.
//!
//! Owns the region graph, the primary assembler and the lower-bound
//! estimator, and shares a solver backend. Solving borrows `&self`; anything
//! that changes the graph or the formulation borrows `&mut self`.

use std::collections::HashMap;
use std::sync::Arc;

use nalgebra::{DMatrix, DVector};
use tracing::info;

use crate::backend::SolverBackend;
use crate::cfg::GcsCfg;
use crate::error::{GcsError, Result};
use crate::formulate::{Assembler, AssemblerCfg, LinearTimeCost, TimeCostModel};
use crate::graph::{Edge, EdgeId, RegionGraph, Vertex, VertexId, VertexKind};
use crate::region::HPolytope;
use crate::solve::{LowerBoundEstimator, PathSolver, Solution, SolveRequest};

#[derive(Clone, Debug)]
pub struct GcsOpt {
    graph: RegionGraph,
    assembler: Assembler,
    lower_bound: LowerBoundEstimator,
    cfg: GcsCfg,
    backend: Arc<SolverBackend>,
    start: Option<VertexId>,
    goal: Option<VertexId>,
}

impl GcsOpt {
    /// Build the graph and formulate everything `cfg` asks for, with a linear time cost.
    pub fn new(
        regions: Vec<HPolytope>,
        adjacency: &[(usize, usize)],
        cfg: GcsCfg,
        backend: Arc<SolverBackend>,
    ) -> Result<Self> {
        Self::with_time_model(regions, adjacency, cfg, backend, Arc::new(LinearTimeCost))
    }

    pub fn with_time_model(
        regions: Vec<HPolytope>,
        adjacency: &[(usize, usize)],
        cfg: GcsCfg,
        backend: Arc<SolverBackend>,
        time_model: Arc<dyn TimeCostModel>,
    ) -> Result<Self> {
        let graph = RegionGraph::build(regions, adjacency)?;
        let n = graph.dim();
        cfg.validate(n)?;
        let acfg = AssemblerCfg {
            order: cfg.order,
            num_positions: n,
            h_min: cfg.h_min,
            h_max: cfg.h_max,
        };
        let mut assembler = Assembler::new(&graph, acfg, Arc::clone(&time_model))?;
        if cfg.path_length_weight > 0.0 {
            assembler.add_path_length_cost(&graph, cfg.path_length_weight)?;
        }
        if cfg.time_weight > 0.0 {
            assembler.add_time_cost(&graph, cfg.time_weight)?;
        }
        assembler.add_path_continuity_constraint(&graph, cfg.continuity_order)?;
        if let Some((lb, ub)) = cfg.velocity_bounds(n) {
            assembler.add_velocity_constraint(&graph, &lb, &ub)?;
        }
        let lower_bound = LowerBoundEstimator::new(&graph, &cfg, time_model)?;
        info!(
            order = cfg.order,
            time_model = assembler.time_model().name(),
            "engine ready"
        );
        Ok(Self {
            graph,
            assembler,
            lower_bound,
            cfg,
            backend,
            start: None,
            goal: None,
        })
    }

    // --- formulation ---------------------------------------------------------

    /// Extra path-length cost on both the full and the relaxed formulation.
    pub fn add_path_length_cost(&mut self, weight: f64) -> Result<()> {
        self.assembler.add_path_length_cost(&self.graph, weight)?;
        self.lower_bound
            .assembler_mut()
            .add_path_length_cost(&self.graph, weight)
    }

    pub fn add_path_length_cost_matrix(&mut self, weight: DMatrix<f64>) -> Result<()> {
        self.assembler
            .add_path_length_cost_matrix(&self.graph, weight.clone())?;
        self.lower_bound
            .assembler_mut()
            .add_path_length_cost_matrix(&self.graph, weight)
    }

    pub fn add_time_cost(&mut self, weight: f64) -> Result<()> {
        self.assembler.add_time_cost(&self.graph, weight)?;
        self.lower_bound
            .assembler_mut()
            .add_time_cost(&self.graph, weight)
    }

    /// Full formulation only; the relaxation keeps position continuity.
    pub fn add_path_continuity_constraint(&mut self, derivative_order: usize) -> Result<()> {
        self.assembler
            .add_path_continuity_constraint(&self.graph, derivative_order)
    }

    /// Full formulation only; the relaxation never bounds velocity.
    pub fn add_velocity_constraint(&mut self, vel_lb: &[f64], vel_ub: &[f64]) -> Result<()> {
        self.assembler
            .add_velocity_constraint(&self.graph, vel_lb, vel_ub)
    }

    // --- start / goal --------------------------------------------------------

    /// Pin a start point; connects it to every region containing it. Replaces
    /// any previous start.
    pub fn add_start(&mut self, point: &DVector<f64>) -> Result<VertexId> {
        let id = self.add_anchor(VertexKind::Start(point.clone()), self.start)?;
        self.start = Some(id);
        Ok(id)
    }

    /// Pin a goal point; connects every region containing it to it. Replaces
    /// any previous goal.
    pub fn add_goal(&mut self, point: &DVector<f64>) -> Result<VertexId> {
        let id = self.add_anchor(VertexKind::Goal(point.clone()), self.goal)?;
        self.goal = Some(id);
        Ok(id)
    }

    fn add_anchor(&mut self, kind: VertexKind, previous: Option<VertexId>) -> Result<VertexId> {
        let point = match kind.point() {
            Some(p) => p.clone(),
            None => return Err(GcsError::MalformedGraph("anchor must be a point".into())),
        };
        if point.len() != self.graph.dim() {
            return Err(GcsError::DimensionMismatch {
                expected: self.graph.dim(),
                got: point.len(),
            });
        }
        let regions = self.graph.containing_regions(&point, self.cfg.eps_contain);
        if regions.is_empty() {
            return Err(GcsError::Uncontained(point.iter().copied().collect()));
        }
        if let Some(old) = previous {
            self.remove_anchor(old)?;
        }
        let is_start = matches!(kind, VertexKind::Start(_));
        let id = self.graph.add_ephemeral(kind)?;
        self.assembler.register_vertex(&self.graph, id)?;
        self.lower_bound
            .assembler_mut()
            .register_vertex(&self.graph, id)?;
        for &r in &regions {
            let e = if is_start {
                self.graph.connect(id, r)?
            } else {
                self.graph.connect(r, id)?
            };
            self.assembler.register_edge(&self.graph, e)?;
            self.lower_bound
                .assembler_mut()
                .register_edge(&self.graph, e)?;
        }
        info!(
            vertex = id.0,
            start = is_start,
            regions = regions.len(),
            "anchor added"
        );
        Ok(id)
    }

    fn remove_anchor(&mut self, id: VertexId) -> Result<()> {
        let edges = self.graph.remove_ephemeral(id)?;
        for e in edges {
            self.assembler.release_edge(e);
            self.lower_bound.assembler_mut().release_edge(e);
        }
        self.assembler.release_vertex(id);
        self.lower_bound.assembler_mut().release_vertex(id);
        Ok(())
    }

    /// Drop start and goal with their edges and bindings. Their ids stay unknown.
    pub fn clean_up(&mut self) -> Result<()> {
        for id in [self.start.take(), self.goal.take()].into_iter().flatten() {
            self.remove_anchor(id)?;
        }
        Ok(())
    }

    // --- solving -------------------------------------------------------------

    fn path_solver(&self) -> PathSolver<'_> {
        PathSolver::new(&self.graph, &self.assembler, &self.backend)
    }

    /// Solve `vertices` on session 0.
    pub fn solve(&self, vertices: &[VertexId]) -> Result<Solution> {
        self.solve_with(&SolveRequest::new(vertices))
    }

    pub fn solve_with(&self, req: &SolveRequest<'_>) -> Result<Solution> {
        self.path_solver().solve(req)
    }

    /// `solve` for callers holding raw integer ids.
    pub fn solve_ids(&self, ids: &[usize], thread_id: usize) -> Result<Solution> {
        let vertices: Vec<VertexId> = ids.iter().copied().map(VertexId).collect();
        self.solve_with(&SolveRequest::new(&vertices).thread_id(thread_id))
    }

    /// Admissible bound on the optimal cost of `vertices`.
    pub fn lowerbound_solve(&self, vertices: &[VertexId], thread_id: usize) -> Result<f64> {
        self.lower_bound
            .bound_path(&self.graph, &self.backend, vertices, None, thread_id)
    }

    pub fn lowerbound_solve_ids(&self, ids: &[usize], thread_id: usize) -> Result<f64> {
        let vertices: Vec<VertexId> = ids.iter().copied().map(VertexId).collect();
        self.lowerbound_solve(&vertices, thread_id)
    }

    /// Realized cost of `solution`, recomputed from its decision values.
    pub fn calculate_cost(&self, solution: &Solution) -> Result<f64> {
        self.path_solver().calculate_cost(solution)
    }

    // --- accessors -----------------------------------------------------------

    #[inline]
    pub fn graph(&self) -> &RegionGraph {
        &self.graph
    }

    #[inline]
    pub fn assembler(&self) -> &Assembler {
        &self.assembler
    }

    #[inline]
    pub fn lower_bound(&self) -> &LowerBoundEstimator {
        &self.lower_bound
    }

    #[inline]
    pub fn cfg(&self) -> &GcsCfg {
        &self.cfg
    }

    #[inline]
    pub fn backend(&self) -> &Arc<SolverBackend> {
        &self.backend
    }

    #[inline]
    pub fn start(&self) -> Option<VertexId> {
        self.start
    }

    #[inline]
    pub fn goal(&self) -> Option<VertexId> {
        self.goal
    }

    pub fn vertices(&self) -> Vec<&Vertex> {
        self.graph.vertices().collect()
    }

    pub fn edges(&self) -> Vec<&Edge> {
        self.graph.edges().collect()
    }

    pub fn vertex_map(&self) -> HashMap<VertexId, &Vertex> {
        self.graph.vertices().map(|v| (v.id, v)).collect()
    }

    pub fn edge_map(&self) -> HashMap<EdgeId, &Edge> {
        self.graph.edges().map(|e| (e.id, e)).collect()
    }
}
