//! Curated API for planners built on the engine (UNSTABLE).
//!
//! Important
//! - Module internals may move; these re-exports are the surface callers
//!   should use. Breaking changes are still allowed.

// Engine façade and configuration
pub use crate::cfg::{GcsCfg, SolverCfg};
pub use crate::opt::GcsOpt;
// Graph
pub use crate::graph::{Edge, EdgeId, RegionGraph, ResolvedPath, Vertex, VertexId, VertexKind};
pub use crate::region::HPolytope;
// Formulation
pub use crate::formulate::{
    AllowanceTimeCost, Assembler, AssemblerCfg, LinearTimeCost, TimeCostModel,
};
// Solving
pub use crate::backend::{SolveStatus, SolverBackend};
pub use crate::solve::{LowerBoundEstimator, PathSolver, Solution, SolveRequest, SolveResult};
pub use crate::trajectory::{BezierSegment, CompositeTrajectory};
// Random corridors
pub use crate::random::{
    draw_corridor, Corridor, CorridorCfg, ReplayToken as CorridorReplay,
};
// Errors
pub use crate::error::{Element, GcsError, Result};
