//! Trajectory optimization through graphs of convex regions ("safe corridors").
//!
//! Vertices are convex polytopes, edges are admissible region-to-region
//! transitions. For one ordered path through the graph the engine assembles a
//! second-order cone program over Bézier control points and per-region
//! durations, solves it, and returns a time-parameterized composite
//! trajectory. A relaxed formulation over the same graph yields admissible
//! lower bounds that a discrete search can use to rank and prune prefixes.
//!
//! Layout
//! - `graph`: arena of regions, vertices and edges addressed by integer ids.
//! - `vars`: deterministic decision-variable layout per vertex.
//! - `formulate`: per-element cost/constraint bindings, built once.
//! - `rewrite`: induced sub-problem → conic standard form.
//! - `backend`: scoped solver sessions (Clarabel).
//! - `solve`: path solves, cost recomputation and lower bounds.
//! - `opt`: the `GcsOpt` façade tying the above together.
//! - `random`: seeded box-corridor generator for tests and benches.
//!
//! API Policy
//! - Prefer `api` re-exports in callers; module internals may move.

pub mod api;
pub mod backend;
pub mod cfg;
pub mod error;
pub mod formulate;
pub mod graph;
pub mod opt;
pub mod random;
pub mod region;
pub mod rewrite;
pub mod solve;
pub mod trajectory;
pub mod vars;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{GcsError, Result};
pub use opt::GcsOpt;

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::backend::SolverBackend;
    pub use crate::cfg::{GcsCfg, SolverCfg};
    pub use crate::error::{GcsError, Result};
    pub use crate::graph::{EdgeId, VertexId};
    pub use crate::opt::GcsOpt;
    pub use crate::region::HPolytope;
    pub use crate::solve::{Solution, SolveRequest, SolveResult};
    pub use crate::trajectory::CompositeTrajectory;
    pub use nalgebra::{DMatrix, DVector};
}
