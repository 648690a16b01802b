//! Cost and constraint assembly.
//!
//! Purpose
//! - Formulate every cost/constraint once per graph element and keep it in an
//!   id-indexed map, so any number of candidate paths can pick up exactly the
//!   bindings of their own vertices and edges without re-deriving them.
//!
//! Formulation (per vertex with control points x_0..x_k and duration h)
//! - Membership: `A x_i <= b` for all i (the Bézier convex-hull property keeps
//!   the whole segment inside the region); `h_min <= h <= h_max`.
//! - Start/goal: `x_0 = p`, `h = 0`.
//! - Path length: `Σ_i ‖W (x_{i+1} − x_i)‖₂`.
//! - Time: strategy object (`TimeCostModel`), linear by default.
//! - Velocity: `lb·h <= k (x_{i+1} − x_i) <= ub·h`.
//! - Continuity (per edge): `r_u^(m)(1) = r_v^(m)(0)`, m = 0 always.

mod assembler;
mod terms;
mod time_cost;

pub use assembler::{Assembler, AssemblerCfg, Block, InducedProblem};
pub use terms::{
    AffineExpr, Binding, ConstraintBinding, ConstraintTerm, CostBinding, CostTerm, Tag,
};
pub use time_cost::{AllowanceTimeCost, LinearTimeCost, TimeCostModel};

#[cfg(test)]
mod tests;
