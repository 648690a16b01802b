//! Time-cost shapes, injected into the assembler at construction.

use super::terms::{AffineExpr, CostTerm};
use crate::vars::Var;

/// Maps a weight and a vertex's duration variable to cost terms.
///
/// Implementations must be convex, non-negative for `h >= 0` and depend on
/// the duration only; lower bounds rely on all three.
pub trait TimeCostModel: Send + Sync + std::fmt::Debug {
    fn formulate(&self, weight: f64, duration: Var) -> Vec<CostTerm>;

    fn name(&self) -> &'static str;
}

/// `weight · h`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearTimeCost;

impl TimeCostModel for LinearTimeCost {
    fn formulate(&self, weight: f64, duration: Var) -> Vec<CostTerm> {
        vec![CostTerm::Linear(AffineExpr::var(duration).scaled(weight))]
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}

/// `weight · max(h - allowance, 0)`: time within the allowance is free.
///
/// Written as `w/2 · (|h - a| + (h - a))` so it stays within linear and norm terms.
#[derive(Clone, Copy, Debug)]
pub struct AllowanceTimeCost {
    pub allowance: f64,
}

impl TimeCostModel for AllowanceTimeCost {
    fn formulate(&self, weight: f64, duration: Var) -> Vec<CostTerm> {
        let excess = AffineExpr::var(duration)
            .plus(-self.allowance)
            .scaled(0.5 * weight);
        vec![CostTerm::L2Norm(vec![excess.clone()]), CostTerm::Linear(excess)]
    }

    fn name(&self) -> &'static str {
        "allowance"
    }
}
