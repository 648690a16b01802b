//! Engine and solver configuration.
//!
//! Both structs carry working defaults, deserialize from TOML (missing keys
//! fall back to the defaults) and are validated once, up front, so the solve
//! path never re-checks them.

use serde::Deserialize;

use crate::error::{GcsError, Result};

/// Formulation parameters for one `GcsOpt` instance.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GcsCfg {
    /// Bézier order of each region's segment (control points = order + 1).
    pub order: usize,
    /// Lower bound on each region's duration.
    pub h_min: f64,
    /// Upper bound on each region's duration.
    pub h_max: f64,
    pub path_length_weight: f64,
    pub time_weight: f64,
    /// Componentwise velocity bounds; `None` leaves velocity unconstrained.
    pub vel_lb: Option<Vec<f64>>,
    pub vel_ub: Option<Vec<f64>>,
    /// Highest path derivative matched across transitions (0 = positions only).
    pub continuity_order: usize,
    /// Membership slack used when attaching start/goal points to regions.
    pub eps_contain: f64,
}

impl Default for GcsCfg {
    fn default() -> Self {
        Self {
            order: 1,
            h_min: 1e-3,
            h_max: 1.0,
            path_length_weight: 1.0,
            time_weight: 0.0,
            vel_lb: None,
            vel_ub: None,
            continuity_order: 0,
            eps_contain: 1e-9,
        }
    }
}

impl GcsCfg {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| GcsError::config("toml", e.to_string()))
    }

    /// Velocity bounds as a pair, if any side is configured. A missing side is
    /// unbounded.
    pub fn velocity_bounds(&self, num_positions: usize) -> Option<(Vec<f64>, Vec<f64>)> {
        if self.vel_lb.is_none() && self.vel_ub.is_none() {
            return None;
        }
        let lb = self
            .vel_lb
            .clone()
            .unwrap_or_else(|| vec![f64::NEG_INFINITY; num_positions]);
        let ub = self
            .vel_ub
            .clone()
            .unwrap_or_else(|| vec![f64::INFINITY; num_positions]);
        Some((lb, ub))
    }

    pub fn validate(&self, num_positions: usize) -> Result<()> {
        if self.order == 0 {
            return Err(GcsError::config("order", "must be at least 1"));
        }
        if !(self.h_min.is_finite() && self.h_min >= 0.0) {
            return Err(GcsError::config("h_min", "must be finite and >= 0"));
        }
        if !(self.h_max.is_finite() && self.h_max > 0.0 && self.h_max >= self.h_min) {
            return Err(GcsError::config("h_max", "must be finite, > 0 and >= h_min"));
        }
        check_weight("path_length_weight", self.path_length_weight)?;
        check_weight("time_weight", self.time_weight)?;
        if self.continuity_order > self.order {
            return Err(GcsError::config(
                "continuity_order",
                format!("exceeds curve order {}", self.order),
            ));
        }
        if !(self.eps_contain.is_finite() && self.eps_contain >= 0.0) {
            return Err(GcsError::config("eps_contain", "must be finite and >= 0"));
        }
        if let Some((lb, ub)) = self.velocity_bounds(num_positions) {
            check_velocity_bounds(&lb, &ub, num_positions)?;
        }
        Ok(())
    }
}

pub(crate) fn check_weight(field: &'static str, w: f64) -> Result<()> {
    if w.is_finite() && w >= 0.0 {
        Ok(())
    } else {
        Err(GcsError::config(field, format!("weight must be finite and >= 0, got {w}")))
    }
}

pub(crate) fn check_velocity_bounds(lb: &[f64], ub: &[f64], num_positions: usize) -> Result<()> {
    if lb.len() != num_positions || ub.len() != num_positions {
        return Err(GcsError::config(
            "velocity",
            format!(
                "bounds must have {num_positions} entries (lb={}, ub={})",
                lb.len(),
                ub.len()
            ),
        ));
    }
    for (d, (&l, &u)) in lb.iter().zip(ub).enumerate() {
        if l.is_nan() || u.is_nan() || l > u {
            return Err(GcsError::config(
                "velocity",
                format!("invalid interval [{l}, {u}] in dimension {d}"),
            ));
        }
    }
    Ok(())
}

/// Solver backend settings and session count.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SolverCfg {
    /// Number of concurrent solver sessions (valid `thread_id`s are `0..sessions`).
    pub sessions: usize,
    pub max_iter: u32,
    /// Wall-clock limit per solve in seconds; `None` means unlimited.
    pub time_limit: Option<f64>,
    pub tol_gap_abs: f64,
    pub tol_gap_rel: f64,
    pub tol_feas: f64,
    /// Gap tolerance (absolute and relative) behind an `AlmostSolved` status.
    pub reduced_tol_gap: f64,
    /// Count reduced-accuracy convergence as success. Off by default: such a
    /// solve missed the configured tolerances.
    pub accept_almost_solved: bool,
    pub verbose: bool,
}

impl Default for SolverCfg {
    fn default() -> Self {
        Self {
            sessions: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            max_iter: 200,
            time_limit: None,
            tol_gap_abs: 1e-8,
            tol_gap_rel: 1e-8,
            tol_feas: 1e-8,
            reduced_tol_gap: 5e-5,
            accept_almost_solved: false,
            verbose: false,
        }
    }
}

impl SolverCfg {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| GcsError::config("toml", e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.sessions == 0 {
            return Err(GcsError::config("sessions", "must be at least 1"));
        }
        if self.max_iter == 0 {
            return Err(GcsError::config("max_iter", "must be at least 1"));
        }
        if let Some(t) = self.time_limit {
            if !(t > 0.0) {
                return Err(GcsError::config("time_limit", "must be > 0 when set"));
            }
        }
        for (field, tol) in [
            ("tol_gap_abs", self.tol_gap_abs),
            ("tol_gap_rel", self.tol_gap_rel),
            ("tol_feas", self.tol_feas),
            ("reduced_tol_gap", self.reduced_tol_gap),
        ] {
            if !(tol.is_finite() && tol > 0.0) {
                return Err(GcsError::config(field, "tolerance must be finite and > 0"));
            }
        }
        Ok(())
    }

    /// Largest amount a converged primal objective may sit above the true
    /// optimum under these tolerances.
    pub fn gap_allowance(&self, almost_solved: bool, objective: f64) -> f64 {
        let (abs, rel) = if almost_solved {
            (self.reduced_tol_gap, self.reduced_tol_gap)
        } else {
            (self.tol_gap_abs, self.tol_gap_rel)
        };
        abs + rel * objective.abs()
    }
}
