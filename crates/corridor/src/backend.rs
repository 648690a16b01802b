//! Scoped conic solver backend (Clarabel) with one session per `thread_id`.
//!
//! The backend is acquired once, shared behind an `Arc`, and released
//! explicitly or on drop. Each session is a mutex-guarded slot: calls with
//! distinct thread ids never contend, calls reusing an id are serialized.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettings, DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::cfg::SolverCfg;
use crate::error::{GcsError, Result};
use crate::rewrite::{Cone, ConicProgram};

/// Terminal state of one conic solve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveStatus {
    Solved,
    /// Converged to reduced tolerances.
    AlmostSolved,
    Infeasible,
    Unbounded,
    IterationLimit,
    TimeLimit,
    NumericalError,
}

impl SolveStatus {
    fn from_clarabel(s: SolverStatus) -> Self {
        match s {
            SolverStatus::Solved => SolveStatus::Solved,
            SolverStatus::AlmostSolved => SolveStatus::AlmostSolved,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                SolveStatus::Infeasible
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                SolveStatus::Unbounded
            }
            SolverStatus::MaxIterations => SolveStatus::IterationLimit,
            SolverStatus::MaxTime => SolveStatus::TimeLimit,
            _ => SolveStatus::NumericalError,
        }
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SolveStatus::Solved => "solved",
            SolveStatus::AlmostSolved => "almost_solved",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::IterationLimit => "iteration_limit",
            SolveStatus::TimeLimit => "time_limit",
            SolveStatus::NumericalError => "numerical_error",
        };
        f.write_str(s)
    }
}

/// Raw solver output; `x` covers all columns, slacks included.
#[derive(Clone, Debug, PartialEq)]
pub struct ConicSolution {
    pub status: SolveStatus,
    pub success: bool,
    pub x: Vec<f64>,
    /// Objective including the program's constant offset.
    pub objective: f64,
    pub iterations: u32,
    pub solve_time: f64,
}

#[derive(Debug, Default)]
struct SessionState {
    solves: u64,
}

/// Shared solver environment.
#[derive(Debug)]
pub struct SolverBackend {
    cfg: SolverCfg,
    sessions: Vec<Mutex<SessionState>>,
    released: AtomicBool,
    total_solves: AtomicU64,
}

/// Exclusive use of one session slot for the duration of a solve.
pub struct Session<'a> {
    backend: &'a SolverBackend,
    thread_id: usize,
    state: MutexGuard<'a, SessionState>,
}

impl SolverBackend {
    /// Validate `cfg` and set up `cfg.sessions` session slots.
    pub fn acquire(cfg: SolverCfg) -> Result<Arc<Self>> {
        cfg.validate()?;
        let sessions = (0..cfg.sessions)
            .map(|_| Mutex::new(SessionState::default()))
            .collect();
        info!(sessions = cfg.sessions, "solver backend acquired");
        Ok(Arc::new(Self {
            cfg,
            sessions,
            released: AtomicBool::new(false),
            total_solves: AtomicU64::new(0),
        }))
    }

    #[inline]
    pub fn cfg(&self) -> &SolverCfg {
        &self.cfg
    }

    #[inline]
    pub fn num_sessions(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Solves completed through any session so far.
    pub fn total_solves(&self) -> u64 {
        self.total_solves.load(Ordering::Relaxed)
    }

    /// Lock the session for `thread_id`, blocking while another call holds it.
    pub fn session(&self, thread_id: usize) -> Result<Session<'_>> {
        if self.is_released() {
            return Err(GcsError::BackendUnavailable("backend was released".into()));
        }
        let slot = self.sessions.get(thread_id).ok_or_else(|| {
            GcsError::BackendUnavailable(format!(
                "thread_id {thread_id} out of range (sessions = {})",
                self.sessions.len()
            ))
        })?;
        Ok(Session {
            backend: self,
            thread_id,
            state: slot.lock(),
        })
    }

    /// Refuse new sessions from now on. Idempotent.
    pub fn release(&self) {
        if !self.released.swap(true, Ordering::AcqRel) {
            info!(solves = self.total_solves(), "solver backend released");
        }
    }

    fn settings(&self) -> Result<DefaultSettings<f64>> {
        let mut b = DefaultSettingsBuilder::default();
        b.verbose(self.cfg.verbose)
            .max_iter(self.cfg.max_iter)
            .tol_gap_abs(self.cfg.tol_gap_abs)
            .tol_gap_rel(self.cfg.tol_gap_rel)
            .tol_feas(self.cfg.tol_feas)
            .reduced_tol_gap_abs(self.cfg.reduced_tol_gap)
            .reduced_tol_gap_rel(self.cfg.reduced_tol_gap);
        if let Some(t) = self.cfg.time_limit {
            b.time_limit(t);
        }
        b.build()
            .map_err(|e| GcsError::BackendUnavailable(format!("solver settings: {e}")))
    }
}

impl Drop for SolverBackend {
    fn drop(&mut self) {
        self.release();
    }
}

impl Session<'_> {
    #[inline]
    pub fn thread_id(&self) -> usize {
        self.thread_id
    }

    /// Solves run on this session so far.
    pub fn solves(&self) -> u64 {
        self.state.solves
    }

    pub fn solve(&mut self, prog: &ConicProgram) -> Result<ConicSolution> {
        let n = prog.num_cols();
        let m = prog.num_rows();
        let settings = self.backend.settings()?;
        let p = CscMatrix::new(n, n, vec![0; n + 1], Vec::new(), Vec::new());
        let a = csc_from_triplets(m, n, &prog.a);
        let cones: Vec<SupportedConeT<f64>> = prog.cones.iter().map(to_clarabel).collect();

        let mut solver = DefaultSolver::new(&p, &prog.q, &a, &prog.b, &cones, settings);
        solver.solve();
        let sol = &solver.solution;
        let status = SolveStatus::from_clarabel(sol.status);
        let success = match status {
            SolveStatus::Solved => true,
            SolveStatus::AlmostSolved if self.backend.cfg.accept_almost_solved => {
                warn!(thread_id = self.thread_id, "accepting reduced-accuracy solution");
                true
            }
            _ => false,
        };

        self.state.solves += 1;
        self.backend.total_solves.fetch_add(1, Ordering::Relaxed);
        debug!(
            thread_id = self.thread_id,
            rows = m,
            cols = n,
            cones = cones.len(),
            %status,
            iterations = sol.iterations,
            "conic solve"
        );
        Ok(ConicSolution {
            status,
            success,
            x: sol.x.clone(),
            objective: sol.obj_val + prog.offset,
            iterations: sol.iterations,
            solve_time: sol.solve_time,
        })
    }
}

fn to_clarabel(c: &Cone) -> SupportedConeT<f64> {
    match *c {
        Cone::Zero(d) => SupportedConeT::ZeroConeT(d),
        Cone::Nonnegative(d) => SupportedConeT::NonnegativeConeT(d),
        Cone::SecondOrder(d) => SupportedConeT::SecondOrderConeT(d),
    }
}

/// Column-compressed matrix from (row, col, value) triplets; duplicates add up.
fn csc_from_triplets(m: usize, n: usize, triplets: &[(usize, usize, f64)]) -> CscMatrix<f64> {
    let mut sorted: Vec<(usize, usize, f64)> = triplets.to_vec();
    sorted.sort_by(|a, b| (a.1, a.0).cmp(&(b.1, b.0)));
    let mut colptr = vec![0usize; n + 1];
    let mut rowval = Vec::with_capacity(sorted.len());
    let mut nzval: Vec<f64> = Vec::with_capacity(sorted.len());
    let mut last: Option<(usize, usize)> = None;
    for (r, c, v) in sorted {
        if last == Some((r, c)) {
            if let Some(x) = nzval.last_mut() {
                *x += v;
            }
            continue;
        }
        rowval.push(r);
        nzval.push(v);
        colptr[c + 1] += 1;
        last = Some((r, c));
    }
    for j in 0..n {
        colptr[j + 1] += colptr[j];
    }
    CscMatrix::new(m, n, colptr, rowval, nzval)
}
