//! Induced problem → conic standard form.
//!
//! Target form (solver-agnostic, matches interior-point conic solvers):
//!   minimize  qᵀz + offset
//!   s.t.      A z + s = b,  s ∈ K = {0}^p × R₊^m × SOC(d_1) × … × SOC(d_r)
//! where z = (x, t): x are the induced decision columns and t one epigraph
//! slack per norm cost, `‖e(x)‖₂ <= t` written as `(t, e(x)) ∈ SOC`.
//! Slacks exist only inside one `ConicProgram`; nothing is stored on the
//! assembler.

use crate::error::{Element, GcsError, Result};
use crate::formulate::{AffineExpr, ConstraintTerm, CostTerm, InducedProblem};

/// One block of the cone product, rows taken in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cone {
    Zero(usize),
    Nonnegative(usize),
    SecondOrder(usize),
}

impl Cone {
    #[inline]
    pub fn dim(&self) -> usize {
        match *self {
            Cone::Zero(d) | Cone::Nonnegative(d) | Cone::SecondOrder(d) => d,
        }
    }
}

/// Sparse conic program; `a` is in (row, col, value) triplets.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConicProgram {
    /// Columns belonging to the induced problem (the rest are slacks).
    pub num_vars: usize,
    pub num_slacks: usize,
    pub q: Vec<f64>,
    pub offset: f64,
    pub a: Vec<(usize, usize, f64)>,
    pub b: Vec<f64>,
    pub cones: Vec<Cone>,
}

impl ConicProgram {
    #[inline]
    pub fn num_cols(&self) -> usize {
        self.num_vars + self.num_slacks
    }

    #[inline]
    pub fn num_rows(&self) -> usize {
        self.b.len()
    }

    /// `qᵀz + offset` at a full column vector (decision columns and slacks).
    pub fn objective(&self, z: &[f64]) -> f64 {
        self.q.iter().zip(z).map(|(q, z)| q * z).sum::<f64>() + self.offset
    }

    pub fn from_induced(problem: &InducedProblem<'_>) -> Result<Self> {
        let n = problem.num_vars;
        let mut prog = ConicProgram {
            num_vars: n,
            q: vec![0.0; n],
            ..Default::default()
        };

        let mut equalities: Vec<&AffineExpr> = Vec::new();
        let mut inequalities: Vec<&AffineExpr> = Vec::new();
        for binding in &problem.constraints {
            match &binding.term {
                ConstraintTerm::Equality(rows) => equalities.extend(rows),
                ConstraintTerm::Inequality(rows) => inequalities.extend(rows),
            }
        }
        let mut norms: Vec<&[AffineExpr]> = Vec::new();
        for binding in &problem.costs {
            match &binding.term {
                CostTerm::Linear(e) => {
                    for &(v, c) in &e.terms {
                        let col = column(problem, v)?;
                        prog.q[col] += c;
                    }
                    prog.offset += e.constant;
                }
                CostTerm::L2Norm(rows) => norms.push(rows),
            }
        }
        prog.num_slacks = norms.len();
        prog.q.extend(std::iter::repeat(1.0).take(norms.len()));

        // s = b - A z: for `e(x) = a·x + c` rows with `e(x) ⋄ 0`, A = a and b = -c.
        for e in &equalities {
            prog.push_row(problem, e, 1.0)?;
        }
        if !equalities.is_empty() {
            prog.cones.push(Cone::Zero(equalities.len()));
        }
        for e in &inequalities {
            prog.push_row(problem, e, 1.0)?;
        }
        if !inequalities.is_empty() {
            prog.cones.push(Cone::Nonnegative(inequalities.len()));
        }
        // Epigraph rows: s_0 = t, s_j = e_j(x), i.e. A = -a and b = c.
        for (k, rows) in norms.iter().enumerate() {
            let row = prog.b.len();
            prog.a.push((row, n + k, -1.0));
            prog.b.push(0.0);
            for e in rows.iter() {
                prog.push_row(problem, e, -1.0)?;
            }
            prog.cones.push(Cone::SecondOrder(rows.len() + 1));
        }
        debug_assert_eq!(
            prog.cones.iter().map(Cone::dim).sum::<usize>(),
            prog.num_rows()
        );
        Ok(prog)
    }

    fn push_row(&mut self, problem: &InducedProblem<'_>, e: &AffineExpr, sign: f64) -> Result<()> {
        let row = self.b.len();
        for &(v, c) in &e.terms {
            let col = column(problem, v)?;
            self.a.push((row, col, sign * c));
        }
        self.b.push(-sign * e.constant);
        Ok(())
    }
}

fn column(problem: &InducedProblem<'_>, v: crate::vars::Var) -> Result<usize> {
    problem
        .column(v)
        .ok_or(GcsError::UnknownElement(Element::Vertex(v.vertex)))
}
