//! Symbolic cost and constraint terms over `Var`s.
//!
//! Terms are plain data: an affine map plus a cone-friendly shape. They are
//! built once per graph element and evaluated or rewritten many times.

use crate::vars::Var;

/// `Σ coef·var + constant`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AffineExpr {
    pub terms: Vec<(Var, f64)>,
    pub constant: f64,
}

impl AffineExpr {
    pub fn constant(c: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: c,
        }
    }

    pub fn var(v: Var) -> Self {
        Self {
            terms: vec![(v, 1.0)],
            constant: 0.0,
        }
    }

    /// Append `coef·v`; zero coefficients are dropped.
    pub fn term(mut self, v: Var, coef: f64) -> Self {
        if coef != 0.0 {
            self.terms.push((v, coef));
        }
        self
    }

    pub fn plus(mut self, c: f64) -> Self {
        self.constant += c;
        self
    }

    pub fn scaled(mut self, s: f64) -> Self {
        for (_, c) in self.terms.iter_mut() {
            *c *= s;
        }
        self.constant *= s;
        self
    }

    pub fn eval(&self, value: &impl Fn(Var) -> f64) -> f64 {
        self.terms
            .iter()
            .fold(self.constant, |acc, (v, c)| acc + c * value(*v))
    }

    pub fn vars(&self) -> impl Iterator<Item = Var> + '_ {
        self.terms.iter().map(|(v, _)| *v)
    }
}

/// Convex cost shapes the rewriter understands.
#[derive(Clone, Debug, PartialEq)]
pub enum CostTerm {
    /// Affine cost (the constant is carried into the objective offset).
    Linear(AffineExpr),
    /// Euclidean norm of a vector of affine rows; weights are folded into the rows.
    L2Norm(Vec<AffineExpr>),
}

impl CostTerm {
    pub fn eval(&self, value: &impl Fn(Var) -> f64) -> f64 {
        match self {
            CostTerm::Linear(e) => e.eval(value),
            CostTerm::L2Norm(rows) => rows
                .iter()
                .map(|r| r.eval(value).powi(2))
                .sum::<f64>()
                .sqrt(),
        }
    }

    fn rows(&self) -> &[AffineExpr] {
        match self {
            CostTerm::Linear(e) => std::slice::from_ref(e),
            CostTerm::L2Norm(rows) => rows,
        }
    }
}

/// Affine constraints, one scalar condition per row.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstraintTerm {
    /// Every row `== 0`.
    Equality(Vec<AffineExpr>),
    /// Every row `<= 0`.
    Inequality(Vec<AffineExpr>),
}

impl ConstraintTerm {
    pub fn rows(&self) -> &[AffineExpr] {
        match self {
            ConstraintTerm::Equality(r) | ConstraintTerm::Inequality(r) => r,
        }
    }

    /// Largest violation over all rows (0 when satisfied).
    pub fn violation(&self, value: &impl Fn(Var) -> f64) -> f64 {
        match self {
            ConstraintTerm::Equality(rows) => rows
                .iter()
                .fold(0.0_f64, |acc, r| acc.max(r.eval(value).abs())),
            ConstraintTerm::Inequality(rows) => rows
                .iter()
                .fold(0.0_f64, |acc, r| acc.max(r.eval(value))),
        }
    }
}

/// What a binding was formulated for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Control points inside the vertex's region.
    Membership,
    /// Start/goal control point pinned to its point.
    PointEquality,
    /// Duration bounds (or the degenerate duration of start/goal).
    Duration,
    PathLength,
    Time,
    Continuity,
    Velocity,
}

/// A term plus the variables it touches (the mask), tagged by origin.
#[derive(Clone, Debug, PartialEq)]
pub struct Binding<T> {
    pub tag: Tag,
    pub term: T,
    pub mask: Vec<Var>,
}

pub type CostBinding = Binding<CostTerm>;
pub type ConstraintBinding = Binding<ConstraintTerm>;

impl Binding<CostTerm> {
    pub fn new(tag: Tag, term: CostTerm) -> Self {
        let mask = mask_of(term.rows());
        Self { tag, term, mask }
    }
}

impl Binding<ConstraintTerm> {
    pub fn new(tag: Tag, term: ConstraintTerm) -> Self {
        let mask = mask_of(term.rows());
        Self { tag, term, mask }
    }
}

fn mask_of(rows: &[AffineExpr]) -> Vec<Var> {
    let mut mask: Vec<Var> = rows.iter().flat_map(AffineExpr::vars).collect();
    mask.sort_unstable();
    mask.dedup();
    mask
}
