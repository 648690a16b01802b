//! Per-element cost/constraint bindings, formulated once and looked up per solve.

use std::collections::HashMap;
use std::sync::Arc;

use nalgebra::DMatrix;
use tracing::debug;

use super::terms::{
    AffineExpr, ConstraintBinding, ConstraintTerm, CostBinding, CostTerm, Tag,
};
use super::time_cost::TimeCostModel;
use crate::cfg::{check_velocity_bounds, check_weight};
use crate::error::{Element, GcsError, Result};
use crate::graph::{EdgeId, RegionGraph, ResolvedPath, Vertex, VertexId, VertexKind};
use crate::vars::{Var, VariableAllocator, VertexVars};

/// Shape parameters of one formulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AssemblerCfg {
    pub order: usize,
    pub num_positions: usize,
    pub h_min: f64,
    pub h_max: f64,
}

/// A registered `add_*` call, replayed on elements created later.
#[derive(Clone, Debug, PartialEq)]
enum Formulation {
    PathLength(DMatrix<f64>),
    Time(f64),
    Continuity(usize),
    Velocity { lb: Vec<f64>, ub: Vec<f64> },
}

impl Formulation {
    fn name(&self) -> &'static str {
        match self {
            Formulation::PathLength(_) => "path_length",
            Formulation::Time(_) => "time",
            Formulation::Continuity(_) => "continuity",
            Formulation::Velocity { .. } => "velocity",
        }
    }
}

/// Owns the variable layout and the id-indexed binding maps.
///
/// Bindings are only ever appended (by `add_*` or when an element is
/// registered) or dropped with their element; solving reads them.
#[derive(Clone, Debug)]
pub struct Assembler {
    cfg: AssemblerCfg,
    vars: VariableAllocator,
    time_model: Arc<dyn TimeCostModel>,
    formulations: Vec<Formulation>,
    vertex_costs: HashMap<VertexId, Vec<CostBinding>>,
    vertex_constraints: HashMap<VertexId, Vec<ConstraintBinding>>,
    edge_costs: HashMap<EdgeId, Vec<CostBinding>>,
    edge_constraints: HashMap<EdgeId, Vec<ConstraintBinding>>,
}

/// Column block of one path vertex in an induced problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    pub vars: VertexVars,
    pub offset: usize,
}

/// Bindings of exactly the elements on one path, with a column per variable.
///
/// Columns follow path order, then the vertex's slot order.
#[derive(Debug)]
pub struct InducedProblem<'a> {
    pub blocks: Vec<Block>,
    pub num_vars: usize,
    pub costs: Vec<&'a CostBinding>,
    pub constraints: Vec<&'a ConstraintBinding>,
    offsets: HashMap<VertexId, usize>,
}

impl InducedProblem<'_> {
    #[inline]
    pub fn column(&self, v: Var) -> Option<usize> {
        self.offsets.get(&v.vertex).map(|o| o + v.slot)
    }

    /// Objective value at a full column assignment `x`.
    pub fn cost_at(&self, x: &[f64]) -> f64 {
        let value = |v: Var| self.column(v).map_or(0.0, |c| x[c]);
        self.costs.iter().map(|b| b.term.eval(&value)).sum()
    }

    /// Worst constraint violation at `x`.
    pub fn violation_at(&self, x: &[f64]) -> f64 {
        let value = |v: Var| self.column(v).map_or(0.0, |c| x[c]);
        self.constraints
            .iter()
            .fold(0.0_f64, |acc, b| acc.max(b.term.violation(&value)))
    }
}

impl Assembler {
    /// Allocate variables and set constraints for every live vertex, and empty
    /// binding lists for every edge. Costs and transition constraints come from `add_*`.
    pub fn new(
        graph: &RegionGraph,
        cfg: AssemblerCfg,
        time_model: Arc<dyn TimeCostModel>,
    ) -> Result<Self> {
        if cfg.num_positions != graph.dim() {
            return Err(GcsError::DimensionMismatch {
                expected: graph.dim(),
                got: cfg.num_positions,
            });
        }
        let mut asm = Self {
            cfg,
            vars: VariableAllocator::new(cfg.order, cfg.num_positions),
            time_model,
            formulations: Vec::new(),
            vertex_costs: HashMap::new(),
            vertex_constraints: HashMap::new(),
            edge_costs: HashMap::new(),
            edge_constraints: HashMap::new(),
        };
        let vids: Vec<VertexId> = graph.vertices().map(|v| v.id).collect();
        for id in vids {
            asm.register_vertex(graph, id)?;
        }
        let eids: Vec<EdgeId> = graph.edges().map(|e| e.id).collect();
        for id in eids {
            asm.register_edge(graph, id)?;
        }
        Ok(asm)
    }

    #[inline]
    pub fn cfg(&self) -> &AssemblerCfg {
        &self.cfg
    }

    #[inline]
    pub fn vars(&self) -> &VariableAllocator {
        &self.vars
    }

    #[inline]
    pub fn time_model(&self) -> &dyn TimeCostModel {
        self.time_model.as_ref()
    }

    pub fn vertex_costs(&self, id: VertexId) -> &[CostBinding] {
        self.vertex_costs.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn vertex_constraints(&self, id: VertexId) -> &[ConstraintBinding] {
        self.vertex_constraints.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edge_costs(&self, id: EdgeId) -> &[CostBinding] {
        self.edge_costs.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edge_constraints(&self, id: EdgeId) -> &[ConstraintBinding] {
        self.edge_constraints.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `weight · Σ_k ‖x_{k+1} − x_k‖₂` on every vertex.
    pub fn add_path_length_cost(&mut self, graph: &RegionGraph, weight: f64) -> Result<()> {
        check_weight("path_length_weight", weight)?;
        let w = DMatrix::identity(self.cfg.num_positions, self.cfg.num_positions) * weight;
        self.add_path_length_cost_matrix(graph, w)
    }

    /// `Σ_k ‖W (x_{k+1} − x_k)‖₂` on every vertex; `W` has `num_positions` columns.
    pub fn add_path_length_cost_matrix(
        &mut self,
        graph: &RegionGraph,
        weight: DMatrix<f64>,
    ) -> Result<()> {
        if weight.ncols() != self.cfg.num_positions {
            return Err(GcsError::DimensionMismatch {
                expected: self.cfg.num_positions,
                got: weight.ncols(),
            });
        }
        if weight.nrows() == 0 || weight.iter().any(|w| !w.is_finite()) {
            return Err(GcsError::config(
                "path_length_weight",
                "weight matrix must be non-empty and finite",
            ));
        }
        self.push_formulation(graph, Formulation::PathLength(weight))
    }

    /// Duration cost through the injected `TimeCostModel`.
    pub fn add_time_cost(&mut self, graph: &RegionGraph, weight: f64) -> Result<()> {
        check_weight("time_weight", weight)?;
        self.push_formulation(graph, Formulation::Time(weight))
    }

    /// Position continuity on every edge, plus path-derivative continuity up
    /// to `derivative_order` where both endpoints have the order for it.
    pub fn add_path_continuity_constraint(
        &mut self,
        graph: &RegionGraph,
        derivative_order: usize,
    ) -> Result<()> {
        if derivative_order > self.cfg.order {
            return Err(GcsError::config(
                "continuity_order",
                format!("exceeds curve order {}", self.cfg.order),
            ));
        }
        self.push_formulation(graph, Formulation::Continuity(derivative_order))
    }

    /// `vel_lb·h <= order·(x_{k+1} − x_k) <= vel_ub·h` componentwise on every vertex.
    pub fn add_velocity_constraint(
        &mut self,
        graph: &RegionGraph,
        vel_lb: &[f64],
        vel_ub: &[f64],
    ) -> Result<()> {
        check_velocity_bounds(vel_lb, vel_ub, self.cfg.num_positions)?;
        self.push_formulation(
            graph,
            Formulation::Velocity {
                lb: vel_lb.to_vec(),
                ub: vel_ub.to_vec(),
            },
        )
    }

    fn push_formulation(&mut self, graph: &RegionGraph, f: Formulation) -> Result<()> {
        let mut added = 0usize;
        for v in graph.vertices() {
            let vv = *self
                .vars
                .get(v.id)
                .ok_or(GcsError::UnknownElement(Element::Vertex(v.id)))?;
            let (costs, constraints) = self.vertex_terms(&f, v, &vv);
            added += costs.len() + constraints.len();
            self.vertex_costs.entry(v.id).or_default().extend(costs);
            self.vertex_constraints
                .entry(v.id)
                .or_default()
                .extend(constraints);
        }
        for e in graph.edges() {
            let constraints = self.edge_terms(&f, e.from, e.to)?;
            added += constraints.len();
            self.edge_constraints.entry(e.id).or_default().extend(constraints);
        }
        debug!(formulation = f.name(), bindings = added, "formulated");
        self.formulations.push(f);
        Ok(())
    }

    /// Allocate and formulate a vertex, replaying every registered `add_*`.
    pub(crate) fn register_vertex(&mut self, graph: &RegionGraph, id: VertexId) -> Result<()> {
        let v = graph.vertex(id)?;
        let vv = self.vars.allocate(v);
        let mut costs = Vec::new();
        let mut constraints = self.set_constraints(graph, v, &vv);
        for f in &self.formulations {
            let (c, k) = self.vertex_terms(f, v, &vv);
            costs.extend(c);
            constraints.extend(k);
        }
        self.vertex_costs.insert(id, costs);
        self.vertex_constraints.insert(id, constraints);
        Ok(())
    }

    /// Formulate an edge whose endpoints are already registered.
    pub(crate) fn register_edge(&mut self, graph: &RegionGraph, id: EdgeId) -> Result<()> {
        let e = *graph.edge(id)?;
        let mut constraints = Vec::new();
        for f in &self.formulations {
            constraints.extend(self.edge_terms(f, e.from, e.to)?);
        }
        self.edge_costs.insert(id, Vec::new());
        self.edge_constraints.insert(id, constraints);
        Ok(())
    }

    pub(crate) fn release_vertex(&mut self, id: VertexId) {
        self.vertex_costs.remove(&id);
        self.vertex_constraints.remove(&id);
        self.vars.release(id);
    }

    pub(crate) fn release_edge(&mut self, id: EdgeId) {
        self.edge_costs.remove(&id);
        self.edge_constraints.remove(&id);
    }

    /// Gather the bindings of the path's vertices and edges, nothing else.
    pub fn induce(&self, path: &ResolvedPath) -> Result<InducedProblem<'_>> {
        let mut blocks = Vec::with_capacity(path.vertices.len());
        let mut offsets = HashMap::with_capacity(path.vertices.len());
        let mut num_vars = 0;
        let mut costs = Vec::new();
        let mut constraints = Vec::new();
        for &v in &path.vertices {
            let vv = *self
                .vars
                .get(v)
                .ok_or(GcsError::UnknownElement(Element::Vertex(v)))?;
            blocks.push(Block {
                vars: vv,
                offset: num_vars,
            });
            offsets.insert(v, num_vars);
            num_vars += vv.layout.size();
            costs.extend(self.vertex_costs(v));
            constraints.extend(self.vertex_constraints(v));
        }
        for &e in &path.edges {
            let k = self
                .edge_constraints
                .get(&e)
                .ok_or(GcsError::UnknownElement(Element::Edge(e)))?;
            constraints.extend(k);
            costs.extend(self.edge_costs(e));
        }
        let problem = InducedProblem {
            blocks,
            num_vars,
            costs,
            constraints,
            offsets,
        };
        debug_assert!(
            problem
                .costs
                .iter()
                .flat_map(|b| b.mask.iter())
                .chain(problem.constraints.iter().flat_map(|b| b.mask.iter()))
                .all(|v| problem.column(*v).is_some()),
            "binding mask reaches outside the path"
        );
        Ok(problem)
    }

    fn set_constraints(
        &self,
        graph: &RegionGraph,
        v: &Vertex,
        vv: &VertexVars,
    ) -> Vec<ConstraintBinding> {
        let n = self.cfg.num_positions;
        let h = vv.duration();
        match &v.kind {
            VertexKind::Region(r) => {
                let poly = &graph.regions()[*r];
                let mut rows = Vec::with_capacity(poly.num_halfspaces() * (vv.order() + 1));
                for k in 0..=vv.order() {
                    for i in 0..poly.num_halfspaces() {
                        let row = (0..n).fold(AffineExpr::constant(-poly.b()[i]), |e, d| {
                            e.term(vv.control(k, d), poly.a()[(i, d)])
                        });
                        rows.push(row);
                    }
                }
                let bounds = vec![
                    AffineExpr::var(h).scaled(-1.0).plus(self.cfg.h_min),
                    AffineExpr::var(h).plus(-self.cfg.h_max),
                ];
                vec![
                    ConstraintBinding::new(Tag::Membership, ConstraintTerm::Inequality(rows)),
                    ConstraintBinding::new(Tag::Duration, ConstraintTerm::Inequality(bounds)),
                ]
            }
            VertexKind::Start(p) | VertexKind::Goal(p) => {
                let rows = (0..n)
                    .map(|d| AffineExpr::var(vv.control(0, d)).plus(-p[d]))
                    .collect();
                vec![
                    ConstraintBinding::new(Tag::PointEquality, ConstraintTerm::Equality(rows)),
                    ConstraintBinding::new(
                        Tag::Duration,
                        ConstraintTerm::Equality(vec![AffineExpr::var(h)]),
                    ),
                ]
            }
        }
    }

    fn vertex_terms(
        &self,
        f: &Formulation,
        v: &Vertex,
        vv: &VertexVars,
    ) -> (Vec<CostBinding>, Vec<ConstraintBinding>) {
        match f {
            Formulation::PathLength(w) => (path_length_terms(vv, w), Vec::new()),
            Formulation::Time(weight) if !v.kind.is_ephemeral() => {
                let costs = self
                    .time_model
                    .formulate(*weight, vv.duration())
                    .into_iter()
                    .map(|t| CostBinding::new(Tag::Time, t))
                    .collect();
                (costs, Vec::new())
            }
            Formulation::Velocity { lb, ub } => (Vec::new(), velocity_terms(vv, lb, ub)),
            Formulation::Time(_) | Formulation::Continuity(_) => (Vec::new(), Vec::new()),
        }
    }

    fn edge_terms(
        &self,
        f: &Formulation,
        from: VertexId,
        to: VertexId,
    ) -> Result<Vec<ConstraintBinding>> {
        let Formulation::Continuity(order) = f else {
            return Ok(Vec::new());
        };
        let u = self
            .vars
            .get(from)
            .ok_or(GcsError::UnknownElement(Element::Vertex(from)))?;
        let v = self
            .vars
            .get(to)
            .ok_or(GcsError::UnknownElement(Element::Vertex(to)))?;
        Ok(vec![continuity_terms(u, v, *order)])
    }
}

fn path_length_terms(vv: &VertexVars, w: &DMatrix<f64>) -> Vec<CostBinding> {
    (0..vv.order())
        .map(|k| {
            let rows = w
                .row_iter()
                .map(|wr| {
                    wr.iter().enumerate().fold(AffineExpr::default(), |e, (d, c)| {
                        e.term(vv.control(k + 1, d), *c).term(vv.control(k, d), -*c)
                    })
                })
                .collect();
            CostBinding::new(Tag::PathLength, CostTerm::L2Norm(rows))
        })
        .collect()
}

fn velocity_terms(vv: &VertexVars, lb: &[f64], ub: &[f64]) -> Vec<ConstraintBinding> {
    let k = vv.order();
    let h = vv.duration();
    let scale = k as f64;
    let mut rows = Vec::new();
    for i in 0..k {
        for d in 0..vv.layout.num_positions {
            let diff = AffineExpr::default()
                .term(vv.control(i + 1, d), scale)
                .term(vv.control(i, d), -scale);
            if ub[d].is_finite() {
                rows.push(diff.clone().term(h, -ub[d]));
            }
            if lb[d].is_finite() {
                rows.push(diff.scaled(-1.0).term(h, lb[d]));
            }
        }
    }
    if rows.is_empty() {
        return Vec::new();
    }
    vec![ConstraintBinding::new(
        Tag::Velocity,
        ConstraintTerm::Inequality(rows),
    )]
}

/// `r_u^(m)(1) == r_v^(m)(0)` for `m = 0..=max_order`, stopping at the first
/// order one endpoint cannot express.
fn continuity_terms(u: &VertexVars, v: &VertexVars, max_order: usize) -> ConstraintBinding {
    let mut rows = Vec::new();
    for m in 0..=max_order {
        if m > u.order() || m > v.order() {
            break;
        }
        let cu = falling_factorial(u.order(), m);
        let cv = falling_factorial(v.order(), m);
        for d in 0..u.layout.num_positions {
            let mut e = AffineExpr::default();
            for j in 0..=m {
                let sign = if (m - j) % 2 == 0 { 1.0 } else { -1.0 };
                let c = sign * binomial(m, j);
                e = e
                    .term(u.control(u.order() - m + j, d), cu * c)
                    .term(v.control(j, d), -cv * c);
            }
            rows.push(e);
        }
    }
    ConstraintBinding::new(Tag::Continuity, ConstraintTerm::Equality(rows))
}

fn falling_factorial(k: usize, m: usize) -> f64 {
    (0..m).map(|i| (k - i) as f64).product()
}

fn binomial(m: usize, j: usize) -> f64 {
    (0..j).fold(1.0, |acc, i| acc * (m - i) as f64 / (i + 1) as f64)
}
