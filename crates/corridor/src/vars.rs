//! Decision-variable layout per vertex.
//!
//! Each vertex owns a Bézier segment `r(s), s ∈ [0,1]` with `order + 1`
//! control points in R^n and a duration `h`. A variable is identified by
//! `(vertex, slot)`; slots are laid out control-point-major:
//! `slot(k, d) = k * n + d`, duration last. Edges own no variables.
//!
//! The layout is a pure function of (vertex kind, order, n), so the same graph
//! and configuration always yield the same variables.

use std::collections::HashMap;

use crate::graph::{Vertex, VertexId};

/// One scalar decision variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var {
    pub vertex: VertexId,
    pub slot: usize,
}

/// Shape of one vertex's variable block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VarLayout {
    pub order: usize,
    pub num_positions: usize,
}

impl VarLayout {
    #[inline]
    pub fn num_control_points(&self) -> usize {
        self.order + 1
    }

    #[inline]
    pub fn control_slot(&self, k: usize, d: usize) -> usize {
        debug_assert!(k <= self.order && d < self.num_positions);
        k * self.num_positions + d
    }

    #[inline]
    pub fn duration_slot(&self) -> usize {
        self.num_control_points() * self.num_positions
    }

    /// Total number of scalar variables in the block.
    #[inline]
    pub fn size(&self) -> usize {
        self.duration_slot() + 1
    }
}

/// Variables of one vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexVars {
    pub vertex: VertexId,
    pub layout: VarLayout,
}

impl VertexVars {
    #[inline]
    pub fn order(&self) -> usize {
        self.layout.order
    }

    #[inline]
    pub fn control(&self, k: usize, d: usize) -> Var {
        Var {
            vertex: self.vertex,
            slot: self.layout.control_slot(k, d),
        }
    }

    /// All coordinates of control point `k`.
    pub fn control_point(&self, k: usize) -> Vec<Var> {
        (0..self.layout.num_positions)
            .map(|d| self.control(k, d))
            .collect()
    }

    /// First control point (segment start).
    pub fn initial(&self) -> Vec<Var> {
        self.control_point(0)
    }

    /// Last control point (segment end).
    pub fn terminal(&self) -> Vec<Var> {
        self.control_point(self.layout.order)
    }

    #[inline]
    pub fn duration(&self) -> Var {
        Var {
            vertex: self.vertex,
            slot: self.layout.duration_slot(),
        }
    }
}

/// Assigns layouts to vertices. Region vertices use the configured order,
/// start/goal vertices a single control point.
#[derive(Clone, Debug)]
pub struct VariableAllocator {
    order: usize,
    num_positions: usize,
    by_vertex: HashMap<VertexId, VertexVars>,
}

impl VariableAllocator {
    pub fn new(order: usize, num_positions: usize) -> Self {
        Self {
            order,
            num_positions,
            by_vertex: HashMap::new(),
        }
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    #[inline]
    pub fn num_positions(&self) -> usize {
        self.num_positions
    }

    /// Allocate (or return the existing) block for `v`.
    pub fn allocate(&mut self, v: &Vertex) -> VertexVars {
        let order = if v.kind.is_ephemeral() { 0 } else { self.order };
        let layout = VarLayout {
            order,
            num_positions: self.num_positions,
        };
        *self.by_vertex.entry(v.id).or_insert(VertexVars {
            vertex: v.id,
            layout,
        })
    }

    pub fn get(&self, id: VertexId) -> Option<&VertexVars> {
        self.by_vertex.get(&id)
    }

    pub(crate) fn release(&mut self, id: VertexId) {
        self.by_vertex.remove(&id);
    }
}
