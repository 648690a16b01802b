//! Region graph: an arena of regions, vertices and edges addressed by id.
//!
//! Purpose
//! - Hold the fixed set of convex regions and the admissible transitions
//!   between them, and resolve ids in O(log n).
//!
//! Invariants
//! - Ids come from monotone counters and are assigned once; a removed id
//!   resolves to `UnknownElement` and is never reused.
//! - Storage holds live elements only, so repeated start/goal churn does not
//!   grow the graph.
//! - Edges exist only where the input adjacency (or an explicit `connect`)
//!   put them; nothing is inferred from geometric overlap.
//! - Regions are immutable after `build`.

mod build;
mod path;
mod types;

use std::collections::{BTreeMap, HashMap};

pub use path::ResolvedPath;
pub use types::{Edge, EdgeId, Vertex, VertexId, VertexKind};

use crate::error::{Element, GcsError, Result};
use crate::region::HPolytope;

#[derive(Clone, Debug)]
pub struct RegionGraph {
    regions: Vec<HPolytope>,
    dim: usize,
    vertices: BTreeMap<VertexId, Vertex>,
    edges: BTreeMap<EdgeId, Edge>,
    /// Outgoing edges of each live vertex.
    out: HashMap<VertexId, Vec<EdgeId>>,
    /// Incoming edges of each live vertex.
    inc: HashMap<VertexId, Vec<EdgeId>>,
    by_pair: HashMap<(VertexId, VertexId), EdgeId>,
    next_vertex: usize,
    next_edge: usize,
}

impl RegionGraph {
    /// Ambient dimension shared by all regions.
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    #[inline]
    pub fn regions(&self) -> &[HPolytope] {
        &self.regions
    }

    pub fn vertex(&self, id: VertexId) -> Result<&Vertex> {
        self.vertices
            .get(&id)
            .ok_or(GcsError::UnknownElement(Element::Vertex(id)))
    }

    pub fn edge(&self, id: EdgeId) -> Result<&Edge> {
        self.edges
            .get(&id)
            .ok_or(GcsError::UnknownElement(Element::Edge(id)))
    }

    /// Resolve the transition `from → to`.
    pub fn edge_between(&self, from: VertexId, to: VertexId) -> Result<&Edge> {
        let id = self
            .by_pair
            .get(&(from, to))
            .ok_or(GcsError::UnknownElement(Element::Transition(from, to)))?;
        self.edge(*id)
    }

    /// Region of a `Region` vertex; `None` for start/goal vertices.
    pub fn region(&self, id: VertexId) -> Result<Option<&HPolytope>> {
        Ok(match self.vertex(id)?.kind {
            VertexKind::Region(r) => Some(&self.regions[r]),
            _ => None,
        })
    }

    /// Live vertices in id order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> + '_ {
        self.vertices.values()
    }

    /// Live edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.values()
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn successors(&self, id: VertexId) -> Result<Vec<VertexId>> {
        self.vertex(id)?;
        Ok(self.incident(&self.out, id).map(|e| e.to).collect())
    }

    pub fn predecessors(&self, id: VertexId) -> Result<Vec<VertexId>> {
        self.vertex(id)?;
        Ok(self.incident(&self.inc, id).map(|e| e.from).collect())
    }

    /// Successor lists of every live vertex.
    pub fn adjacency_list(&self) -> HashMap<VertexId, Vec<VertexId>> {
        self.vertices()
            .map(|v| (v.id, self.incident(&self.out, v.id).map(|e| e.to).collect()))
            .collect()
    }

    fn incident<'a>(
        &'a self,
        side: &'a HashMap<VertexId, Vec<EdgeId>>,
        id: VertexId,
    ) -> impl Iterator<Item = &'a Edge> + 'a {
        side.get(&id)
            .into_iter()
            .flatten()
            .filter_map(move |e| self.edges.get(e))
    }

    /// Region vertices whose polytope contains `point` within `eps`.
    pub fn containing_regions(&self, point: &nalgebra::DVector<f64>, eps: f64) -> Vec<VertexId> {
        self.vertices()
            .filter_map(|v| match v.kind {
                VertexKind::Region(r) if self.regions[r].contains_eps(point, eps) => Some(v.id),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests;
