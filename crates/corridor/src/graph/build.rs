//! Graph construction and the structural mutations used for start/goal points.

use std::collections::{BTreeMap, HashMap};

use tracing::info;

use super::types::{Edge, EdgeId, Vertex, VertexId, VertexKind};
use super::RegionGraph;
use crate::error::{GcsError, Result};
use crate::region::HPolytope;

impl RegionGraph {
    /// Build one vertex per region and one edge per adjacency pair `(from, to)`.
    ///
    /// Fails with `MalformedGraph` on an empty region set, mixed dimensions,
    /// out-of-range indices, self-loops or duplicate pairs.
    pub fn build(regions: Vec<HPolytope>, adjacency: &[(usize, usize)]) -> Result<Self> {
        let dim = regions
            .first()
            .map(HPolytope::dim)
            .ok_or_else(|| GcsError::MalformedGraph("no regions".into()))?;
        if let Some((i, r)) = regions.iter().enumerate().find(|(_, r)| r.dim() != dim) {
            return Err(GcsError::MalformedGraph(format!(
                "region {i} has dimension {}, expected {dim}",
                r.dim()
            )));
        }
        let n = regions.len();
        let vertices = (0..n)
            .map(|i| {
                let id = VertexId(i);
                (id, Vertex { id, kind: VertexKind::Region(i) })
            })
            .collect();
        let mut graph = Self {
            regions,
            dim,
            vertices,
            edges: BTreeMap::new(),
            out: (0..n).map(|i| (VertexId(i), Vec::new())).collect(),
            inc: (0..n).map(|i| (VertexId(i), Vec::new())).collect(),
            by_pair: HashMap::with_capacity(adjacency.len()),
            next_vertex: n,
            next_edge: 0,
        };
        for &(u, v) in adjacency {
            if u >= n || v >= n {
                return Err(GcsError::MalformedGraph(format!(
                    "adjacency pair ({u}, {v}) references a region outside 0..{n}"
                )));
            }
            if u == v {
                return Err(GcsError::MalformedGraph(format!("self-loop on region {u}")));
            }
            if graph.by_pair.contains_key(&(VertexId(u), VertexId(v))) {
                return Err(GcsError::MalformedGraph(format!(
                    "duplicate adjacency pair ({u}, {v})"
                )));
            }
            graph.push_edge(VertexId(u), VertexId(v));
        }
        info!(
            regions = n,
            edges = graph.edges.len(),
            dim,
            "region graph built"
        );
        Ok(graph)
    }

    fn push_edge(&mut self, from: VertexId, to: VertexId) -> EdgeId {
        let id = EdgeId(self.next_edge);
        self.next_edge += 1;
        self.edges.insert(id, Edge { id, from, to });
        self.out.entry(from).or_default().push(id);
        self.inc.entry(to).or_default().push(id);
        self.by_pair.insert((from, to), id);
        id
    }

    /// Insert a start/goal vertex. Region kinds are rejected: regions are fixed at build.
    pub(crate) fn add_ephemeral(&mut self, kind: VertexKind) -> Result<VertexId> {
        let point = kind.point().ok_or_else(|| {
            GcsError::MalformedGraph("only start/goal vertices can be added after build".into())
        })?;
        if point.len() != self.dim {
            return Err(GcsError::DimensionMismatch {
                expected: self.dim,
                got: point.len(),
            });
        }
        let id = VertexId(self.next_vertex);
        self.next_vertex += 1;
        self.vertices.insert(id, Vertex { id, kind });
        self.out.insert(id, Vec::new());
        self.inc.insert(id, Vec::new());
        Ok(id)
    }

    /// Add the transition `from → to` between two live vertices.
    pub(crate) fn connect(&mut self, from: VertexId, to: VertexId) -> Result<EdgeId> {
        self.vertex(from)?;
        self.vertex(to)?;
        if let Some(&id) = self.by_pair.get(&(from, to)) {
            return Ok(id);
        }
        Ok(self.push_edge(from, to))
    }

    /// Drop an ephemeral vertex and its incident edges; returns the removed edge ids.
    pub(crate) fn remove_ephemeral(&mut self, id: VertexId) -> Result<Vec<EdgeId>> {
        if !self.vertex(id)?.kind.is_ephemeral() {
            return Err(GcsError::MalformedGraph(format!(
                "vertex {} is a region and cannot be removed",
                id.0
            )));
        }
        let incident: Vec<EdgeId> = self
            .out
            .remove(&id)
            .into_iter()
            .chain(self.inc.remove(&id))
            .flatten()
            .collect();
        for &e in &incident {
            if let Some(edge) = self.edges.remove(&e) {
                self.by_pair.remove(&(edge.from, edge.to));
                if let Some(list) = self.out.get_mut(&edge.from) {
                    list.retain(|x| *x != e);
                }
                if let Some(list) = self.inc.get_mut(&edge.to) {
                    list.retain(|x| *x != e);
                }
            }
        }
        self.vertices.remove(&id);
        Ok(incident)
    }
}
