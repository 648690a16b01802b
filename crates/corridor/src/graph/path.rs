//! Path validation: caller-supplied vertex (and optional edge) ids → resolved path.

use std::collections::HashSet;

use super::types::{EdgeId, VertexId};
use super::RegionGraph;
use crate::error::{GcsError, Result};

/// A validated path: live vertices, no revisits, one edge per consecutive pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedPath {
    pub vertices: Vec<VertexId>,
    pub edges: Vec<EdgeId>,
}

impl ResolvedPath {
    /// The first `len` vertices and the edges between them.
    pub fn prefix(&self, len: usize) -> Self {
        let len = len.min(self.vertices.len());
        Self {
            vertices: self.vertices[..len].to_vec(),
            edges: self.edges[..len.saturating_sub(1)].to_vec(),
        }
    }
}

impl RegionGraph {
    /// Resolve a path. With `edges`, each id must be the transition between the
    /// corresponding consecutive vertices; without, transitions are looked up.
    pub fn resolve_path(
        &self,
        vertices: &[VertexId],
        edges: Option<&[EdgeId]>,
    ) -> Result<ResolvedPath> {
        if vertices.is_empty() {
            return Err(GcsError::InvalidPath("empty path".into()));
        }
        let mut seen = HashSet::with_capacity(vertices.len());
        for &v in vertices {
            self.vertex(v)?;
            if !seen.insert(v) {
                return Err(GcsError::InvalidPath(format!(
                    "vertex {} is visited more than once",
                    v.0
                )));
            }
        }
        let resolved = match edges {
            Some(eids) => {
                if eids.len() + 1 != vertices.len() {
                    return Err(GcsError::InvalidPath(format!(
                        "{} vertices need {} edges, got {}",
                        vertices.len(),
                        vertices.len() - 1,
                        eids.len()
                    )));
                }
                for (pair, &eid) in vertices.windows(2).zip(eids) {
                    let e = self.edge(eid)?;
                    if e.from != pair[0] || e.to != pair[1] {
                        return Err(GcsError::InvalidPath(format!(
                            "edge {} connects {} -> {}, path has {} -> {}",
                            eid.0, e.from.0, e.to.0, pair[0].0, pair[1].0
                        )));
                    }
                }
                eids.to_vec()
            }
            None => vertices
                .windows(2)
                .map(|pair| self.edge_between(pair[0], pair[1]).map(|e| e.id))
                .collect::<Result<Vec<_>>>()?,
        };
        Ok(ResolvedPath {
            vertices: vertices.to_vec(),
            edges: resolved,
        })
    }
}
