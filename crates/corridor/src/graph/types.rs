//! Identifier and element types for the region graph.

use nalgebra::DVector;

/// Stable vertex identifier. Region `i` of the input becomes `VertexId(i)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub usize);

/// Stable edge identifier, assigned in insertion order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub usize);

impl From<usize> for VertexId {
    fn from(v: usize) -> Self {
        VertexId(v)
    }
}

impl From<usize> for EdgeId {
    fn from(e: usize) -> Self {
        EdgeId(e)
    }
}

/// What a vertex stands for.
#[derive(Clone, Debug, PartialEq)]
pub enum VertexKind {
    /// Index into the graph's region list.
    Region(usize),
    /// Ephemeral single-point source.
    Start(DVector<f64>),
    /// Ephemeral single-point sink.
    Goal(DVector<f64>),
}

impl VertexKind {
    #[inline]
    pub fn is_ephemeral(&self) -> bool {
        !matches!(self, VertexKind::Region(_))
    }

    /// The fixed point of a start/goal vertex.
    #[inline]
    pub fn point(&self) -> Option<&DVector<f64>> {
        match self {
            VertexKind::Region(_) => None,
            VertexKind::Start(p) | VertexKind::Goal(p) => Some(p),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    pub id: VertexId,
    pub kind: VertexKind,
}

/// Directed transition `from → to`. Carries no variables of its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub id: EdgeId,
    pub from: VertexId,
    pub to: VertexId,
}
