//! Error taxonomy.
//!
//! Structural and input errors are reported immediately. Numerical
//! infeasibility is not an error: it is carried in `SolveResult::success`.
//! `BackendUnavailable` is the only condition meant to escalate.

use thiserror::Error;

use crate::graph::{EdgeId, VertexId};

/// Which kind of graph element a lookup failed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Element {
    Vertex(VertexId),
    Edge(EdgeId),
    Transition(VertexId, VertexId),
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Element::Vertex(v) => write!(f, "vertex {}", v.0),
            Element::Edge(e) => write!(f, "edge {}", e.0),
            Element::Transition(u, v) => write!(f, "transition {} -> {}", u.0, v.0),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GcsError {
    /// Region set or adjacency rejected at build time.
    #[error("malformed graph: {0}")]
    MalformedGraph(String),

    /// A vertex, edge or transition id that the graph never produced (or already dropped).
    #[error("unknown element: {0}")]
    UnknownElement(Element),

    /// Path rejected before solving (empty, revisits a vertex, edge ids out of step).
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A start/goal point that lies in no region of the graph.
    #[error("point {0:?} is not contained in any region")]
    Uncontained(Vec<f64>),

    #[error("invalid configuration for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// Solver session could not be acquired for this thread.
    #[error("solver backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl GcsError {
    pub(crate) fn config(field: &'static str, reason: impl Into<String>) -> Self {
        GcsError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    /// True for errors that invalidate only the current query (the caller should
    /// drop the path and keep searching).
    pub fn is_path_local(&self) -> bool {
        matches!(
            self,
            GcsError::UnknownElement(_) | GcsError::InvalidPath(_) | GcsError::DimensionMismatch { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, GcsError>;
