use thiserror::Error;

use crate::attributes::AttributeError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error(transparent)]
    Attribute(#[from] AttributeError),
    #[error("vertex group '{0}' does not exist")]
    MissingVertexGroup(String),
    #[error("shape key index {0} is out of range")]
    UnknownShapeKey(usize),
    #[error("topology transfer needs equal vertex counts (source {source_vertices}, destination {dest_vertices})")]
    IncompatibleTopology {
        source_vertices: usize,
        dest_vertices: usize,
    },
    #[error("malformed mesh: {0}")]
    MalformedMesh(String),
    #[error("source mesh has no {0} to sample")]
    EmptySource(&'static str),
}

impl EditError {
    pub fn missing(name: impl Into<String>) -> Self {
        EditError::Attribute(AttributeError::MissingAttribute { name: name.into() })
    }
}
