use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::attributes::{AttributeDomain, AttributeValue};
use crate::error::EditError;
use crate::mesh::Mesh;

// Sparse per-vertex weights. A vertex missing from the map is not a member,
// which is a different state from being a member with weight 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VertexGroup {
    weights: BTreeMap<u32, f32>,
}

impl VertexGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_weights(weights: impl IntoIterator<Item = (u32, f32)>) -> Self {
        let mut group = Self::new();
        for (vertex, weight) in weights {
            group.assign(vertex, weight);
        }
        group
    }

    pub fn assign(&mut self, vertex: u32, weight: f32) {
        self.weights.insert(vertex, weight.clamp(0.0, 1.0));
    }

    pub fn remove(&mut self, vertex: u32) -> Option<f32> {
        self.weights.remove(&vertex)
    }

    pub fn weight(&self, vertex: usize) -> Option<f32> {
        u32::try_from(vertex)
            .ok()
            .and_then(|vertex| self.weights.get(&vertex).copied())
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "group")]
pub enum Masking {
    #[default]
    Unmasked,
    RestrictTo(String),
    ExcludeFrom(String),
}

impl Masking {
    pub fn resolve<'a>(&self, mesh: &'a Mesh) -> Result<VertexMask<'a>, EditError> {
        let lookup = |name: &String| {
            mesh.vertex_groups
                .get(name)
                .ok_or_else(|| EditError::MissingVertexGroup(name.clone()))
        };
        Ok(match self {
            Masking::Unmasked => VertexMask::Unmasked,
            Masking::RestrictTo(name) => VertexMask::RestrictTo(lookup(name)?),
            Masking::ExcludeFrom(name) => VertexMask::ExcludeFrom(lookup(name)?),
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub enum VertexMask<'a> {
    Unmasked,
    RestrictTo(&'a VertexGroup),
    ExcludeFrom(&'a VertexGroup),
}

impl VertexMask<'_> {
    pub fn is_unmasked(&self) -> bool {
        matches!(self, VertexMask::Unmasked)
    }

    pub fn blend<T: AttributeValue>(&self, vertex: usize, prior: T, edited: T) -> T {
        match self {
            VertexMask::Unmasked => edited,
            VertexMask::RestrictTo(group) => match group.weight(vertex) {
                Some(weight) => prior.lerp(edited, weight),
                None => prior,
            },
            VertexMask::ExcludeFrom(group) => match group.weight(vertex) {
                Some(weight) => edited.lerp(prior, weight),
                None => edited,
            },
        }
    }

    pub fn apply<T: AttributeValue>(
        &self,
        mesh: &Mesh,
        domain: AttributeDomain,
        prior: &[T],
        mut edited: Vec<T>,
    ) -> Vec<T> {
        if self.is_unmasked() {
            return edited;
        }
        for (index, (value, old)) in edited.iter_mut().zip(prior).enumerate() {
            let vertex = mesh.element_vertex(domain, index);
            *value = self.blend(vertex, *old, *value);
        }
        edited
    }
}
