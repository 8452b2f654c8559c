use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeDomain {
    Vertex,
    Corner,
}

impl AttributeDomain {
    pub const ALL: [AttributeDomain; 2] = [AttributeDomain::Vertex, AttributeDomain::Corner];

    pub fn other(self) -> Self {
        match self {
            AttributeDomain::Vertex => AttributeDomain::Corner,
            AttributeDomain::Corner => AttributeDomain::Vertex,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    Vec3,
    Color4,
}

impl AttributeType {
    pub fn tuple_size(self) -> usize {
        match self {
            AttributeType::Vec3 => 3,
            AttributeType::Color4 => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttributeError {
    #[error("attribute '{name}' does not exist")]
    MissingAttribute { name: String },
    #[error("expected {expected} elements, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("expected a {expected:?} attribute, got {actual:?}")]
    InvalidType {
        expected: AttributeType,
        actual: AttributeType,
    },
    #[error("flat buffer of {len} floats does not split into tuples of {tuple_size}")]
    RaggedBuffer { tuple_size: usize, len: usize },
}

pub trait AttributeValue: Copy + Send + Sync + 'static {
    const ZERO: Self;
    const TYPE: AttributeType;

    fn add(self, other: Self) -> Self;
    fn scale(self, factor: f32) -> Self;

    fn lerp(self, other: Self, t: f32) -> Self {
        self.scale(1.0 - t).add(other.scale(t))
    }

    fn slice(storage: &AttributeStorage) -> Option<&[Self]>;
    fn into_storage(values: Vec<Self>) -> AttributeStorage;
}

impl AttributeValue for [f32; 3] {
    const ZERO: Self = [0.0; 3];
    const TYPE: AttributeType = AttributeType::Vec3;

    fn add(self, other: Self) -> Self {
        std::array::from_fn(|i| self[i] + other[i])
    }

    fn scale(self, factor: f32) -> Self {
        self.map(|v| v * factor)
    }

    fn slice(storage: &AttributeStorage) -> Option<&[Self]> {
        match storage {
            AttributeStorage::Vec3(values) => Some(values),
            AttributeStorage::Color4(_) => None,
        }
    }

    fn into_storage(values: Vec<Self>) -> AttributeStorage {
        AttributeStorage::Vec3(values)
    }
}

impl AttributeValue for [f32; 4] {
    const ZERO: Self = [0.0; 4];
    const TYPE: AttributeType = AttributeType::Color4;

    fn add(self, other: Self) -> Self {
        std::array::from_fn(|i| self[i] + other[i])
    }

    fn scale(self, factor: f32) -> Self {
        self.map(|v| v * factor)
    }

    fn slice(storage: &AttributeStorage) -> Option<&[Self]> {
        match storage {
            AttributeStorage::Color4(values) => Some(values),
            AttributeStorage::Vec3(_) => None,
        }
    }

    fn into_storage(values: Vec<Self>) -> AttributeStorage {
        AttributeStorage::Color4(values)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeStorage {
    Vec3(Vec<[f32; 3]>),
    Color4(Vec<[f32; 4]>),
}

impl AttributeStorage {
    pub fn zeroed(data_type: AttributeType, len: usize) -> Self {
        match data_type {
            AttributeType::Vec3 => AttributeStorage::Vec3(vec![[0.0; 3]; len]),
            AttributeType::Color4 => AttributeStorage::Color4(vec![[0.0; 4]; len]),
        }
    }

    pub fn from_flat(data_type: AttributeType, flat: &[f32]) -> Result<Self, AttributeError> {
        Ok(match data_type {
            AttributeType::Vec3 => AttributeStorage::Vec3(group_tuples(flat)?),
            AttributeType::Color4 => AttributeStorage::Color4(group_tuples(flat)?),
        })
    }

    pub fn to_flat(&self) -> Vec<f32> {
        match self {
            AttributeStorage::Vec3(values) => flatten_tuples(values),
            AttributeStorage::Color4(values) => flatten_tuples(values),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            AttributeStorage::Vec3(values) => values.len(),
            AttributeStorage::Color4(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> AttributeType {
        match self {
            AttributeStorage::Vec3(_) => AttributeType::Vec3,
            AttributeStorage::Color4(_) => AttributeType::Color4,
        }
    }

    pub fn as_ref(&self) -> AttributeRef<'_> {
        match self {
            AttributeStorage::Vec3(values) => AttributeRef::Vec3(values.as_slice()),
            AttributeStorage::Color4(values) => AttributeRef::Color4(values.as_slice()),
        }
    }

    pub fn values<T: AttributeValue>(&self) -> Result<&[T], AttributeError> {
        T::slice(self).ok_or(AttributeError::InvalidType {
            expected: T::TYPE,
            actual: self.data_type(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeRef<'a> {
    Vec3(&'a [[f32; 3]]),
    Color4(&'a [[f32; 4]]),
}

impl<'a> AttributeRef<'a> {
    pub fn len(&self) -> usize {
        match self {
            AttributeRef::Vec3(values) => values.len(),
            AttributeRef::Color4(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> AttributeType {
        match self {
            AttributeRef::Vec3(_) => AttributeType::Vec3,
            AttributeRef::Color4(_) => AttributeType::Color4,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    pub name: String,
    pub domain: AttributeDomain,
    pub data_type: AttributeType,
    pub len: usize,
}

pub fn group_tuples<const N: usize>(flat: &[f32]) -> Result<Vec<[f32; N]>, AttributeError> {
    if N == 0 || flat.len() % N != 0 {
        return Err(AttributeError::RaggedBuffer {
            tuple_size: N,
            len: flat.len(),
        });
    }
    Ok(flat
        .chunks_exact(N)
        .map(|chunk| std::array::from_fn(|i| chunk[i]))
        .collect())
}

pub fn flatten_tuples<const N: usize>(values: &[[f32; N]]) -> Vec<f32> {
    values.iter().flat_map(|value| value.iter().copied()).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshAttributes {
    #[serde(default)]
    vertex: HashMap<String, AttributeStorage>,
    #[serde(default)]
    corner: HashMap<String, AttributeStorage>,
}

impl MeshAttributes {
    pub fn map(&self, domain: AttributeDomain) -> &HashMap<String, AttributeStorage> {
        match domain {
            AttributeDomain::Vertex => &self.vertex,
            AttributeDomain::Corner => &self.corner,
        }
    }

    pub fn map_mut(&mut self, domain: AttributeDomain) -> &mut HashMap<String, AttributeStorage> {
        match domain {
            AttributeDomain::Vertex => &mut self.vertex,
            AttributeDomain::Corner => &mut self.corner,
        }
    }

    pub fn get(&self, name: &str) -> Option<(AttributeDomain, &AttributeStorage)> {
        AttributeDomain::ALL
            .into_iter()
            .find_map(|domain| self.map(domain).get(name).map(|storage| (domain, storage)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn insert(&mut self, domain: AttributeDomain, name: String, storage: AttributeStorage) {
        self.map_mut(domain.other()).remove(&name);
        self.map_mut(domain).insert(name, storage);
    }

    pub fn remove(&mut self, name: &str) -> Option<(AttributeDomain, AttributeStorage)> {
        AttributeDomain::ALL
            .into_iter()
            .find_map(|domain| self.map_mut(domain).remove(name).map(|storage| (domain, storage)))
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = AttributeDomain::ALL
            .into_iter()
            .flat_map(|domain| self.map(domain).keys().cloned())
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_tuples_splits_in_element_order() {
        let flat = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let grouped: Vec<[f32; 3]> = group_tuples(&flat).unwrap();
        assert_eq!(grouped, vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(flatten_tuples(&grouped), flat.to_vec());
    }

    #[test]
    fn group_tuples_rejects_ragged_buffer() {
        let err = group_tuples::<4>(&[0.0; 6]).unwrap_err();
        assert_eq!(err, AttributeError::RaggedBuffer { tuple_size: 4, len: 6 });
    }

    #[test]
    fn insert_moves_name_between_domains() {
        let mut attributes = MeshAttributes::default();
        attributes.insert(
            AttributeDomain::Vertex,
            "a".to_string(),
            AttributeStorage::zeroed(AttributeType::Vec3, 2),
        );
        attributes.insert(
            AttributeDomain::Corner,
            "a".to_string(),
            AttributeStorage::zeroed(AttributeType::Vec3, 4),
        );
        let (domain, storage) = attributes.get("a").expect("attribute");
        assert_eq!(domain, AttributeDomain::Corner);
        assert_eq!(storage.len(), 4);
        assert!(attributes.map(AttributeDomain::Vertex).is_empty());
    }

    #[test]
    fn typed_values_check_kind() {
        let storage = AttributeStorage::zeroed(AttributeType::Color4, 1);
        assert!(storage.values::<[f32; 4]>().is_ok());
        assert_eq!(
            storage.values::<[f32; 3]>().unwrap_err(),
            AttributeError::InvalidType {
                expected: AttributeType::Vec3,
                actual: AttributeType::Color4,
            }
        );
    }

    #[test]
    fn lerp_blends_componentwise() {
        let a = [0.0, 2.0, -1.0];
        let b = [1.0, 0.0, 1.0];
        assert_eq!(a.lerp(b, 0.5), [0.5, 1.0, 0.0]);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
    }
}
