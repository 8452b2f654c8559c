use std::collections::BTreeMap;
use std::ops::Range;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::attributes::{
    AttributeDomain, AttributeError, AttributeInfo, AttributeStorage, AttributeType,
    AttributeValue, MeshAttributes,
};
use crate::error::EditError;
use crate::groups::VertexGroup;
use crate::normals::NormalSet;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub positions: Vec<[f32; 3]>,
    pub corner_verts: Vec<u32>,
    // Start corner of every polygon, followed by the total corner count.
    pub face_offsets: Vec<u32>,
    // Live per-corner split normals. `None` means smooth vertex normals.
    #[serde(default)]
    pub custom_normals: Option<Vec<[f32; 3]>>,
    #[serde(default)]
    pub shape_keys: Vec<String>,
    #[serde(default)]
    pub vertex_groups: BTreeMap<String, VertexGroup>,
    #[serde(default)]
    pub attributes: MeshAttributes,
    // Column-major object-to-world matrix. `None` means identity.
    #[serde(default)]
    pub world_transform: Option<[f32; 16]>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_polygons(positions: Vec<[f32; 3]>, faces: &[Vec<u32>]) -> Self {
        let mut corner_verts = Vec::new();
        let mut face_offsets = Vec::with_capacity(faces.len() + 1);
        for face in faces {
            face_offsets.push(corner_verts.len() as u32);
            corner_verts.extend_from_slice(face);
        }
        face_offsets.push(corner_verts.len() as u32);
        Self {
            positions,
            corner_verts,
            face_offsets,
            ..Self::default()
        }
    }

    pub fn with_positions_indices(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        let face_offsets = (0..=indices.len() / 3).map(|face| (face * 3) as u32).collect();
        Self {
            positions,
            corner_verts: indices,
            face_offsets,
            ..Self::default()
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn corner_count(&self) -> usize {
        self.corner_verts.len()
    }

    pub fn face_count(&self) -> usize {
        self.face_offsets.len().saturating_sub(1)
    }

    pub fn face_corners(&self, face: usize) -> Range<usize> {
        self.face_offsets[face] as usize..self.face_offsets[face + 1] as usize
    }

    pub fn validate(&self) -> Result<(), EditError> {
        let malformed = |message: String| Err(EditError::MalformedMesh(message));
        match self.face_offsets.first() {
            None if self.corner_verts.is_empty() => {}
            None => return malformed("corners without face offsets".to_string()),
            Some(0) => {}
            Some(first) => return malformed(format!("first face offset is {first}, not 0")),
        }
        if self.face_offsets.windows(2).any(|pair| pair[0] > pair[1]) {
            return malformed("face offsets decrease".to_string());
        }
        if let Some(last) = self.face_offsets.last() {
            if *last as usize != self.corner_count() {
                return malformed(format!(
                    "last face offset {last} does not match {} corners",
                    self.corner_count()
                ));
            }
        }
        if let Some(vertex) = self
            .corner_verts
            .iter()
            .find(|vertex| **vertex as usize >= self.vertex_count())
        {
            return malformed(format!(
                "corner vertex {vertex} out of range for {} vertices",
                self.vertex_count()
            ));
        }
        if let Some(normals) = &self.custom_normals {
            if normals.len() != self.corner_count() {
                return malformed(format!(
                    "{} custom normals for {} corners",
                    normals.len(),
                    self.corner_count()
                ));
            }
        }
        for domain in AttributeDomain::ALL {
            let expected = self.domain_len(domain);
            for (name, storage) in self.attributes.map(domain) {
                if storage.len() != expected {
                    return malformed(format!(
                        "attribute '{name}' has {} values, expected {expected}",
                        storage.len()
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn domain_len(&self, domain: AttributeDomain) -> usize {
        match domain {
            AttributeDomain::Vertex => self.vertex_count(),
            AttributeDomain::Corner => self.corner_count(),
        }
    }

    pub fn element_vertex(&self, domain: AttributeDomain, index: usize) -> usize {
        match domain {
            AttributeDomain::Vertex => index,
            AttributeDomain::Corner => self.corner_verts[index] as usize,
        }
    }

    pub fn world_matrix(&self) -> Mat4 {
        self.world_transform
            .map(|cols| Mat4::from_cols_array(&cols))
            .unwrap_or(Mat4::IDENTITY)
    }

    pub fn world_positions(&self) -> Vec<Vec3> {
        let matrix = self.world_matrix();
        self.positions
            .iter()
            .map(|p| matrix.transform_point3(Vec3::from(*p)))
            .collect()
    }

    pub fn list_attributes(&self) -> Vec<AttributeInfo> {
        let mut list = Vec::new();
        for domain in AttributeDomain::ALL {
            for (name, storage) in self.attributes.map(domain) {
                list.push(AttributeInfo {
                    name: name.clone(),
                    domain,
                    data_type: storage.data_type(),
                    len: storage.len(),
                });
            }
        }
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    pub fn attribute(&self, name: &str) -> Result<(AttributeDomain, &AttributeStorage), AttributeError> {
        self.attributes
            .get(name)
            .ok_or_else(|| AttributeError::MissingAttribute {
                name: name.to_string(),
            })
    }

    pub fn read_values<T: AttributeValue>(
        &self,
        name: &str,
    ) -> Result<(AttributeDomain, Vec<T>), AttributeError> {
        let (domain, storage) = self.attribute(name)?;
        Ok((domain, storage.values::<T>()?.to_vec()))
    }

    pub fn write_values<T: AttributeValue>(
        &mut self,
        name: &str,
        values: Vec<T>,
    ) -> Result<(), AttributeError> {
        let (domain, storage) = self.attribute(name)?;
        if storage.data_type() != T::TYPE {
            return Err(AttributeError::InvalidType {
                expected: storage.data_type(),
                actual: T::TYPE,
            });
        }
        let expected = self.domain_len(domain);
        if values.len() != expected {
            return Err(AttributeError::LengthMismatch {
                expected,
                actual: values.len(),
            });
        }
        self.attributes
            .insert(domain, name.to_string(), T::into_storage(values));
        Ok(())
    }

    pub fn read_flat(&self, name: &str) -> Result<Vec<f32>, AttributeError> {
        Ok(self.attribute(name)?.1.to_flat())
    }

    pub fn write_flat(&mut self, name: &str, flat: &[f32]) -> Result<(), AttributeError> {
        let (domain, storage) = self.attribute(name)?;
        let data_type = storage.data_type();
        let expected = self.domain_len(domain) * data_type.tuple_size();
        if flat.len() != expected {
            return Err(AttributeError::LengthMismatch {
                expected,
                actual: flat.len(),
            });
        }
        let storage = AttributeStorage::from_flat(data_type, flat)?;
        self.attributes.insert(domain, name.to_string(), storage);
        Ok(())
    }

    pub fn add_attribute(&mut self, name: &str, data_type: AttributeType, domain: AttributeDomain) {
        let storage = AttributeStorage::zeroed(data_type, self.domain_len(domain));
        self.attributes.insert(domain, name.to_string(), storage);
    }

    pub fn replace_attribute(
        &mut self,
        name: &str,
        domain: AttributeDomain,
        storage: AttributeStorage,
    ) -> Result<(), AttributeError> {
        let expected = self.domain_len(domain);
        if storage.len() != expected {
            return Err(AttributeError::LengthMismatch {
                expected,
                actual: storage.len(),
            });
        }
        self.attributes.insert(domain, name.to_string(), storage);
        Ok(())
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<(AttributeDomain, AttributeStorage)> {
        self.attributes.remove(name)
    }

    pub fn face_normal_weighted(&self, face: usize) -> Vec3 {
        let corners = self.face_corners(face);
        let count = corners.len();
        let mut normal = Vec3::ZERO;
        for i in 0..count {
            let a = Vec3::from(self.positions[self.corner_verts[corners.start + i] as usize]);
            let b = Vec3::from(
                self.positions[self.corner_verts[corners.start + (i + 1) % count] as usize],
            );
            normal.x += (a.y - b.y) * (a.z + b.z);
            normal.y += (a.z - b.z) * (a.x + b.x);
            normal.z += (a.x - b.x) * (a.y + b.y);
        }
        normal
    }

    pub fn vertex_normals(&self) -> Vec<[f32; 3]> {
        let mut accum = vec![Vec3::ZERO; self.vertex_count()];
        for face in 0..self.face_count() {
            let normal = self.face_normal_weighted(face);
            for corner in self.face_corners(face) {
                accum[self.corner_verts[corner] as usize] += normal;
            }
        }
        accum
            .into_iter()
            .map(|n| {
                let len = n.length();
                if len > 0.0 {
                    (n / len).to_array()
                } else {
                    [0.0, 0.0, 1.0]
                }
            })
            .collect()
    }

    pub fn current_normals(&self) -> NormalSet {
        if let Some(normals) = &self.custom_normals {
            if normals.len() == self.corner_count() {
                return NormalSet::new(normals.clone());
            }
        }
        let vertex_normals = self.vertex_normals();
        NormalSet::new(
            self.corner_verts
                .iter()
                .map(|vertex| vertex_normals[*vertex as usize])
                .collect(),
        )
    }

    pub fn set_custom_normals(&mut self, normals: NormalSet) -> Result<(), AttributeError> {
        if normals.len() != self.corner_count() {
            return Err(AttributeError::LengthMismatch {
                expected: self.corner_count(),
                actual: normals.len(),
            });
        }
        self.custom_normals = Some(normals.into_values());
        Ok(())
    }
}

pub fn make_box(size: [f32; 3]) -> Mesh {
    let hx = size[0] * 0.5;
    let hy = size[1] * 0.5;
    let hz = size[2] * 0.5;

    let positions = vec![
        [-hx, -hy, -hz],
        [hx, -hy, -hz],
        [hx, hy, -hz],
        [-hx, hy, -hz],
        [-hx, -hy, hz],
        [hx, -hy, hz],
        [hx, hy, hz],
        [-hx, hy, hz],
    ];

    let faces = vec![
        vec![0, 3, 2, 1], // -Z
        vec![4, 5, 6, 7], // +Z
        vec![0, 1, 5, 4], // -Y
        vec![2, 3, 7, 6], // +Y
        vec![1, 2, 6, 5], // +X
        vec![3, 0, 4, 7], // -X
    ];

    Mesh::from_polygons(positions, &faces)
}

pub fn make_grid(size: [f32; 2], divisions: [u32; 2]) -> Mesh {
    let width = size[0].max(0.0);
    let depth = size[1].max(0.0);
    let div_x = divisions[0].max(1);
    let div_z = divisions[1].max(1);

    let step_x = width / div_x as f32;
    let step_z = depth / div_z as f32;
    let origin_x = -width * 0.5;
    let origin_z = -depth * 0.5;

    let mut positions = Vec::new();
    for z in 0..=div_z {
        for x in 0..=div_x {
            positions.push([
                origin_x + x as f32 * step_x,
                0.0,
                origin_z + z as f32 * step_z,
            ]);
        }
    }

    let mut faces = Vec::new();
    let stride = div_x + 1;
    for z in 0..div_z {
        for x in 0..div_x {
            let i0 = z * stride + x;
            let i1 = i0 + 1;
            let i2 = i0 + stride;
            let i3 = i2 + 1;
            faces.push(vec![i0, i2, i3, i1]);
        }
    }

    Mesh::from_polygons(positions, &faces)
}
