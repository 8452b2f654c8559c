use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attributes::{AttributeDomain, AttributeStorage, AttributeValue};
use crate::domain::read_in_domain;
use crate::error::EditError;
use crate::groups::Masking;
use crate::mesh::Mesh;
use crate::naming::AttributeKey;
use crate::parallel;

pub const DEFAULT_ZERO_SNAP_EPSILON: f32 = 1.0e-3;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalSet {
    values: Vec<[f32; 3]>,
}

impl NormalSet {
    pub fn new(values: Vec<[f32; 3]>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[[f32; 3]] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<[f32; 3]> {
        self.values
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditOptions {
    pub masking: Masking,
    pub renormalize: bool,
    pub zero_snap_epsilon: Option<f32>,
}

impl Default for EditOptions {
    fn default() -> Self {
        Self {
            masking: Masking::Unmasked,
            renormalize: true,
            zero_snap_epsilon: Some(DEFAULT_ZERO_SNAP_EPSILON),
        }
    }
}

impl EditOptions {
    pub fn with_masking(&self, masking: Masking) -> Self {
        Self {
            masking,
            ..self.clone()
        }
    }
}

fn corner_vectors(mesh: &Mesh, key: AttributeKey) -> Result<Vec<[f32; 3]>, EditError> {
    read_in_domain::<[f32; 3]>(mesh, &key.name(mesh)?, AttributeDomain::Corner)
}

fn check_normals(mesh: &Mesh, current: &NormalSet) -> Result<(), EditError> {
    if current.len() != mesh.corner_count() {
        return Err(crate::attributes::AttributeError::LengthMismatch {
            expected: mesh.corner_count(),
            actual: current.len(),
        }
        .into());
    }
    Ok(())
}

fn summed(a: &[[f32; 3]], b: &[[f32; 3]], renormalize: bool) -> Vec<[f32; 3]> {
    let mut out: Vec<[f32; 3]> = a.iter().zip(b).map(|(a, b)| a.add(*b)).collect();
    if renormalize {
        parallel::for_each_indexed_mut(&mut out, |_, value| {
            *value = Vec3::from(*value).normalize_or_zero().to_array();
        });
    }
    out
}

fn snap_to_zero(values: &mut [[f32; 3]], epsilon: Option<f32>) {
    let Some(epsilon) = epsilon else {
        return;
    };
    parallel::for_each_indexed_mut(values, |_, value| {
        if Vec3::from(*value).length() < epsilon {
            *value = [0.0; 3];
        }
    });
}

pub fn set_current_from_original(
    mesh: &Mesh,
    current: &NormalSet,
    options: &EditOptions,
) -> Result<NormalSet, EditError> {
    check_normals(mesh, current)?;
    let original = corner_vectors(mesh, AttributeKey::OriginalNormals)?;
    let mask = options.masking.resolve(mesh)?;
    let result = mask.apply(mesh, AttributeDomain::Corner, current.values(), original);
    debug!("set {} live normals from original normals", result.len());
    Ok(NormalSet::new(result))
}

pub fn capture_original_from_current(
    mesh: &mut Mesh,
    current: &NormalSet,
    options: &EditOptions,
) -> Result<(), EditError> {
    check_normals(mesh, current)?;
    let name = AttributeKey::OriginalNormals.name(mesh)?;
    let mask = options.masking.resolve(mesh)?;
    let mut captured = current.values().to_vec();
    if mesh.has_attribute(&name) {
        let previous = corner_vectors(mesh, AttributeKey::OriginalNormals)?;
        captured = mask.apply(mesh, AttributeDomain::Corner, &previous, captured);
    }
    mesh.replace_attribute(&name, AttributeDomain::Corner, AttributeStorage::Vec3(captured))?;
    debug!("captured live normals into '{}'", name);
    Ok(())
}

pub fn add_delta_to_current(
    mesh: &Mesh,
    current: &NormalSet,
    delta: AttributeKey,
    options: &EditOptions,
) -> Result<NormalSet, EditError> {
    check_normals(mesh, current)?;
    let deltas = corner_vectors(mesh, delta)?;
    let mask = options.masking.resolve(mesh)?;
    let sums = summed(current.values(), &deltas, options.renormalize);
    let result = mask.apply(mesh, AttributeDomain::Corner, current.values(), sums);
    debug!("added {:?} to {} live normals", delta, result.len());
    Ok(NormalSet::new(result))
}

pub fn set_current_from_original_plus_delta(
    mesh: &Mesh,
    current: &NormalSet,
    delta: AttributeKey,
    options: &EditOptions,
) -> Result<NormalSet, EditError> {
    check_normals(mesh, current)?;
    let original = corner_vectors(mesh, AttributeKey::OriginalNormals)?;
    let deltas = corner_vectors(mesh, delta)?;
    let mask = options.masking.resolve(mesh)?;
    let sums = summed(&original, &deltas, options.renormalize);
    let result = mask.apply(mesh, AttributeDomain::Corner, current.values(), sums);
    debug!("set {} live normals from original plus {:?}", result.len(), delta);
    Ok(NormalSet::new(result))
}

pub fn capture_delta_from_current(
    mesh: &mut Mesh,
    current: &NormalSet,
    delta: AttributeKey,
    options: &EditOptions,
) -> Result<(), EditError> {
    check_normals(mesh, current)?;
    let name = delta.name(mesh)?;
    let mask = options.masking.resolve(mesh)?;
    let original = corner_vectors(mesh, AttributeKey::OriginalNormals)?;
    let mut captured: Vec<[f32; 3]> = current
        .values()
        .iter()
        .zip(&original)
        .map(|(current, original)| current.add(original.scale(-1.0)))
        .collect();
    snap_to_zero(&mut captured, options.zero_snap_epsilon);
    if mesh.has_attribute(&name) {
        let previous = corner_vectors(mesh, delta)?;
        captured = mask.apply(mesh, AttributeDomain::Corner, &previous, captured);
    }
    mesh.replace_attribute(&name, AttributeDomain::Corner, AttributeStorage::Vec3(captured))?;
    debug!("captured '{}' from live normals", name);
    Ok(())
}

pub fn retarget_delta(
    mesh: &mut Mesh,
    current: &NormalSet,
    delta: AttributeKey,
    options: &EditOptions,
) -> Result<(), EditError> {
    check_normals(mesh, current)?;
    let name = delta.name(mesh)?;
    let original = corner_vectors(mesh, AttributeKey::OriginalNormals)?;
    let previous = corner_vectors(mesh, delta)?;
    let mask = options.masking.resolve(mesh)?;
    let retargeted: Vec<[f32; 3]> = original
        .iter()
        .zip(&previous)
        .zip(current.values())
        .map(|((original, delta), current)| original.add(*delta).add(current.scale(-1.0)))
        .collect();
    let result = mask.apply(mesh, AttributeDomain::Corner, &previous, retargeted);
    mesh.replace_attribute(&name, AttributeDomain::Corner, AttributeStorage::Vec3(result))?;
    debug!("retargeted '{}' to live normals", name);
    Ok(())
}

pub fn clear_delta(
    mesh: &mut Mesh,
    delta: AttributeKey,
    options: &EditOptions,
) -> Result<(), EditError> {
    let name = delta.name(mesh)?;
    let (domain, previous) = mesh.read_values::<[f32; 3]>(&name)?;
    let mask = options.masking.resolve(mesh)?;
    let zeros = vec![[0.0; 3]; previous.len()];
    let result = mask.apply(mesh, domain, &previous, zeros);
    mesh.replace_attribute(&name, domain, AttributeStorage::Vec3(result))?;
    debug!("cleared '{}'", name);
    Ok(())
}
