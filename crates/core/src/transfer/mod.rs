pub mod bvh;
pub mod kdtree;
pub mod surface;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::attributes::{AttributeDomain, AttributeStorage, AttributeValue};
use crate::domain::{convert_values, read_in_domain};
use crate::error::EditError;
use crate::groups::Masking;
use crate::mesh::Mesh;
use crate::naming::ORIGINAL_NORMALS;
use crate::parallel;

use kdtree::KdTree;
use surface::SurfaceIndex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceNormals {
    #[default]
    OriginalNormals,
    CurrentNormals,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Retargeting {
    pub source: ReferenceNormals,
    pub dest: Option<ReferenceNormals>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMethod {
    Topology,
    NearestVertex,
    NearestSurface,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferOptions {
    pub source_attribute: String,
    pub dest_attribute: Option<String>,
    pub retargeting: Retargeting,
    pub masking: Masking,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            source_attribute: ORIGINAL_NORMALS.to_string(),
            dest_attribute: None,
            retargeting: Retargeting::default(),
            masking: Masking::Unmasked,
        }
    }
}

impl TransferOptions {
    pub fn new(source_attribute: impl Into<String>) -> Self {
        Self {
            source_attribute: source_attribute.into(),
            ..Self::default()
        }
    }

    pub fn dest_name(&self) -> &str {
        self.dest_attribute.as_deref().unwrap_or(&self.source_attribute)
    }

    fn retargets(&self) -> Option<Retargeting> {
        if self.source_attribute == ORIGINAL_NORMALS || self.retargeting.dest.is_none() {
            None
        } else {
            Some(self.retargeting)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Correspondence {
    pub source_domain: AttributeDomain,
    pub target_domain: AttributeDomain,
    pub samples: Vec<Vec<(usize, f32)>>,
}

impl Correspondence {
    pub fn gather<T: AttributeValue>(&self, values: &[T]) -> Vec<T> {
        parallel::map_indices(self.samples.len(), |index| {
            self.samples[index]
                .iter()
                .fold(T::ZERO, |acc, (source, weight)| acc.add(values[*source].scale(*weight)))
        })
    }
}

pub fn topology_correspondence(
    source: &Mesh,
    dest: &Mesh,
    source_domain: AttributeDomain,
) -> Result<Correspondence, EditError> {
    if source.vertex_count() != dest.vertex_count() {
        return Err(EditError::IncompatibleTopology {
            source_vertices: source.vertex_count(),
            dest_vertices: dest.vertex_count(),
        });
    }
    if source_domain == AttributeDomain::Corner && source.corner_count() == dest.corner_count() {
        return Ok(Correspondence {
            source_domain: AttributeDomain::Corner,
            target_domain: AttributeDomain::Corner,
            samples: (0..dest.corner_count()).map(|corner| vec![(corner, 1.0)]).collect(),
        });
    }
    Ok(Correspondence {
        source_domain: AttributeDomain::Vertex,
        target_domain: AttributeDomain::Corner,
        samples: dest
            .corner_verts
            .iter()
            .map(|vertex| vec![(*vertex as usize, 1.0)])
            .collect(),
    })
}

pub fn nearest_vertex_correspondence(source: &Mesh, dest: &Mesh) -> Result<Correspondence, EditError> {
    let tree = KdTree::build(&source.world_positions()).ok_or(EditError::EmptySource("vertices"))?;
    let targets = dest.world_positions();
    let samples = parallel::map_indices(targets.len(), |vertex| {
        tree.nearest(targets[vertex])
            .map(|(nearest, _)| vec![(nearest, 1.0)])
            .unwrap_or_default()
    });
    Ok(Correspondence {
        source_domain: AttributeDomain::Vertex,
        target_domain: AttributeDomain::Vertex,
        samples,
    })
}

pub fn nearest_surface_correspondence(source: &Mesh, dest: &Mesh) -> Result<Correspondence, EditError> {
    let index = SurfaceIndex::build(source).ok_or(EditError::EmptySource("faces"))?;
    let targets = dest.world_positions();
    let samples = parallel::map_indices(targets.len(), |vertex| {
        index
            .sample(targets[vertex])
            .map(|sample| sample.weights)
            .unwrap_or_default()
    });
    Ok(Correspondence {
        source_domain: AttributeDomain::Corner,
        target_domain: AttributeDomain::Vertex,
        samples,
    })
}

fn reference_normals(
    mesh: &Mesh,
    reference: ReferenceNormals,
    domain: AttributeDomain,
) -> Result<Vec<[f32; 3]>, EditError> {
    match reference {
        ReferenceNormals::OriginalNormals => read_in_domain(mesh, ORIGINAL_NORMALS, domain),
        ReferenceNormals::CurrentNormals => Ok(convert_values(
            mesh,
            mesh.current_normals().into_values(),
            AttributeDomain::Corner,
            domain,
        )),
    }
}

fn gather_vectors(
    source: &Mesh,
    dest: &Mesh,
    correspondence: &Correspondence,
    values: Vec<[f32; 3]>,
    retargeting: Option<Retargeting>,
) -> Result<Vec<[f32; 3]>, EditError> {
    let Some(Retargeting {
        source: source_reference,
        dest: Some(dest_reference),
    }) = retargeting
    else {
        return Ok(correspondence.gather(&values));
    };
    let source_reference = reference_normals(source, source_reference, correspondence.source_domain)?;
    let target_reference = reference_normals(dest, dest_reference, correspondence.target_domain)?;
    let absolute: Vec<[f32; 3]> = values
        .iter()
        .zip(&source_reference)
        .map(|(delta, reference)| delta.add(*reference))
        .collect();
    Ok(correspondence
        .gather(&absolute)
        .into_iter()
        .zip(&target_reference)
        .map(|(normal, reference)| normal.add(reference.scale(-1.0)))
        .collect())
}

fn masked<T: AttributeValue>(
    dest: &Mesh,
    name: &str,
    domain: AttributeDomain,
    masking: &Masking,
    values: Vec<T>,
) -> Result<Vec<T>, EditError> {
    let mask = masking.resolve(dest)?;
    if mask.is_unmasked() || !dest.has_attribute(name) {
        return Ok(values);
    }
    let prior = read_in_domain::<T>(dest, name, domain)?;
    Ok(mask.apply(dest, domain, &prior, values))
}

fn transferred_storage(
    source: &Mesh,
    dest: &Mesh,
    correspondence: &Correspondence,
    options: &TransferOptions,
) -> Result<AttributeStorage, EditError> {
    let (stored, storage) = source.attribute(&options.source_attribute)?;
    let domain = correspondence.target_domain;
    let dest_name = options.dest_name();
    Ok(match storage {
        AttributeStorage::Vec3(values) => {
            let values = convert_values(source, values.clone(), stored, correspondence.source_domain);
            let gathered = gather_vectors(source, dest, correspondence, values, options.retargets())?;
            AttributeStorage::Vec3(masked(dest, dest_name, domain, &options.masking, gathered)?)
        }
        AttributeStorage::Color4(values) => {
            let values = convert_values(source, values.clone(), stored, correspondence.source_domain);
            let gathered = correspondence.gather(&values);
            AttributeStorage::Color4(masked(dest, dest_name, domain, &options.masking, gathered)?)
        }
    })
}

pub fn transfer(
    source: &Mesh,
    dest: &mut Mesh,
    method: TransferMethod,
    options: &TransferOptions,
) -> Result<String, EditError> {
    let (stored, _) = source.attribute(&options.source_attribute)?;
    let correspondence = match method {
        TransferMethod::Topology => topology_correspondence(source, dest, stored)?,
        TransferMethod::NearestVertex => nearest_vertex_correspondence(source, dest)?,
        TransferMethod::NearestSurface => nearest_surface_correspondence(source, dest)?,
    };
    debug!(
        "{:?} correspondence: {} {:?} targets from {:?} sources",
        method,
        correspondence.samples.len(),
        correspondence.target_domain,
        correspondence.source_domain
    );
    let storage = transferred_storage(source, dest, &correspondence, options)?;
    let name = options.dest_name().to_string();
    dest.replace_attribute(&name, correspondence.target_domain, storage)?;
    info!(
        "transferred '{}' to '{}' via {:?}",
        options.source_attribute, name, method
    );
    Ok(name)
}

pub fn transfer_by_topology(
    source: &Mesh,
    dest: &mut Mesh,
    options: &TransferOptions,
) -> Result<String, EditError> {
    transfer(source, dest, TransferMethod::Topology, options)
}

pub fn transfer_by_nearest_vertex(
    source: &Mesh,
    dest: &mut Mesh,
    options: &TransferOptions,
) -> Result<String, EditError> {
    transfer(source, dest, TransferMethod::NearestVertex, options)
}

pub fn transfer_by_nearest_surface(
    source: &Mesh,
    dest: &mut Mesh,
    options: &TransferOptions,
) -> Result<String, EditError> {
    transfer(source, dest, TransferMethod::NearestSurface, options)
}
