use tracing::{debug, info};

use crate::attributes::{AttributeDomain, AttributeStorage, AttributeValue};
use crate::color::normals_to_colors;
use crate::domain::read_in_domain;
use crate::error::EditError;
use crate::mesh::Mesh;
use crate::naming::{editable_shape_keys, AttributeKey};
use crate::normals::NormalSet;

fn store_colours(mesh: &mut Mesh, key: AttributeKey, normals: &[[f32; 3]]) -> Result<String, EditError> {
    let name = key.name(mesh)?;
    let colours = normals_to_colors(normals);
    mesh.replace_attribute(&name, AttributeDomain::Corner, AttributeStorage::Color4(colours))?;
    debug!("regenerated '{}'", name);
    Ok(name)
}

fn corner_vectors(mesh: &Mesh, key: AttributeKey) -> Result<Vec<[f32; 3]>, EditError> {
    read_in_domain(mesh, &key.name(mesh)?, AttributeDomain::Corner)
}

pub fn regenerate_current_colours(mesh: &mut Mesh, current: &NormalSet) -> Result<String, EditError> {
    store_colours(mesh, AttributeKey::CurrentNormalsAsColours, current.values())
}

pub fn regenerate_original_colours(mesh: &mut Mesh) -> Result<String, EditError> {
    let original = corner_vectors(mesh, AttributeKey::OriginalNormals)?;
    store_colours(mesh, AttributeKey::OriginalNormalsAsColours, &original)
}

pub fn regenerate_delta_colours(mesh: &mut Mesh, shape_key: usize) -> Result<String, EditError> {
    let original = corner_vectors(mesh, AttributeKey::OriginalNormals)?;
    let deltas = corner_vectors(mesh, AttributeKey::Delta(shape_key))?;
    let combined: Vec<[f32; 3]> = original
        .iter()
        .zip(&deltas)
        .map(|(normal, delta)| normal.add(*delta))
        .collect();
    store_colours(mesh, AttributeKey::DeltaColours(shape_key), &combined)
}

pub fn regenerate_all_colours(mesh: &mut Mesh, current: &NormalSet) -> Result<Vec<String>, EditError> {
    let mut staged = mesh.clone();
    let mut regenerated = vec![regenerate_current_colours(&mut staged, current)?];
    if staged.has_attribute(&AttributeKey::OriginalNormals.name(&staged)?) {
        regenerated.push(regenerate_original_colours(&mut staged)?);
        for shape_key in editable_shape_keys(&staged) {
            if staged.has_attribute(&AttributeKey::Delta(shape_key).name(&staged)?) {
                regenerated.push(regenerate_delta_colours(&mut staged, shape_key)?);
            }
        }
    }
    *mesh = staged;
    info!("regenerated {} colour attributes", regenerated.len());
    Ok(regenerated)
}
