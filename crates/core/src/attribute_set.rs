use tracing::info;

use crate::attributes::{AttributeDomain, AttributeType};
use crate::error::EditError;
use crate::mesh::Mesh;
use crate::naming::{editable_shape_keys, is_managed_name, AttributeKey};
use crate::normals::{capture_original_from_current, EditOptions};
use crate::ntoc;

pub fn add_missing_attributes(mesh: &mut Mesh) -> Result<Vec<String>, EditError> {
    let mut staged = mesh.clone();
    let created = add_missing_to(&mut staged)?;
    *mesh = staged;
    info!("created {} attributes", created.len());
    Ok(created)
}

fn add_missing_to(mesh: &mut Mesh) -> Result<Vec<String>, EditError> {
    let current = mesh.current_normals();
    let mut created = Vec::new();

    let current_colours = AttributeKey::CurrentNormalsAsColours.name(mesh)?;
    if !mesh.has_attribute(&current_colours) {
        created.push(ntoc::regenerate_current_colours(mesh, &current)?);
    }

    let original = AttributeKey::OriginalNormals.name(mesh)?;
    if !mesh.has_attribute(&original) {
        capture_original_from_current(mesh, &current, &EditOptions::default())?;
        created.push(original);
    }

    let original_colours = AttributeKey::OriginalNormalsAsColours.name(mesh)?;
    if !mesh.has_attribute(&original_colours) {
        created.push(ntoc::regenerate_original_colours(mesh)?);
    }

    for shape_key in editable_shape_keys(mesh) {
        let delta = AttributeKey::Delta(shape_key).name(mesh)?;
        if !mesh.has_attribute(&delta) {
            mesh.add_attribute(&delta, AttributeType::Vec3, AttributeDomain::Corner);
            created.push(delta);
        }
        let colours = AttributeKey::DeltaColours(shape_key).name(mesh)?;
        if !mesh.has_attribute(&colours) {
            created.push(ntoc::regenerate_delta_colours(mesh, shape_key)?);
        }
    }
    Ok(created)
}

pub fn delete_all_attributes(mesh: &mut Mesh) -> Vec<String> {
    let doomed: Vec<String> = mesh
        .attributes
        .names()
        .into_iter()
        .filter(|name| is_managed_name(name))
        .collect();
    for name in &doomed {
        mesh.remove_attribute(name);
    }
    info!("deleted {} attributes", doomed.len());
    doomed
}
