use tracing::debug;

use crate::attributes::{AttributeDomain, AttributeStorage, AttributeValue};
use crate::error::EditError;
use crate::mesh::Mesh;

pub fn corner_from_vertex<T: AttributeValue>(mesh: &Mesh, values: &[T]) -> Vec<T> {
    mesh.corner_verts
        .iter()
        .map(|vertex| values[*vertex as usize])
        .collect()
}

// Averages the corner values around every vertex. A vertex without corners
// keeps the zero value.
pub fn vertex_from_corner<T: AttributeValue>(mesh: &Mesh, values: &[T]) -> Vec<T> {
    let mut sums = vec![T::ZERO; mesh.vertex_count()];
    let mut counts = vec![0u32; mesh.vertex_count()];
    for (corner, vertex) in mesh.corner_verts.iter().enumerate() {
        let vertex = *vertex as usize;
        sums[vertex] = sums[vertex].add(values[corner]);
        counts[vertex] += 1;
    }
    sums.into_iter()
        .zip(counts)
        .map(|(sum, count)| {
            if count == 0 {
                sum
            } else {
                sum.scale(1.0 / count as f32)
            }
        })
        .collect()
}

pub fn convert_values<T: AttributeValue>(
    mesh: &Mesh,
    values: Vec<T>,
    from: AttributeDomain,
    to: AttributeDomain,
) -> Vec<T> {
    match (from, to) {
        (AttributeDomain::Vertex, AttributeDomain::Corner) => corner_from_vertex(mesh, &values),
        (AttributeDomain::Corner, AttributeDomain::Vertex) => vertex_from_corner(mesh, &values),
        _ => values,
    }
}

pub fn read_in_domain<T: AttributeValue>(
    mesh: &Mesh,
    name: &str,
    domain: AttributeDomain,
) -> Result<Vec<T>, EditError> {
    let (stored, values) = mesh.read_values::<T>(name)?;
    Ok(convert_values(mesh, values, stored, domain))
}

pub fn switch_domain(mesh: &mut Mesh, name: &str) -> Result<AttributeDomain, EditError> {
    let (domain, storage) = mesh.attribute(name)?;
    let target = domain.other();
    let converted = match storage {
        AttributeStorage::Vec3(values) => {
            AttributeStorage::Vec3(convert_values(mesh, values.clone(), domain, target))
        }
        AttributeStorage::Color4(values) => {
            AttributeStorage::Color4(convert_values(mesh, values.clone(), domain, target))
        }
    };
    mesh.replace_attribute(name, target, converted)?;
    debug!("switched '{}' from {:?} to {:?}", name, domain, target);
    Ok(target)
}
