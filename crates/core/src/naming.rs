use crate::error::EditError;
use crate::mesh::Mesh;

pub const ORIGINAL_NORMALS: &str = "OriginalNormals";
pub const CURRENT_NORMALS_AS_COLOURS: &str = "CurrentNormals_AsColours";
pub const ORIGINAL_NORMALS_AS_COLOURS: &str = "OriginalNormals_AsColours";
pub const DELTA_SUFFIX: &str = "_dN";
pub const DELTA_COLOURS_SUFFIX: &str = "_NtoC";

// Shape keys with this name are separators, not morphs.
pub const SEPARATOR_SHAPE_KEY: &str = "::";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKey {
    OriginalNormals,
    CurrentNormalsAsColours,
    OriginalNormalsAsColours,
    Delta(usize),
    DeltaColours(usize),
}

impl AttributeKey {
    pub fn name(self, mesh: &Mesh) -> Result<String, EditError> {
        Ok(match self {
            AttributeKey::OriginalNormals => ORIGINAL_NORMALS.to_string(),
            AttributeKey::CurrentNormalsAsColours => CURRENT_NORMALS_AS_COLOURS.to_string(),
            AttributeKey::OriginalNormalsAsColours => ORIGINAL_NORMALS_AS_COLOURS.to_string(),
            AttributeKey::Delta(index) => format!("{}{DELTA_SUFFIX}", shape_key_name(mesh, index)?),
            AttributeKey::DeltaColours(index) => {
                format!("{}{DELTA_COLOURS_SUFFIX}", shape_key_name(mesh, index)?)
            }
        })
    }

    pub fn parse(mesh: &Mesh, name: &str) -> Option<Self> {
        match name {
            ORIGINAL_NORMALS => return Some(AttributeKey::OriginalNormals),
            CURRENT_NORMALS_AS_COLOURS => return Some(AttributeKey::CurrentNormalsAsColours),
            ORIGINAL_NORMALS_AS_COLOURS => return Some(AttributeKey::OriginalNormalsAsColours),
            _ => {}
        }
        if let Some(key) = name.strip_suffix(DELTA_SUFFIX) {
            return shape_key_index(mesh, key).map(AttributeKey::Delta);
        }
        if let Some(key) = name.strip_suffix(DELTA_COLOURS_SUFFIX) {
            return shape_key_index(mesh, key).map(AttributeKey::DeltaColours);
        }
        None
    }

    pub fn colours(self) -> Option<AttributeKey> {
        match self {
            AttributeKey::OriginalNormals => Some(AttributeKey::OriginalNormalsAsColours),
            AttributeKey::Delta(index) => Some(AttributeKey::DeltaColours(index)),
            _ => None,
        }
    }
}

pub fn shape_key_name(mesh: &Mesh, index: usize) -> Result<&str, EditError> {
    mesh.shape_keys
        .get(index)
        .map(String::as_str)
        .ok_or(EditError::UnknownShapeKey(index))
}

pub fn shape_key_index(mesh: &Mesh, name: &str) -> Option<usize> {
    mesh.shape_keys.iter().position(|key| key == name)
}

pub fn editable_shape_keys(mesh: &Mesh) -> Vec<usize> {
    mesh.shape_keys
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, name)| name.as_str() != SEPARATOR_SHAPE_KEY)
        .map(|(index, _)| index)
        .collect()
}

pub fn is_managed_name(name: &str) -> bool {
    matches!(
        name,
        ORIGINAL_NORMALS | CURRENT_NORMALS_AS_COLOURS | ORIGINAL_NORMALS_AS_COLOURS
    ) || name.contains(DELTA_SUFFIX)
        || name.contains(DELTA_COLOURS_SUFFIX)
}
