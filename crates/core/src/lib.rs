mod attribute_set;
mod attributes;
mod color;
mod domain;
mod error;
mod groups;
mod mesh;
mod naming;
mod normals;
mod ntoc;
mod parallel;
mod settings;
pub mod transfer;

pub use attribute_set::{add_missing_attributes, delete_all_attributes};
pub use attributes::{
    flatten_tuples, group_tuples, AttributeDomain, AttributeError, AttributeInfo, AttributeRef,
    AttributeStorage, AttributeType, AttributeValue, MeshAttributes,
};
pub use color::{normal_to_color, normals_to_colors};
pub use domain::{convert_values, corner_from_vertex, read_in_domain, switch_domain, vertex_from_corner};
pub use error::EditError;
pub use groups::{Masking, VertexGroup, VertexMask};
pub use mesh::{make_box, make_grid, Mesh};
pub use naming::{
    editable_shape_keys, is_managed_name, shape_key_index, shape_key_name, AttributeKey,
    CURRENT_NORMALS_AS_COLOURS, DELTA_COLOURS_SUFFIX, DELTA_SUFFIX, ORIGINAL_NORMALS,
    ORIGINAL_NORMALS_AS_COLOURS, SEPARATOR_SHAPE_KEY,
};
pub use normals::{
    add_delta_to_current, capture_delta_from_current, capture_original_from_current, clear_delta,
    retarget_delta, set_current_from_original, set_current_from_original_plus_delta, EditOptions,
    NormalSet, DEFAULT_ZERO_SNAP_EPSILON,
};
pub use ntoc::{
    regenerate_all_colours, regenerate_current_colours, regenerate_delta_colours,
    regenerate_original_colours,
};
pub use settings::{EditorSettings, SETTINGS_VERSION};
pub use transfer::{
    transfer, transfer_by_nearest_surface, transfer_by_nearest_vertex, transfer_by_topology,
    Correspondence, ReferenceNormals, Retargeting, TransferMethod, TransferOptions,
};
