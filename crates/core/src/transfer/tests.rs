use glam::{Mat4, Vec3};

use super::{
    nearest_surface_correspondence, topology_correspondence, transfer, transfer_by_nearest_surface,
    transfer_by_nearest_vertex, transfer_by_topology, ReferenceNormals, Retargeting, TransferMethod,
    TransferOptions,
};
use crate::attributes::{AttributeDomain, AttributeStorage, AttributeType};
use crate::error::EditError;
use crate::groups::{Masking, VertexGroup};
use crate::mesh::{make_box, make_grid, Mesh};

fn with_vectors(mut mesh: Mesh, name: &str, domain: AttributeDomain, values: Vec<[f32; 3]>) -> Mesh {
    mesh.replace_attribute(name, domain, AttributeStorage::Vec3(values))
        .unwrap();
    mesh
}

fn assert_close(a: [f32; 3], b: [f32; 3], eps: f32) {
    for i in 0..3 {
        assert!((a[i] - b[i]).abs() < eps, "{a:?} != {b:?}");
    }
}

#[test]
fn topology_transfer_rejects_different_vertex_counts() {
    let source = make_grid([1.0, 1.0], [4, 1]);
    let source = with_vectors(source, "Smile_dN", AttributeDomain::Vertex, vec![[1.0; 3]; 10]);
    let mut dest = make_grid([1.0, 1.0], [5, 1]);
    assert_eq!(dest.vertex_count(), 12);
    let before = dest.clone();

    let err = transfer_by_topology(&source, &mut dest, &TransferOptions::new("Smile_dN")).unwrap_err();
    assert_eq!(
        err,
        EditError::IncompatibleTopology {
            source_vertices: 10,
            dest_vertices: 12,
        }
    );
    assert_eq!(dest, before);
}

#[test]
fn topology_transfer_copies_corners_and_broadcasts_vertices() {
    let source = make_box([1.0, 1.0, 1.0]);
    let corners: Vec<[f32; 3]> = (0..24).map(|i| [i as f32, 0.0, 0.0]).collect();
    let source = with_vectors(source, "A_dN", AttributeDomain::Corner, corners.clone());
    let vertices: Vec<[f32; 3]> = (0..8).map(|i| [0.0, i as f32, 0.0]).collect();
    let source = with_vectors(source, "B_dN", AttributeDomain::Vertex, vertices.clone());

    let mut dest = make_box([2.0, 2.0, 2.0]);
    transfer_by_topology(&source, &mut dest, &TransferOptions::new("A_dN")).unwrap();
    transfer_by_topology(&source, &mut dest, &TransferOptions::new("B_dN")).unwrap();

    assert_eq!(dest.read_values::<[f32; 3]>("A_dN").unwrap(), (AttributeDomain::Corner, corners));
    let (domain, broadcast) = dest.read_values::<[f32; 3]>("B_dN").unwrap();
    assert_eq!(domain, AttributeDomain::Corner);
    for (corner, value) in broadcast.iter().enumerate() {
        assert_eq!(*value, vertices[dest.corner_verts[corner] as usize]);
    }
}

#[test]
fn topology_with_different_corners_goes_through_vertices() {
    let source = make_grid([1.0, 1.0], [1, 1]);
    let source = with_vectors(source, "A_dN", AttributeDomain::Corner, vec![[2.0, 0.0, 0.0]; 4]);
    let mut dest = Mesh::with_positions_indices(source.positions.clone(), vec![0, 2, 3, 0, 3, 1]);
    let correspondence = topology_correspondence(&source, &dest, AttributeDomain::Corner).unwrap();
    assert_eq!(correspondence.source_domain, AttributeDomain::Vertex);
    transfer(&source, &mut dest, TransferMethod::Topology, &TransferOptions::new("A_dN")).unwrap();
    let (domain, values) = dest.read_values::<[f32; 3]>("A_dN").unwrap();
    assert_eq!(domain, AttributeDomain::Corner);
    assert_eq!(values, vec![[2.0, 0.0, 0.0]; 6]);
}

#[test]
fn nearest_vertex_reproduces_coincident_values() {
    let source = make_box([2.0, 2.0, 2.0]);
    let values: Vec<[f32; 3]> = (0..8).map(|i| [i as f32, -(i as f32), 0.5]).collect();
    let source = with_vectors(source, "Smile_dN", AttributeDomain::Vertex, values.clone());

    let picks = [6usize, 0, 3, 5];
    let mut dest = Mesh::from_polygons(
        picks.iter().map(|i| source.positions[*i]).collect(),
        &[vec![0, 1, 2, 3]],
    );
    let name = transfer_by_nearest_vertex(&source, &mut dest, &TransferOptions::new("Smile_dN")).unwrap();
    assert_eq!(name, "Smile_dN");
    let (domain, transferred) = dest.read_values::<[f32; 3]>("Smile_dN").unwrap();
    assert_eq!(domain, AttributeDomain::Vertex);
    for (dest_vertex, source_vertex) in picks.iter().enumerate() {
        assert_eq!(transferred[dest_vertex], values[*source_vertex]);
    }
}

#[test]
fn nearest_vertex_works_in_world_space() {
    let source = make_grid([2.0, 2.0], [1, 1]);
    let values: Vec<[f32; 3]> = (0..4).map(|i| [i as f32, 0.0, 0.0]).collect();
    let source = with_vectors(source, "OriginalNormals", AttributeDomain::Vertex, values.clone());

    let mut dest = source.clone();
    dest.attributes = Default::default();
    for position in &mut dest.positions {
        position[0] -= 5.0;
    }
    dest.world_transform = Some(Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)).to_cols_array());
    transfer(&source, &mut dest, TransferMethod::NearestVertex, &TransferOptions::default()).unwrap();
    assert_eq!(dest.read_values::<[f32; 3]>("OriginalNormals").unwrap().1, values);
}

#[test]
fn surface_transfer_interpolates_triangle_exactly() {
    let triangle = Mesh::with_positions_indices(
        vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]],
        vec![0, 1, 2],
    );
    let corner_values = vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    let source = with_vectors(triangle, "Smile_dN", AttributeDomain::Corner, corner_values.clone());

    let bary = [0.2, 0.3, 0.5];
    let on_surface = Vec3::new(2.0 * bary[1], 2.0 * bary[2], 0.0);
    let mut dest = Mesh::from_polygons(vec![(on_surface + Vec3::Z * 0.7).to_array()], &[]);

    let correspondence = nearest_surface_correspondence(&source, &dest).unwrap();
    let total: f32 = correspondence.samples[0].iter().map(|(_, w)| w).sum();
    assert!((total - 1.0).abs() < 1.0e-5);

    transfer_by_nearest_surface(&source, &mut dest, &TransferOptions::new("Smile_dN")).unwrap();
    let (domain, values) = dest.read_values::<[f32; 3]>("Smile_dN").unwrap();
    assert_eq!(domain, AttributeDomain::Vertex);
    assert_close(values[0], bary, 1.0e-5);
}

#[test]
fn surface_transfer_is_linear_across_quads() {
    let source = make_grid([4.0, 4.0], [2, 2]);
    let positions = source.positions.clone();
    let source = with_vectors(source, "OriginalNormals", AttributeDomain::Vertex, positions);

    let mut dest = make_grid([3.0, 3.0], [3, 3]);
    for position in &mut dest.positions {
        position[1] = 0.25;
    }
    transfer(&source, &mut dest, TransferMethod::NearestSurface, &TransferOptions::default()).unwrap();
    let (_, values) = dest.read_values::<[f32; 3]>("OriginalNormals").unwrap();
    for (value, position) in values.iter().zip(&dest.positions) {
        assert_close(*value, [position[0], 0.0, position[2]], 1.0e-4);
    }
}

#[test]
fn surface_transfer_needs_faces() {
    let source = with_vectors(
        Mesh::from_polygons(vec![[0.0; 3]], &[]),
        "OriginalNormals",
        AttributeDomain::Vertex,
        vec![[0.0; 3]],
    );
    let mut dest = make_grid([1.0, 1.0], [1, 1]);
    let err = transfer_by_nearest_surface(&source, &mut dest, &TransferOptions::default()).unwrap_err();
    assert_eq!(err, EditError::EmptySource("faces"));
    assert!(!dest.has_attribute("OriginalNormals"));
}

fn retarget_pair() -> (Mesh, Mesh) {
    let source = make_grid([1.0, 1.0], [1, 1]);
    let source = with_vectors(source, "OriginalNormals", AttributeDomain::Corner, vec![[0.0, 1.0, 0.0]; 4]);
    let source = with_vectors(source, "Smile_dN", AttributeDomain::Corner, vec![[0.1, 0.0, 0.0]; 4]);
    let dest = make_grid([1.0, 1.0], [1, 1]);
    let dest = with_vectors(dest, "OriginalNormals", AttributeDomain::Vertex, vec![[1.0, 0.0, 0.0]; 4]);
    (source, dest)
}

#[test]
fn retargeting_reexpresses_delta_against_destination() {
    let (source, mut dest) = retarget_pair();
    let options = TransferOptions {
        source_attribute: "Smile_dN".to_string(),
        dest_attribute: Some("Blink_dN".to_string()),
        retargeting: Retargeting {
            source: ReferenceNormals::OriginalNormals,
            dest: Some(ReferenceNormals::OriginalNormals),
        },
        masking: Masking::Unmasked,
    };
    transfer_by_topology(&source, &mut dest, &options).unwrap();
    for value in dest.read_values::<[f32; 3]>("Blink_dN").unwrap().1 {
        assert_close(value, [-0.9, 1.0, 0.0], 1.0e-6);
    }

    let options = TransferOptions {
        retargeting: Retargeting {
            source: ReferenceNormals::OriginalNormals,
            dest: Some(ReferenceNormals::CurrentNormals),
        },
        ..options
    };
    transfer_by_topology(&source, &mut dest, &options).unwrap();
    for value in dest.read_values::<[f32; 3]>("Blink_dN").unwrap().1 {
        assert_close(value, [0.1, 0.0, 0.0], 1.0e-6);
    }
}

#[test]
fn original_normals_and_copy_mode_skip_retargeting() {
    let (source, mut dest) = retarget_pair();
    let copy = TransferOptions::new("Smile_dN");
    transfer_by_topology(&source, &mut dest, &copy).unwrap();
    assert_eq!(dest.read_values::<[f32; 3]>("Smile_dN").unwrap().1, vec![[0.1, 0.0, 0.0]; 4]);

    let options = TransferOptions {
        retargeting: Retargeting {
            source: ReferenceNormals::CurrentNormals,
            dest: Some(ReferenceNormals::OriginalNormals),
        },
        ..TransferOptions::default()
    };
    transfer_by_topology(&source, &mut dest, &options).unwrap();
    assert_eq!(
        dest.read_values::<[f32; 3]>("OriginalNormals").unwrap().1,
        vec![[0.0, 1.0, 0.0]; 4]
    );
}

#[test]
fn transfer_masks_against_existing_destination_attribute() {
    let source = make_grid([1.0, 1.0], [1, 1]);
    let source = with_vectors(source, "Smile_dN", AttributeDomain::Vertex, vec![[1.0, 0.0, 0.0]; 4]);
    let mut dest = make_grid([1.0, 1.0], [1, 1]);
    dest.vertex_groups
        .insert("Mouth".to_string(), VertexGroup::from_weights([(0, 1.0), (1, 0.5)]));
    dest.add_attribute("Smile_dN", AttributeType::Vec3, AttributeDomain::Vertex);
    let options = TransferOptions {
        masking: Masking::RestrictTo("Mouth".to_string()),
        ..TransferOptions::new("Smile_dN")
    };
    transfer_by_nearest_vertex(&source, &mut dest, &options).unwrap();
    let (_, values) = dest.read_values::<[f32; 3]>("Smile_dN").unwrap();
    assert_eq!(values[0], [1.0, 0.0, 0.0]);
    assert_eq!(values[1], [0.5, 0.0, 0.0]);
    assert_eq!(values[2], [0.0, 0.0, 0.0]);
    assert_eq!(values[3], [0.0, 0.0, 0.0]);
}

#[test]
fn colour_attributes_transfer_without_retargeting() {
    let mut source = make_grid([1.0, 1.0], [1, 1]);
    source
        .replace_attribute(
            "Smile_NtoC",
            AttributeDomain::Corner,
            AttributeStorage::Color4(vec![[0.25, 0.5, 0.75, 1.0]; 4]),
        )
        .unwrap();
    let mut dest = make_grid([1.0, 1.0], [1, 1]);
    let options = TransferOptions {
        retargeting: Retargeting {
            source: ReferenceNormals::CurrentNormals,
            dest: Some(ReferenceNormals::CurrentNormals),
        },
        ..TransferOptions::new("Smile_NtoC")
    };
    transfer_by_nearest_vertex(&source, &mut dest, &options).unwrap();
    let (domain, values) = dest.read_values::<[f32; 4]>("Smile_NtoC").unwrap();
    assert_eq!(domain, AttributeDomain::Vertex);
    assert_eq!(values, vec![[0.25, 0.5, 0.75, 1.0]; 4]);
}

#[test]
fn nearest_vertex_retargets_against_averaged_current_normals() {
    let source = make_grid([2.0, 1.0], [2, 1]);
    let source = with_vectors(source, "OriginalNormals", AttributeDomain::Corner, vec![[0.0, 1.0, 0.0]; 8]);
    let source = with_vectors(source, "Smile_dN", AttributeDomain::Corner, vec![[0.1, 0.0, 0.0]; 8]);

    let mut dest = make_grid([2.0, 1.0], [2, 1]);
    let mut live = vec![[0.0; 3]; dest.corner_count()];
    for corner in dest.face_corners(0) {
        live[corner] = [1.0, 0.0, 0.0];
    }
    for corner in dest.face_corners(1) {
        live[corner] = [0.0, 0.0, 1.0];
    }
    dest.custom_normals = Some(live.clone());

    let options = TransferOptions {
        retargeting: Retargeting {
            source: ReferenceNormals::OriginalNormals,
            dest: Some(ReferenceNormals::CurrentNormals),
        },
        ..TransferOptions::new("Smile_dN")
    };
    transfer_by_nearest_vertex(&source, &mut dest, &options).unwrap();
    let (domain, values) = dest.read_values::<[f32; 3]>("Smile_dN").unwrap();
    assert_eq!(domain, AttributeDomain::Vertex);
    for (vertex, value) in values.iter().enumerate() {
        let fan: Vec<Vec3> = (0..dest.corner_count())
            .filter(|corner| dest.corner_verts[*corner] as usize == vertex)
            .map(|corner| Vec3::from(live[corner]))
            .collect();
        let average = fan.iter().sum::<Vec3>() / fan.len() as f32;
        let expected = Vec3::new(0.1, 1.0, 0.0) - average;
        assert_close(*value, expected.to_array(), 1.0e-5);
    }
}

#[test]
fn nearest_surface_retargets_from_corner_to_vertex_references() {
    let triangle = Mesh::with_positions_indices(
        vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]],
        vec![0, 1, 2],
    );
    let source = with_vectors(
        triangle,
        "OriginalNormals",
        AttributeDomain::Vertex,
        vec![[0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]],
    );
    let source = with_vectors(
        source,
        "Smile_dN",
        AttributeDomain::Corner,
        vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    );

    let bary = [0.2, 0.3, 0.5];
    let point = Vec3::new(2.0 * bary[1], 2.0 * bary[2], 0.4);
    let dest = Mesh::from_polygons(vec![point.to_array()], &[]);
    let mut dest = with_vectors(dest, "OriginalNormals", AttributeDomain::Vertex, vec![[1.0, 0.0, 0.0]]);

    let options = TransferOptions {
        retargeting: Retargeting {
            source: ReferenceNormals::OriginalNormals,
            dest: Some(ReferenceNormals::OriginalNormals),
        },
        ..TransferOptions::new("Smile_dN")
    };
    transfer_by_nearest_surface(&source, &mut dest, &options).unwrap();
    let (domain, values) = dest.read_values::<[f32; 3]>("Smile_dN").unwrap();
    assert_eq!(domain, AttributeDomain::Vertex);
    assert_close(values[0], [-0.3, 0.5, 0.8], 1.0e-5);
}

#[test]
fn missing_group_is_reported_for_new_destination_attribute() {
    let source = make_grid([1.0, 1.0], [1, 1]);
    let source = with_vectors(source, "Smile_dN", AttributeDomain::Vertex, vec![[1.0, 0.0, 0.0]; 4]);
    let mut dest = make_grid([1.0, 1.0], [1, 1]);
    let options = TransferOptions {
        masking: Masking::RestrictTo("Mouth".to_string()),
        ..TransferOptions::new("Smile_dN")
    };
    let err = transfer_by_nearest_vertex(&source, &mut dest, &options).unwrap_err();
    assert_eq!(err, EditError::MissingVertexGroup("Mouth".to_string()));
    assert!(!dest.has_attribute("Smile_dN"));
}
