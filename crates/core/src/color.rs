// Out-of-range components are passed through unclamped.
pub fn normal_to_color(normal: [f32; 3]) -> [f32; 4] {
    [
        (normal[0] + 1.0) * 0.5,
        (normal[1] + 1.0) * 0.5,
        (normal[2] + 1.0) * 0.5,
        1.0,
    ]
}

pub fn normals_to_colors(normals: &[[f32; 3]]) -> Vec<[f32; 4]> {
    let mut colors = vec![[0.0; 4]; normals.len()];
    crate::parallel::for_each_indexed_mut(&mut colors, |index, color| {
        *color = normal_to_color(normals[index]);
    });
    colors
}
