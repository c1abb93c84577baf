use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec2, Vec3};

use crate::scene_core::layout::UvTransform;

#[repr(C)]
#[derive(Clone, Copy, Debug, Zeroable, Pod)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 4] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x3, 3 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[derive(Default)]
pub struct CpuMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

fn push_vertex(
    vertices: &mut Vec<Vertex>,
    transform: &Mat4,
    normal_matrix: &Mat3,
    position: Vec3,
    normal: Vec3,
    color: Vec3,
    uv: Vec2,
) -> u32 {
    let index = vertices.len() as u32;
    let p = transform.transform_point3(position);
    let n = (*normal_matrix * normal).normalize_or_zero();
    vertices.push(Vertex {
        position: p.to_array(),
        normal: n.to_array(),
        color: color.to_array(),
        uv: uv.to_array(),
    });
    index
}

fn normal_matrix(transform: &Mat4) -> Mat3 {
    Mat3::from_mat4(*transform).inverse().transpose()
}

/// A single-quad plane of `size` in the local XY plane facing +Z.
///
/// UVs start at the bottom-left corner, go through `uv_transform`, and are
/// flipped vertically for top-left texture origin.
pub fn append_plane(
    vertices: &mut Vec<Vertex>,
    indices: &mut Vec<u32>,
    size: Vec2,
    transform: Mat4,
    uv_transform: &UvTransform,
    color: Vec3,
) {
    let nm = normal_matrix(&transform);
    let half = size * 0.5;
    let mut corner = [0u32; 4];

    // row-major from the top edge: top-left, top-right, bottom-left, bottom-right
    for (i, (ix, iy)) in [(0, 0), (1, 0), (0, 1), (1, 1)].into_iter().enumerate() {
        let x = ix as f32 * size.x - half.x;
        let y = half.y - iy as f32 * size.y;
        let uv = uv_transform.apply(Vec2::new(ix as f32, 1.0 - iy as f32));
        corner[i] = push_vertex(
            vertices,
            &transform,
            &nm,
            Vec3::new(x, y, 0.0),
            Vec3::Z,
            color,
            Vec2::new(uv.x, 1.0 - uv.y),
        );
    }

    let [a, d, b, c] = corner;
    indices.extend_from_slice(&[a, b, d, b, c, d]);
}

/// Closed cylinder (or cone when `radius_top` is zero) centered on the
/// local origin, `height` along Y.
pub fn append_cylinder(
    vertices: &mut Vec<Vertex>,
    indices: &mut Vec<u32>,
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    radial_segments: u32,
    transform: Mat4,
    color: Vec3,
) {
    let nm = normal_matrix(&transform);
    let segments = radial_segments.max(3);
    let half_height = height * 0.5;
    let slope = (radius_bottom - radius_top) / height;

    let mut rows = [Vec::new(), Vec::new()];
    for (row, (radius, y, v)) in [
        (radius_top, half_height, 1.0),
        (radius_bottom, -half_height, 0.0),
    ]
    .into_iter()
    .enumerate()
    {
        for x in 0..=segments {
            let u = x as f32 / segments as f32;
            let theta = u * TAU;
            let (sin, cos) = theta.sin_cos();
            let normal = Vec3::new(sin, slope, cos);
            let index = push_vertex(
                vertices,
                &transform,
                &nm,
                Vec3::new(radius * sin, y, radius * cos),
                normal,
                color,
                Vec2::new(u, 1.0 - v),
            );
            rows[row].push(index);
        }
    }

    for x in 0..segments as usize {
        let a = rows[0][x];
        let b = rows[1][x];
        let c = rows[1][x + 1];
        let d = rows[0][x + 1];
        indices.extend_from_slice(&[a, b, d, b, c, d]);
    }

    if radius_top > 0.0 {
        append_cap(vertices, indices, &transform, &nm, radius_top, half_height, segments, color);
    }
    if radius_bottom > 0.0 {
        append_cap(
            vertices,
            indices,
            &transform,
            &nm,
            radius_bottom,
            -half_height,
            segments,
            color,
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn append_cap(
    vertices: &mut Vec<Vertex>,
    indices: &mut Vec<u32>,
    transform: &Mat4,
    nm: &Mat3,
    radius: f32,
    y: f32,
    segments: u32,
    color: Vec3,
) {
    let top = y > 0.0;
    let normal = if top { Vec3::Y } else { Vec3::NEG_Y };
    let center = push_vertex(
        vertices,
        transform,
        nm,
        Vec3::new(0.0, y, 0.0),
        normal,
        color,
        Vec2::splat(0.5),
    );

    let ring: Vec<u32> = (0..=segments)
        .map(|x| {
            let theta = x as f32 / segments as f32 * TAU;
            let (sin, cos) = theta.sin_cos();
            push_vertex(
                vertices,
                transform,
                nm,
                Vec3::new(radius * sin, y, radius * cos),
                normal,
                color,
                Vec2::new(cos * 0.5 + 0.5, sin * 0.5 + 0.5),
            )
        })
        .collect();

    for pair in ring.windows(2) {
        if top {
            indices.extend_from_slice(&[pair[0], pair[1], center]);
        } else {
            indices.extend_from_slice(&[pair[1], pair[0], center]);
        }
    }
}

/// UV sphere centered on the local origin.
pub fn append_sphere(
    vertices: &mut Vec<Vertex>,
    indices: &mut Vec<u32>,
    radius: f32,
    width_segments: u32,
    height_segments: u32,
    transform: Mat4,
    color: Vec3,
) {
    let nm = normal_matrix(&transform);
    let ws = width_segments.max(3);
    let hs = height_segments.max(2);

    let mut grid = Vec::with_capacity(hs as usize + 1);
    for iy in 0..=hs {
        let v = iy as f32 / hs as f32;
        let row: Vec<u32> = (0..=ws)
            .map(|ix| {
                let u = ix as f32 / ws as f32;
                let direction = Vec3::new(
                    -(u * TAU).cos() * (v * PI).sin(),
                    (v * PI).cos(),
                    (u * TAU).sin() * (v * PI).sin(),
                );
                push_vertex(
                    vertices,
                    &transform,
                    &nm,
                    direction * radius,
                    direction,
                    color,
                    Vec2::new(u, v),
                )
            })
            .collect();
        grid.push(row);
    }

    for iy in 0..hs as usize {
        for ix in 0..ws as usize {
            let a = grid[iy][ix + 1];
            let b = grid[iy][ix];
            let c = grid[iy + 1][ix];
            let d = grid[iy + 1][ix + 1];
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != hs as usize - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
}
