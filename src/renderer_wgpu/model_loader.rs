use anyhow::{anyhow, bail, ensure, Context, Result};
use glam::{Mat4, Quat, Vec3};

use super::geometry::Vertex;
use super::texture::RgbaImage;

/// One node of the imported subject, stored parent-before-child.
#[derive(Debug, Clone)]
pub struct ModelNode {
    pub name: Option<String>,
    pub parent: Option<usize>,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    /// Indices into `ModelData::primitives`.
    pub primitives: Vec<usize>,
}

impl ModelNode {
    pub fn local_transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

#[derive(Debug, Clone)]
pub struct ModelPrimitive {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub base_color: Vec3,
    pub emissive: Vec3,
    /// Index into `ModelData::images`.
    pub texture: Option<usize>,
}

/// CPU side of a glTF subject: the first root node of the default scene and
/// everything under it.
#[derive(Debug, Clone, Default)]
pub struct ModelData {
    pub nodes: Vec<ModelNode>,
    pub primitives: Vec<ModelPrimitive>,
    pub images: Vec<RgbaImage>,
}

impl ModelData {
    pub fn find_node(&self, name: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|node| node.name.as_deref() == Some(name))
    }

    /// World transforms for every node, given each node's local transform.
    pub fn world_transforms(&self, root: Mat4, locals: &[Mat4]) -> Vec<Mat4> {
        let mut world = Vec::with_capacity(self.nodes.len());
        for (node, local) in self.nodes.iter().zip(locals) {
            let parent = node.parent.map_or(root, |p| world[p]);
            world.push(parent * *local);
        }
        world
    }
}

/// Parse a glTF or GLB document whose buffers and images are embedded.
pub fn load_model_bytes(bytes: &[u8]) -> Result<ModelData> {
    let (document, buffers, images) =
        gltf::import_slice(bytes).context("failed to parse glTF document")?;
    convert(&document, &buffers, &images)
}

/// Parse a glTF file, resolving external buffers and images beside it.
#[cfg(not(target_arch = "wasm32"))]
pub fn load_model_file(path: &std::path::Path) -> Result<ModelData> {
    let (document, buffers, images) =
        gltf::import(path).with_context(|| format!("failed to import {}", path.display()))?;
    convert(&document, &buffers, &images)
}

fn convert(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    images: &[gltf::image::Data],
) -> Result<ModelData> {
    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .context("glTF contains no scenes")?;
    let root = scene.nodes().next().context("default scene has no nodes")?;

    let mut model = ModelData::default();
    let mut stack = vec![(root, None)];
    while let Some((node, parent)) = stack.pop() {
        let index = model.nodes.len();
        let (translation, rotation, scale) = node.transform().decomposed();

        let mut primitives = Vec::new();
        if let Some(mesh) = node.mesh() {
            for primitive in mesh.primitives() {
                match read_primitive(&primitive, buffers) {
                    Ok(p) => {
                        primitives.push(model.primitives.len());
                        model.primitives.push(p);
                    }
                    Err(e) => log::warn!(
                        "skipping primitive {} of mesh {:?}: {e:#}",
                        primitive.index(),
                        mesh.name()
                    ),
                }
            }
        }

        model.nodes.push(ModelNode {
            name: node.name().map(str::to_owned),
            parent,
            translation: Vec3::from(translation),
            rotation: Quat::from_array(rotation),
            scale: Vec3::from(scale),
            primitives,
        });

        // reversed so children pop in document order
        let children: Vec<_> = node.children().collect();
        stack.extend(children.into_iter().rev().map(|child| (child, Some(index))));
    }

    model.images = images
        .iter()
        .enumerate()
        .map(|(i, image)| {
            to_rgba(image).unwrap_or_else(|e| {
                log::warn!("image {i} unusable, rendering untextured: {e:#}");
                RgbaImage {
                    width: 1,
                    height: 1,
                    pixels: vec![255; 4],
                }
            })
        })
        .collect();

    Ok(model)
}

fn read_primitive(
    primitive: &gltf::Primitive<'_>,
    buffers: &[gltf::buffer::Data],
) -> Result<ModelPrimitive> {
    ensure!(
        primitive.mode() == gltf::mesh::Mode::Triangles,
        "unsupported primitive mode {:?}, expected Triangles",
        primitive.mode()
    );

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));

    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .context("primitive has no POSITION attribute")?
        .collect();
    let vertex_count = positions.len();

    let indices: Vec<u32> = match reader.read_indices() {
        Some(iter) => iter.into_u32().collect(),
        None => (0..vertex_count as u32).collect(),
    };
    ensure!(
        indices.len() % 3 == 0,
        "index count {} is not a multiple of 3",
        indices.len()
    );
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        bail!("index {bad} out of range for {vertex_count} vertices");
    }

    let normals: Vec<[f32; 3]> = match reader.read_normals() {
        Some(iter) => {
            let n: Vec<_> = iter.collect();
            ensure!(
                n.len() == vertex_count,
                "normal count ({}) does not match position count ({vertex_count})",
                n.len()
            );
            n
        }
        None => compute_smooth_normals(&positions, &indices),
    };

    let uvs: Vec<[f32; 2]> = match reader.read_tex_coords(0) {
        Some(iter) => iter.into_f32().collect(),
        None => vec![[0.0, 0.0]; vertex_count],
    };
    ensure!(uvs.len() == vertex_count, "uv count does not match positions");

    let colors: Vec<[f32; 3]> = match reader.read_colors(0) {
        Some(iter) => iter.into_rgb_f32().collect(),
        None => vec![[1.0, 1.0, 1.0]; vertex_count],
    };
    ensure!(colors.len() == vertex_count, "color count does not match positions");

    let vertices = positions
        .iter()
        .zip(&normals)
        .zip(&uvs)
        .zip(&colors)
        .map(|(((position, normal), uv), color)| Vertex {
            position: *position,
            normal: *normal,
            color: *color,
            uv: *uv,
        })
        .collect();

    let material = primitive.material();
    let pbr = material.pbr_metallic_roughness();
    let [r, g, b, _] = pbr.base_color_factor();

    Ok(ModelPrimitive {
        vertices,
        indices,
        base_color: Vec3::new(r, g, b),
        emissive: Vec3::from(material.emissive_factor()),
        texture: pbr
            .base_color_texture()
            .map(|info| info.texture().source().index()),
    })
}

fn to_rgba(image: &gltf::image::Data) -> Result<RgbaImage> {
    use gltf::image::Format;

    let pixels = match image.format {
        Format::R8G8B8A8 => image.pixels.clone(),
        Format::R8G8B8 => image
            .pixels
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        Format::R8G8 => image
            .pixels
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        Format::R8 => image.pixels.iter().flat_map(|&l| [l, l, l, 255]).collect(),
        other => return Err(anyhow!("unsupported pixel format {other:?}")),
    };
    RgbaImage::new(image.width, image.height, pixels)
}

/// Compute per-vertex smooth normals by averaging face normals at each vertex.
///
/// Each face contributes its unit normal to every vertex it touches, then the
/// sums are normalized. Degenerate faces contribute nothing.
pub fn compute_smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let a = Vec3::from(positions[i0]);
        let b = Vec3::from(positions[i1]);
        let c = Vec3::from(positions[i2]);
        let face_normal = (b - a).cross(c - a).normalize_or_zero();
        normals[i0] += face_normal;
        normals[i1] += face_normal;
        normals[i2] += face_normal;
    }

    normals
        .into_iter()
        .map(|n| n.normalize_or_zero().to_array())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Root "car" with a wheel and a body; one unindexed triangle, no normals.
    const CAR_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0, 3] } ],
        "nodes": [
            { "name": "car", "children": [1, 2], "translation": [0, 1, 0] },
            { "name": "wheel_fl", "translation": [1, 0, 0], "mesh": 0 },
            { "name": "body", "scale": [2, 2, 2], "mesh": 0 },
            { "name": "ignored_second_root" }
        ],
        "meshes": [ { "primitives": [ { "attributes": { "POSITION": 0 }, "material": 0 } ] } ],
        "materials": [ {
            "pbrMetallicRoughness": { "baseColorFactor": [0.5, 0.25, 1.0, 1.0] },
            "emissiveFactor": [0.1, 0.0, 0.0]
        } ],
        "accessors": [ {
            "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
            "min": [0, 0, 0], "max": [1, 1, 0]
        } ],
        "bufferViews": [ { "buffer": 0, "byteLength": 36 } ],
        "buffers": [ {
            "byteLength": 36,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA"
        } ]
    }"#;

    #[test]
    fn loads_first_root_subtree_in_document_order() {
        let model = load_model_bytes(CAR_GLTF.as_bytes()).unwrap();
        let names: Vec<_> = model.nodes.iter().map(|n| n.name.as_deref()).collect();
        assert_eq!(names, [Some("car"), Some("wheel_fl"), Some("body")]);
        assert_eq!(model.nodes[0].parent, None);
        assert_eq!(model.nodes[1].parent, Some(0));
        assert_eq!(model.nodes[2].parent, Some(0));
        assert_eq!(model.find_node("wheel_fl"), Some(1));
        assert_eq!(model.find_node("ignored_second_root"), None);
    }

    #[test]
    fn reads_primitives_with_material_and_generated_normals() {
        let model = load_model_bytes(CAR_GLTF.as_bytes()).unwrap();
        assert_eq!(model.primitives.len(), 2);
        assert_eq!(model.nodes[1].primitives, vec![0]);
        assert_eq!(model.nodes[2].primitives, vec![1]);

        let p = &model.primitives[0];
        assert_eq!(p.indices, vec![0, 1, 2]);
        assert_eq!(p.base_color, Vec3::new(0.5, 0.25, 1.0));
        assert_eq!(p.emissive, Vec3::new(0.1, 0.0, 0.0));
        assert_eq!(p.texture, None);
        for v in &p.vertices {
            assert!((v.normal[2] - 1.0).abs() < 1e-5);
            assert_eq!(v.color, [1.0, 1.0, 1.0]);
        }
    }

    #[test]
    fn world_transforms_chain_through_parents() {
        let model = load_model_bytes(CAR_GLTF.as_bytes()).unwrap();
        let locals: Vec<Mat4> = model.nodes.iter().map(ModelNode::local_transform).collect();
        let root = Mat4::from_translation(Vec3::new(0.0, 0.01, 0.0));
        let world = model.world_transforms(root, &locals);

        let wheel = world[1].transform_point3(Vec3::ZERO);
        assert!(wheel.abs_diff_eq(Vec3::new(1.0, 1.01, 0.0), 1e-5));
        let body_corner = world[2].transform_point3(Vec3::X);
        assert!(body_corner.abs_diff_eq(Vec3::new(2.0, 1.01, 0.0), 1e-5));
    }

    #[test]
    fn rejects_non_gltf_bytes() {
        assert!(load_model_bytes(b"definitely not gltf").is_err());
    }

    #[test]
    fn converts_rgb_images_to_rgba() {
        let data = gltf::image::Data {
            pixels: vec![1, 2, 3, 4, 5, 6],
            format: gltf::image::Format::R8G8B8,
            width: 2,
            height: 1,
        };
        let rgba = to_rgba(&data).unwrap();
        assert_eq!(rgba.pixels, vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn smooth_normals_single_triangle() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let normals = compute_smooth_normals(&positions, &[0, 1, 2]);
        assert_eq!(normals.len(), 3);
        for n in &normals {
            assert!(Vec3::from(*n).abs_diff_eq(Vec3::Z, 1e-5));
        }
    }

    #[test]
    fn smooth_normals_shared_edge_stays_unit_length() {
        let positions = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.5, 0.0, -1.0],
        ];
        let normals = compute_smooth_normals(&positions, &[0, 1, 2, 0, 3, 1]);
        for n in &normals {
            assert!((Vec3::from(*n).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn smooth_normals_degenerate_triangle() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
        let normals = compute_smooth_normals(&positions, &[0, 1, 2]);
        for n in &normals {
            assert_eq!(*n, [0.0, 0.0, 0.0]);
        }
    }
}
