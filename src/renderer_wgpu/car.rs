use glam::{EulerRot, Mat4, Quat, Vec3};

use super::geometry::CpuMesh;
use super::material::{MaterialBindGroup, ObjectUniform};
use super::model_loader::ModelData;
use super::scene::{upload_mesh, GpuMesh};
use super::texture::GpuTexture;
use crate::scene_core::layout::{
    vehicle_lights, PointLightSpec, VehicleLightKind, SUBJECT_ELEVATION, WHEEL_NODES,
};

/// Node hierarchy and animation state of the car, independent of the GPU.
pub struct CarRig {
    model: ModelData,
    /// Euler XYZ angles of each node's rest rotation.
    rest_euler: Vec<Vec3>,
    wheels: Vec<usize>,
}

impl CarRig {
    pub fn new(mut model: ModelData) -> Self {
        if let Some(root) = model.nodes.first_mut() {
            root.translation.y = SUBJECT_ELEVATION;
        }

        let rest_euler = model
            .nodes
            .iter()
            .map(|node| {
                let (x, y, z) = node.rotation.to_euler(EulerRot::XYZ);
                Vec3::new(x, y, z)
            })
            .collect();

        let wheels = WHEEL_NODES
            .iter()
            .filter_map(|name| {
                let found = model.find_node(name);
                if found.is_none() {
                    log::warn!("car model has no {name} node, it will not spin");
                }
                found
            })
            .collect();

        Self {
            model,
            rest_euler,
            wheels,
        }
    }

    pub fn model(&self) -> &ModelData {
        &self.model
    }

    pub fn wheel_count(&self) -> usize {
        self.wheels.len()
    }

    /// World position of the root node.
    pub fn subject_position(&self) -> Vec3 {
        self.model
            .nodes
            .first()
            .map_or(Vec3::ZERO, |root| root.translation)
    }

    fn root_transform(&self) -> Mat4 {
        self.model
            .nodes
            .first()
            .map_or(Mat4::IDENTITY, |root| root.local_transform())
    }

    /// World transform of every node with the wheels turned `wheel_spin`
    /// radians past rest about their local X axis.
    pub fn node_transforms(&self, wheel_spin: f32) -> Vec<Mat4> {
        let mut locals: Vec<Mat4> = self
            .model
            .nodes
            .iter()
            .map(|node| node.local_transform())
            .collect();

        for &wheel in &self.wheels {
            let node = &self.model.nodes[wheel];
            let rest = self.rest_euler[wheel];
            let rotation = Quat::from_euler(EulerRot::XYZ, rest.x + wheel_spin, rest.y, rest.z);
            locals[wheel] =
                Mat4::from_scale_rotation_translation(node.scale, rotation, node.translation);
        }

        self.model.world_transforms(Mat4::IDENTITY, &locals)
    }

    /// Vehicle lights carried along with the car, at the given intensities.
    pub fn lights(
        &self,
        headlight_intensity: f32,
        taillight_intensity: f32,
    ) -> Vec<PointLightSpec> {
        let root = self.root_transform();
        vehicle_lights()
            .into_iter()
            .map(|(kind, light)| PointLightSpec {
                position: root.transform_point3(light.position),
                intensity: match kind {
                    VehicleLightKind::Headlight => headlight_intensity,
                    VehicleLightKind::Taillight => taillight_intensity,
                },
                ..light
            })
            .collect()
    }
}

struct CarDraw {
    node: usize,
    mesh: GpuMesh,
    material: MaterialBindGroup,
    base_color: Vec3,
    emissive: Vec3,
}

pub struct GpuCar {
    rig: CarRig,
    draws: Vec<CarDraw>,
    _textures: Vec<Option<GpuTexture>>,
}

impl GpuCar {
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        white: &GpuTexture,
        rig: CarRig,
    ) -> Self {
        let model = rig.model();
        let textures: Vec<Option<GpuTexture>> = model
            .images
            .iter()
            .enumerate()
            .map(|(i, image)| {
                match GpuTexture::from_image(device, queue, image, &format!("car-image-{i}")) {
                    Ok(texture) => Some(texture),
                    Err(e) => {
                        log::warn!("car image {i} unusable, rendering untextured: {e:#}");
                        None
                    }
                }
            })
            .collect();

        let transforms = rig.node_transforms(0.0);
        let mut draws = Vec::new();
        for (node_index, node) in model.nodes.iter().enumerate() {
            for &p in &node.primitives {
                let primitive = &model.primitives[p];
                let cpu = CpuMesh {
                    vertices: primitive.vertices.clone(),
                    indices: primitive.indices.clone(),
                };
                let label = format!("car-node-{node_index}-prim-{p}");
                let Some(mesh) = upload_mesh(device, &cpu, &label) else {
                    continue;
                };
                let texture = primitive
                    .texture
                    .and_then(|t| textures.get(t))
                    .and_then(Option::as_ref)
                    .unwrap_or(white);
                let material = MaterialBindGroup::new(
                    device,
                    layout,
                    texture,
                    &ObjectUniform::new(
                        transforms[node_index],
                        primitive.base_color,
                        primitive.emissive,
                    ),
                    &label,
                );
                draws.push(CarDraw {
                    node: node_index,
                    mesh,
                    material,
                    base_color: primitive.base_color,
                    emissive: primitive.emissive,
                });
            }
        }

        log::info!(
            "car uploaded: {} nodes, {} draws, {} wheels",
            model.nodes.len(),
            draws.len(),
            rig.wheel_count()
        );

        Self {
            rig,
            draws,
            _textures: textures,
        }
    }

    pub fn rig(&self) -> &CarRig {
        &self.rig
    }

    pub fn update(&self, queue: &wgpu::Queue, wheel_spin: f32) {
        let transforms = self.rig.node_transforms(wheel_spin);
        for draw in &self.draws {
            draw.material.update(
                queue,
                &ObjectUniform::new(transforms[draw.node], draw.base_color, draw.emissive),
            );
        }
    }

    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        for draw in &self.draws {
            pass.set_bind_group(1, &draw.material.bind_group, &[]);
            draw.mesh.draw(pass);
        }
    }
}
