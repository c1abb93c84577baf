use std::cell::OnceCell;

use anyhow::Result;
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use super::car::{CarRig, GpuCar};
use super::geometry::{append_cylinder, append_plane, append_sphere, CpuMesh};
use super::material::{
    object_layout, FrameBindGroup, FrameLighting, FrameUniform, MaterialBindGroup, ObjectUniform,
    SkyParams, SkyUniform,
};
use super::model_loader::ModelData;
use super::pipeline::{create_scene_pipeline, DepthTexture};
use super::sky_pass::SkyPass;
use super::texture::{GpuTexture, RgbaImage};
use crate::scene_core::layout::{
    celestial_start_color, ground_transform, ground_uv, road_uv, UvTransform, CELESTIAL_RADIUS,
    CELESTIAL_SEGMENTS, CELESTIAL_START, GROUND_SIZE, ROAD_ORIGIN, ROAD_SIZE,
};
use crate::scene_core::trees::{
    canopy_color, trunk_color, TreeInstance, CANOPY_SEGMENTS, CANOPY_TIERS, TRUNK_RADIUS,
    TRUNK_SEGMENTS,
};

pub struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

pub fn upload_mesh(device: &wgpu::Device, mesh: &CpuMesh, label: &str) -> Option<GpuMesh> {
    if mesh.indices.is_empty() {
        return None;
    }

    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{label}-vertex-buffer")),
        contents: bytemuck::cast_slice(mesh.vertices.as_slice()),
        usage: wgpu::BufferUsages::VERTEX,
    });

    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{label}-index-buffer")),
        contents: bytemuck::cast_slice(mesh.indices.as_slice()),
        usage: wgpu::BufferUsages::INDEX,
    });

    Some(GpuMesh {
        vertex_buffer,
        index_buffer,
        index_count: mesh.indices.len() as u32,
    })
}

/// A mesh with its own transform and material.
struct SceneObject {
    mesh: GpuMesh,
    material: MaterialBindGroup,
    _texture: Option<GpuTexture>,
}

impl SceneObject {
    fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_bind_group(1, &self.material.bind_group, &[]);
        self.mesh.draw(pass);
    }
}

/// Flat textured plane lying on the ground at `origin`.
pub fn build_ground_plane(size: glam::Vec2, origin: Vec3, uv: &UvTransform) -> CpuMesh {
    let mut mesh = CpuMesh::default();
    append_plane(
        &mut mesh.vertices,
        &mut mesh.indices,
        size,
        ground_transform(origin),
        uv,
        Vec3::ONE,
    );
    mesh
}

/// All trees baked into one vertex-colored mesh.
pub fn build_tree_mesh(trees: &[TreeInstance]) -> CpuMesh {
    let mut mesh = CpuMesh::default();
    let (trunk, canopy) = (trunk_color(), canopy_color());

    for tree in trees {
        append_cylinder(
            &mut mesh.vertices,
            &mut mesh.indices,
            TRUNK_RADIUS,
            TRUNK_RADIUS,
            tree.trunk_height,
            TRUNK_SEGMENTS,
            Mat4::from_translation(tree.trunk_center()),
            trunk,
        );
        for tier in &CANOPY_TIERS {
            append_cylinder(
                &mut mesh.vertices,
                &mut mesh.indices,
                0.0,
                tier.radius,
                tier.height,
                CANOPY_SEGMENTS,
                Mat4::from_translation(tree.canopy_center(tier)),
                canopy,
            );
        }
    }
    mesh
}

pub struct SceneRenderer {
    frame_bg: FrameBindGroup,
    object_layout: wgpu::BindGroupLayout,
    pipeline: wgpu::RenderPipeline,
    depth: DepthTexture,
    white: GpuTexture,
    sky: SkyPass,
    celestial: Option<SceneObject>,
    ground: Option<SceneObject>,
    road: Option<SceneObject>,
    trees: Option<SceneObject>,
    car: OnceCell<GpuCar>,
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &wgpu::SurfaceConfiguration,
    ) -> Self {
        let frame_bg = FrameBindGroup::new(device);
        let object_layout = object_layout(device);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("scene-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene-pipeline-layout"),
            bind_group_layouts: &[&frame_bg.layout, &object_layout],
            push_constant_ranges: &[],
        });
        let pipeline =
            create_scene_pipeline(device, config, &pipeline_layout, &shader, "scene-pipeline");

        let white = GpuTexture::white(device, queue);

        let mut sphere = CpuMesh::default();
        append_sphere(
            &mut sphere.vertices,
            &mut sphere.indices,
            CELESTIAL_RADIUS,
            CELESTIAL_SEGMENTS,
            CELESTIAL_SEGMENTS,
            Mat4::IDENTITY,
            Vec3::ONE,
        );
        let (color, emissive) = celestial_start_color();
        let celestial = upload_mesh(device, &sphere, "celestial").map(|mesh| SceneObject {
            mesh,
            material: MaterialBindGroup::new(
                device,
                &object_layout,
                &white,
                &ObjectUniform::new(Mat4::from_translation(CELESTIAL_START), color, emissive),
                "celestial",
            ),
            _texture: None,
        });

        Self {
            frame_bg,
            object_layout,
            pipeline,
            depth: DepthTexture::new(device, config, "scene-depth"),
            sky: SkyPass::new(device, queue, config),
            white,
            celestial,
            ground: None,
            road: None,
            trees: None,
            car: OnceCell::new(),
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) {
        self.depth = DepthTexture::new(device, config, "scene-depth");
    }

    fn textured_object(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        mesh: &CpuMesh,
        image: &RgbaImage,
        label: &str,
    ) -> Result<Option<SceneObject>> {
        let texture = GpuTexture::from_image(device, queue, image, label)?;
        let material = MaterialBindGroup::new(
            device,
            &self.object_layout,
            &texture,
            &ObjectUniform::new(Mat4::IDENTITY, Vec3::ONE, Vec3::ZERO),
            label,
        );
        Ok(upload_mesh(device, mesh, label).map(|mesh| SceneObject {
            mesh,
            material,
            _texture: Some(texture),
        }))
    }

    pub fn set_ground(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
    ) -> Result<()> {
        let mesh = build_ground_plane(GROUND_SIZE, Vec3::ZERO, &ground_uv());
        self.ground = self.textured_object(device, queue, &mesh, image, "ground")?;
        Ok(())
    }

    pub fn set_road(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        image: &RgbaImage,
    ) -> Result<()> {
        let mesh = build_ground_plane(ROAD_SIZE, ROAD_ORIGIN, &road_uv());
        self.road = self.textured_object(device, queue, &mesh, image, "road")?;
        Ok(())
    }

    pub fn plant_trees(&mut self, device: &wgpu::Device, trees: &[TreeInstance]) {
        let mesh = build_tree_mesh(trees);
        self.trees = upload_mesh(device, &mesh, "trees").map(|mesh| SceneObject {
            mesh,
            material: MaterialBindGroup::new(
                device,
                &self.object_layout,
                &self.white,
                &ObjectUniform::new(Mat4::IDENTITY, Vec3::ONE, Vec3::ZERO),
                "trees",
            ),
            _texture: None,
        });
    }

    pub fn set_sky(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: &[RgbaImage; 6],
    ) -> Result<()> {
        self.sky.set_faces(device, queue, faces)
    }

    /// Install the car. Returns false if a car is already present.
    pub fn set_car(&self, device: &wgpu::Device, queue: &wgpu::Queue, model: ModelData) -> bool {
        if self.car.get().is_some() {
            return false;
        }
        let car = GpuCar::upload(
            device,
            queue,
            &self.object_layout,
            &self.white,
            CarRig::new(model),
        );
        self.car.set(car).is_ok()
    }

    pub fn car(&self) -> Option<&GpuCar> {
        self.car.get()
    }

    pub fn update_frame(&self, queue: &wgpu::Queue, view_proj: Mat4, lighting: &FrameLighting) {
        self.frame_bg
            .update(queue, &FrameUniform::new(view_proj, lighting));
    }

    pub fn update_celestial(
        &self,
        queue: &wgpu::Queue,
        position: Vec3,
        color: Vec3,
        emissive: Vec3,
    ) {
        if let Some(celestial) = &self.celestial {
            celestial.material.update(
                queue,
                &ObjectUniform::new(Mat4::from_translation(position), color, emissive),
            );
        }
    }

    pub fn update_sky(&self, queue: &wgpu::Queue, inv_view_proj: Mat4, params: &SkyParams) {
        self.sky.update(queue, &SkyUniform::new(inv_view_proj, params));
    }

    pub fn update_car(&self, queue: &wgpu::Queue, wheel_spin: f32) {
        if let Some(car) = self.car.get() {
            car.update(queue, wheel_spin);
        }
    }

    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        self.sky.render(pass);

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.frame_bg.bind_group, &[]);

        let objects = [&self.ground, &self.road, &self.trees, &self.celestial];
        for object in objects.into_iter().flatten() {
            object.render(pass);
        }
        if let Some(car) = self.car.get() {
            car.render(pass);
        }
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth.view
    }
}
