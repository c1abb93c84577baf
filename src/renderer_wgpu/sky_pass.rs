use anyhow::Result;
use glam::Mat4;
use wgpu::util::DeviceExt;

use super::material::{sky_layout, SkyParams, SkyUniform};
use super::pipeline::create_sky_pipeline;
use super::texture::{GpuTexture, RgbaImage};
use crate::scene_core::sky::SkyPalette;

/// Environment cube tinted by the day/night sky color, drawn behind the scene.
pub struct SkyPass {
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    cube: GpuTexture,
}

impl SkyPass {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        config: &wgpu::SurfaceConfiguration,
    ) -> Self {
        let layout = sky_layout(device);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sky-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/sky.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sky-pipeline-layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let pipeline =
            create_sky_pipeline(device, config, &pipeline_layout, &shader, "sky-pipeline");

        let palette = SkyPalette::default();
        let initial = SkyUniform::new(
            Mat4::IDENTITY,
            &SkyParams {
                day: palette.day,
                night: palette.night,
                dawn_dusk: palette.dawn_dusk,
                brightness: 1.0,
                time_of_day: 0.5,
            },
        );
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sky-uniform-buffer"),
            contents: bytemuck::cast_slice(&[initial]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let cube = GpuTexture::white_cube(device, queue);
        let bind_group = create_bind_group(device, &layout, &buffer, &cube);

        Self {
            pipeline,
            layout,
            buffer,
            bind_group,
            cube,
        }
    }

    pub fn set_faces(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: &[RgbaImage; 6],
    ) -> Result<()> {
        self.cube = GpuTexture::cube_from_faces(device, queue, faces, "sky-cube")?;
        self.bind_group = create_bind_group(device, &self.layout, &self.buffer, &self.cube);
        Ok(())
    }

    pub fn update(&self, queue: &wgpu::Queue, uniform: &SkyUniform) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[*uniform]));
    }

    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
    cube: &GpuTexture,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("sky-bind-group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&cube.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&cube.sampler),
            },
        ],
    })
}
