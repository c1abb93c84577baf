use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use super::texture::GpuTexture;
use crate::scene_core::layout::PointLightSpec;

/// Pointer light plus two headlights and two taillights.
pub const MAX_POINT_LIGHTS: usize = 5;

#[repr(C)]
#[derive(Clone, Copy, Default, Zeroable, Pod)]
pub struct PointLightUniform {
    /// xyz position, w cutoff distance (0 = unbounded).
    pub position_range: [f32; 4],
    /// rgb premultiplied by intensity, w decay exponent.
    pub color_decay: [f32; 4],
}

impl PointLightUniform {
    pub fn new(light: &PointLightSpec) -> Self {
        let c = light.color * light.intensity;
        Self {
            position_range: [light.position.x, light.position.y, light.position.z, light.distance],
            color_decay: [c.x, c.y, c.z, light.decay],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Zeroable, Pod)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub ambient: [f32; 4],
    /// Directional light origin; it shines toward the world origin.
    pub sun_position: [f32; 4],
    pub sun_color: [f32; 4],
    pub point_count: [u32; 4],
    pub points: [PointLightUniform; MAX_POINT_LIGHTS],
}

/// Everything that lights a frame, in world space.
pub struct FrameLighting {
    pub ambient: Vec3,
    pub sun_position: Vec3,
    pub sun_color: Vec3,
    pub points: Vec<PointLightSpec>,
}

impl FrameUniform {
    pub fn new(view_proj: Mat4, lighting: &FrameLighting) -> Self {
        let mut points = [PointLightUniform::default(); MAX_POINT_LIGHTS];
        let count = lighting.points.len().min(MAX_POINT_LIGHTS);
        if lighting.points.len() > MAX_POINT_LIGHTS {
            log::warn!(
                "{} point lights requested, only {MAX_POINT_LIGHTS} are shaded",
                lighting.points.len()
            );
        }
        for (slot, light) in points.iter_mut().zip(&lighting.points) {
            *slot = PointLightUniform::new(light);
        }

        Self {
            view_proj: view_proj.to_cols_array_2d(),
            ambient: lighting.ambient.extend(0.0).to_array(),
            sun_position: lighting.sun_position.extend(0.0).to_array(),
            sun_color: lighting.sun_color.extend(0.0).to_array(),
            point_count: [count as u32, 0, 0, 0],
            points,
        }
    }
}

pub struct FrameBindGroup {
    pub layout: wgpu::BindGroupLayout,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl FrameBindGroup {
    pub fn new(device: &wgpu::Device) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame-bind-group-layout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT)],
        });

        let initial = FrameUniform::new(
            Mat4::IDENTITY,
            &FrameLighting {
                ambient: Vec3::ZERO,
                sun_position: Vec3::Y,
                sun_color: Vec3::ZERO,
                points: Vec::new(),
            },
        );
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame-uniform-buffer"),
            contents: bytemuck::cast_slice(&[initial]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame-bind-group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self {
            layout,
            buffer,
            bind_group,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, uniform: &FrameUniform) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[*uniform]));
    }
}

#[repr(C)]
#[derive(Clone, Copy, Zeroable, Pod)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub base_color: [f32; 4],
    pub emissive: [f32; 4],
}

impl ObjectUniform {
    pub fn new(model: Mat4, base_color: Vec3, emissive: Vec3) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
            base_color: base_color.extend(1.0).to_array(),
            emissive: emissive.extend(0.0).to_array(),
        }
    }
}

/// Bind group layout shared by every lit object: uniform, albedo texture, sampler.
pub fn object_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("object-bind-group-layout"),
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
            texture_entry(1, wgpu::TextureViewDimension::D2),
            sampler_entry(2),
        ],
    })
}

/// Per-object transform and material, bound at group 1.
pub struct MaterialBindGroup {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl MaterialBindGroup {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        texture: &GpuTexture,
        initial: &ObjectUniform,
        label: &str,
    ) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-object-buffer")),
            contents: bytemuck::cast_slice(&[*initial]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label}-object-bind-group")),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
        });

        Self { buffer, bind_group }
    }

    pub fn update(&self, queue: &wgpu::Queue, uniform: &ObjectUniform) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[*uniform]));
    }
}

#[repr(C)]
#[derive(Clone, Copy, Zeroable, Pod)]
pub struct SkyUniform {
    /// Inverse of projection times the translation-free view.
    pub inv_view_proj: [[f32; 4]; 4],
    pub day: [f32; 4],
    pub night: [f32; 4],
    pub dawn_dusk: [f32; 4],
    /// x brightness, y time of day.
    pub params: [f32; 4],
}

pub struct SkyParams {
    pub day: Vec3,
    pub night: Vec3,
    pub dawn_dusk: Vec3,
    pub brightness: f32,
    pub time_of_day: f32,
}

impl SkyUniform {
    pub fn new(inv_view_proj: Mat4, sky: &SkyParams) -> Self {
        Self {
            inv_view_proj: inv_view_proj.to_cols_array_2d(),
            day: sky.day.extend(1.0).to_array(),
            night: sky.night.extend(1.0).to_array(),
            dawn_dusk: sky.dawn_dusk.extend(1.0).to_array(),
            params: [sky.brightness, sky.time_of_day, 0.0, 0.0],
        }
    }
}

pub fn sky_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("sky-bind-group-layout"),
        entries: &[
            uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
            texture_entry(1, wgpu::TextureViewDimension::Cube),
            sampler_entry(2),
        ],
    })
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(
    binding: u32,
    view_dimension: wgpu::TextureViewDimension,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}
