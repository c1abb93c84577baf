use anyhow::Result;
use glam::Vec3;
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::renderer_wgpu::gpu_context::GpuContext;
use crate::renderer_wgpu::material::{FrameLighting, SkyParams};
use crate::renderer_wgpu::scene::SceneRenderer;
use crate::scene_core::camera::{CameraController, CameraParams, CameraState, Projection};
use crate::scene_core::config::LaunchConfig;
use crate::scene_core::day_night::{DayNightCycle, LightingSnapshot};
use crate::scene_core::input::InputAdapter;
use crate::scene_core::layout::{
    ambient_color, pointer_light, PointLightSpec, CAMERA_START, ROAD_ORIGIN, WHEEL_SPIN_PER_FRAME,
};
use crate::scene_core::sky::SkyPalette;
use crate::scene_core::trees::plant_trees;
use crate::scene_runtime::{AssetKind, AssetPayload, SceneAssets};

#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;
#[cfg(target_arch = "wasm32")]
use web_time::Instant;

mod event_loop;

pub use event_loop::run_event_loop;
#[cfg(target_arch = "wasm32")]
pub use event_loop::run_event_loop_web;

pub struct AppState {
    window: &'static Window,
    gpu: GpuContext,
    scene: SceneRenderer,
    camera: CameraState,
    projection: Projection,
    camera_controller: CameraController,
    input: InputAdapter,
    cycle: DayNightCycle,
    sky_palette: SkyPalette,
    assets: SceneAssets,
    pointer_light: PointLightSpec,
    wheel_spin: f32,
    started: Instant,
    last_frame: Instant,
    frame_time_ms: f32,
}

impl AppState {
    pub async fn new(window: &'static Window, config: &LaunchConfig) -> Result<Self> {
        let gpu = GpuContext::new(window).await?;
        let scene = SceneRenderer::new(&gpu.device, &gpu.queue, &gpu.config);

        let mut assets = SceneAssets::new(config)?;
        assets.request_all();

        let now = Instant::now();
        Ok(Self {
            window,
            gpu,
            scene,
            camera: CameraState::looking_at(CAMERA_START, Vec3::ZERO),
            projection: Projection::default(),
            camera_controller: CameraController::new(CameraParams::default()),
            input: InputAdapter::new(),
            cycle: DayNightCycle::default(),
            sky_palette: SkyPalette::default(),
            assets,
            pointer_light: pointer_light(),
            wheel_spin: 0.0,
            started: now,
            last_frame: now,
            frame_time_ms: 0.0,
        })
    }

    /// Returns `true` when the event was consumed as camera or pointer input.
    fn process_window_event(&mut self, event: &WindowEvent) -> bool {
        let size = (self.gpu.config.width, self.gpu.config.height);
        if self.input.process_window_event(event, size) {
            return true;
        }

        // Key-up events are lost while unfocused.
        if let WindowEvent::Focused(false) = event {
            self.input.reset();
        }
        false
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
        self.scene.resize(&self.gpu.device, &self.gpu.config);
    }

    fn apply_loaded_assets(&mut self) {
        for asset in self.assets.poll() {
            let kind = asset.kind;
            match asset.result {
                Ok(payload) => self.install(kind, payload),
                Err(e) => log::error!("failed to load {kind}: {e:#}"),
            }
        }
    }

    fn install(&mut self, kind: AssetKind, payload: AssetPayload) {
        let (device, queue) = (&self.gpu.device, &self.gpu.queue);
        match (kind, payload) {
            (AssetKind::Ground, AssetPayload::Texture(image)) => {
                if let Err(e) = self.scene.set_ground(device, queue, &image) {
                    log::error!("failed to load {kind}: {e:#}");
                    return;
                }
            }
            (AssetKind::Road, AssetPayload::Texture(image)) => {
                if let Err(e) = self.scene.set_road(device, queue, &image) {
                    log::error!("failed to load {kind}: {e:#}");
                    return;
                }
                let trees = plant_trees(&mut rand::rng(), ROAD_ORIGIN);
                self.scene.plant_trees(device, &trees);
                log::info!("planted {} trees along the road", trees.len());
            }
            (AssetKind::Sky, AssetPayload::SkyFaces(faces)) => {
                if let Err(e) = self.scene.set_sky(device, queue, &faces) {
                    log::error!("failed to load {kind}: {e:#}");
                    return;
                }
            }
            (AssetKind::Car, AssetPayload::Model(model)) => {
                if !self.scene.set_car(device, queue, model) {
                    log::warn!("car already present, ignoring second load");
                    return;
                }
            }
            (kind, _) => {
                log::warn!("{kind} arrived with an unexpected payload");
                return;
            }
        }
        log::info!("{kind} ready");
    }

    fn subject_position(&self) -> Option<Vec3> {
        self.scene.car().map(|car| car.rig().subject_position())
    }

    fn frame_lighting(&self, snapshot: &LightingSnapshot) -> FrameLighting {
        let mut points = vec![self.pointer_light];
        if let Some(car) = self.scene.car() {
            points.extend(
                car.rig()
                    .lights(snapshot.headlight_intensity, snapshot.taillight_intensity),
            );
        }

        FrameLighting {
            ambient: ambient_color(),
            sun_position: snapshot.celestial_position,
            sun_color: Vec3::ONE * snapshot.light_intensity,
            points,
        }
    }

    fn update(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frame_time_ms = self.frame_time_ms * 0.94 + (dt * 1000.0) * 0.06;

        self.apply_loaded_assets();

        if let Some(offset) = self.input.take_pointer_light() {
            self.pointer_light.position.x = offset.x;
            self.pointer_light.position.z = offset.y;
        }

        let input = self.input.snapshot();
        self.camera = self
            .camera_controller
            .update_camera(self.camera, &input, self.subject_position());

        if self.scene.car().is_some() {
            self.wheel_spin += WHEEL_SPIN_PER_FRAME;
        }

        let elapsed_ms = now.duration_since(self.started).as_secs_f64() * 1000.0;
        let lighting = self.cycle.update(elapsed_ms);

        let queue = &self.gpu.queue;
        let aspect = self.gpu.aspect();
        self.scene.update_frame(
            queue,
            self.projection.view_projection(&self.camera, aspect),
            &self.frame_lighting(&lighting),
        );
        self.scene.update_celestial(
            queue,
            lighting.celestial_position,
            lighting.celestial_color,
            lighting.celestial_emissive,
        );
        self.scene.update_sky(
            queue,
            self.projection
                .sky_view_projection(&self.camera, aspect)
                .inverse(),
            &SkyParams {
                day: self.sky_palette.day,
                night: self.sky_palette.night,
                dawn_dusk: self.sky_palette.dawn_dusk,
                brightness: lighting.sky_brightness,
                time_of_day: lighting.sky_time_of_day,
            },
        );
        self.scene.update_car(queue, self.wheel_spin);

        self.window.set_title(&format!(
            "car-road | {:.1}ms ({:.0}fps) | {} | assets pending: {}",
            self.frame_time_ms,
            1000.0 / self.frame_time_ms.max(0.01),
            if self.cycle.is_day_time() { "day" } else { "night" },
            self.assets.pending_count(),
        ));
    }

    fn render(&mut self) -> Result<(), SurfaceError> {
        let output = self.gpu.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("car-road-render-encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene-render-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.scene.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.scene.render(&mut pass);
        }

        self.gpu.queue.submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }
}
