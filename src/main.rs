// Binary entry point, native only.
// On wasm32 the cdylib entry point in lib.rs is used instead.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use winit::dpi::PhysicalSize;
    use winit::event_loop::EventLoop;
    use winit::window::WindowBuilder;

    use car_road::app::{self, AppState};
    use car_road::scene_core::config::LaunchConfig;

    env_logger::init();
    let config = LaunchConfig::from_env_args()?;
    log::info!("asset root: {}", config.asset_root);

    let event_loop = EventLoop::new()?;

    let window = Box::leak(Box::new(
        WindowBuilder::new()
            .with_title("car-road")
            .with_inner_size(PhysicalSize::new(1280, 720))
            .build(&event_loop)
            .context("failed to create window")?,
    ));

    let app = pollster::block_on(AppState::new(window, &config))?;

    app::run_event_loop(app, event_loop)
}

#[cfg(target_arch = "wasm32")]
fn main() {}
