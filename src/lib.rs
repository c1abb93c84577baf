pub mod app;
pub mod renderer_wgpu;
pub mod scene_core;
pub mod scene_runtime;

#[cfg(target_arch = "wasm32")]
mod web_entry {
    use wasm_bindgen::prelude::*;
    use winit::window::WindowBuilder;

    use crate::app;
    use crate::scene_core::config::LaunchConfig;

    const CANVAS_ID: &str = "car-road-canvas";

    #[wasm_bindgen(start)]
    pub fn wasm_main() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&format!("failed to init logger: {e}")))?;

        let canvas = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(CANVAS_ID))
            .ok_or_else(|| JsValue::from_str(&format!("canvas element #{CANVAS_ID} not found")))?;

        use winit::platform::web::WindowBuilderExtWebSys;
        let event_loop = winit::event_loop::EventLoop::new()
            .map_err(|e| JsValue::from_str(&format!("failed to create event loop: {e}")))?;
        let window = Box::leak(Box::new(
            WindowBuilder::new()
                .with_canvas(Some(canvas.unchecked_into()))
                .with_prevent_default(true)
                .build(&event_loop)
                .map_err(|e| JsValue::from_str(&format!("failed to create window: {e}")))?,
        ));

        app::run_event_loop_web(window, event_loop, LaunchConfig::default());
        Ok(())
    }
}
