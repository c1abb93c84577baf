pub mod car;
pub mod geometry;
pub mod gpu_context;
pub mod material;
pub mod model_loader;
pub mod pipeline;
pub mod scene;
pub mod sky_pass;
pub mod texture;
