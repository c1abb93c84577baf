pub mod camera;
pub mod color;
pub mod config;
pub mod day_night;
pub mod input;
pub mod layout;
pub mod sky;
pub mod trees;
