pub mod colors;
pub use colors::Rgba;
mod gpu_memory;
pub use gpu_memory::*;
mod resources_config;
pub use resources_config::*;
pub mod resources;
mod graphics_resources;
pub use graphics_resources::*;
