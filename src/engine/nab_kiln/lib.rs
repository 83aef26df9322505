pub mod app;
pub mod utils;

mod toml_io;
pub use toml_io::*;
