mod image;
pub use self::image::*;

mod texture;
pub use texture::*;

mod mesh;
pub use mesh::*;

mod gpu_mesh;
pub use gpu_mesh::*;

mod material;
pub use material::*;

mod bitmap_font;
pub use bitmap_font::*;
