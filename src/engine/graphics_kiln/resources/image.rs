use crate::{Rgba, ResourcesConfig};
use egui::Ui;
use nab_kiln::format_binary;
use resource_kiln::{resource, BoxedError, ResourceLifecycler, ResourceTypeTag};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

pub const BYTES_PER_PIXEL: usize = 4;

/// Decoded RGBA8 pixels, rows top to bottom
#[resource(tag = ResourceTypeTag::IMAGE)]
pub struct Image
{
    name: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Box<[u8]>,
}
impl Image
{
    #[inline] #[must_use]
    pub fn byte_len(&self) -> usize { self.pixels.len() }

    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba>
    {
        if x >= self.width || y >= self.height { return None; }
        let offset = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px: [u8; 4] = self.pixels[offset..offset + BYTES_PER_PIXEL].try_into().ok()?;
        Some(px.into())
    }
}
impl Debug for Image
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        f.debug_struct("Image")
            .field("name", &self.name)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub enum ImageLoader
{
    /// PNG, BMP or TGA on disk, relative to the resources root
    File(PathBuf),
    /// Encoded file contents already in memory
    Memory(Arc<[u8]>),
    Solid
    {
        width: u32,
        height: u32,
        color: Rgba,
    },
    Checker
    {
        width: u32,
        height: u32,
        cell: u32,
        colors: [Rgba; 2],
    },
}
impl Debug for ImageLoader
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self
        {
            ImageLoader::File(path) => write!(f, "File({})", path.display()),
            ImageLoader::Memory(bytes) => write!(f, "Memory({} bytes)", bytes.len()),
            ImageLoader::Solid { width, height, color } => write!(f, "Solid({width}x{height} {color:?})"),
            ImageLoader::Checker { width, height, cell, .. } => write!(f, "Checker({width}x{height} cell={cell})"),
        }
    }
}

#[derive(Debug)]
pub enum ImageError
{
    Empty,
    TooLarge { width: u32, height: u32, max: u32 },
    ZeroCheckerCell,
    Read { path: PathBuf, source: std::io::Error },
    Decode(::image::ImageError),
}
impl Display for ImageError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self
        {
            ImageError::Empty => f.write_str("Images must be at least 1x1"),
            ImageError::TooLarge { width, height, max } => write!(f, "{width}x{height} exceeds the maximum image dimension of {max}"),
            ImageError::ZeroCheckerCell => f.write_str("Checker cell size must be non-zero"),
            ImageError::Read { path, source } => write!(f, "Failed to read '{}': {source}", path.display()),
            ImageError::Decode(err) => write!(f, "Failed to decode image: {err}"),
        }
    }
}
impl Error for ImageError
{
    fn source(&self) -> Option<&(dyn Error + 'static)>
    {
        match self
        {
            ImageError::Read { source, .. } => Some(source),
            ImageError::Decode(err) => Some(err),
            _ => None,
        }
    }
}

pub struct ImageLifecycler
{
    config: Arc<ResourcesConfig>,
    host_bytes: AtomicI64,
}
impl ImageLifecycler
{
    #[must_use]
    pub fn new(config: Arc<ResourcesConfig>) -> Self
    {
        Self
        {
            config,
            host_bytes: AtomicI64::new(0),
        }
    }

    /// Bytes of pixel data held by live images
    #[inline] #[must_use]
    pub fn host_bytes(&self) -> i64 { self.host_bytes.load(Ordering::Relaxed) }

    fn check_size(&self, width: u32, height: u32) -> Result<(), ImageError>
    {
        if width == 0 || height == 0
        {
            return Err(ImageError::Empty);
        }
        let max = self.config.max_image_dimension;
        if width > max || height > max
        {
            return Err(ImageError::TooLarge { width, height, max });
        }
        Ok(())
    }

    fn decode(&self, bytes: &[u8]) -> Result<(u32, u32, Box<[u8]>), ImageError>
    {
        let decoded = ::image::load_from_memory(bytes).map_err(ImageError::Decode)?.into_rgba8();
        self.check_size(decoded.width(), decoded.height())?;
        Ok((decoded.width(), decoded.height(), decoded.into_raw().into_boxed_slice()))
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, ImageError>
    {
        let path = self.config.resolve_path(path);
        std::fs::read(&path).map_err(|source| ImageError::Read { path, source })
    }
}
impl ResourceLifecycler for ImageLifecycler
{
    type Resource = Image;
    type Loader = ImageLoader;

    fn create_impl(&self, name: &str, loader: &ImageLoader) -> Result<Image, BoxedError>
    {
        let (width, height, pixels) = match loader
        {
            ImageLoader::File(path) => self.decode(&self.read_file(path)?)?,
            ImageLoader::Memory(bytes) => self.decode(bytes)?,
            ImageLoader::Solid { width, height, color } =>
            {
                self.check_size(*width, *height)?;
                let pixels = color.to_array().repeat(*width as usize * *height as usize);
                (*width, *height, pixels.into_boxed_slice())
            },
            ImageLoader::Checker { width, height, cell, colors } =>
            {
                self.check_size(*width, *height)?;
                if *cell == 0 { return Err(Box::new(ImageError::ZeroCheckerCell)); }

                let mut pixels = Vec::with_capacity(*width as usize * *height as usize * BYTES_PER_PIXEL);
                for y in 0..*height
                {
                    for x in 0..*width
                    {
                        let which = ((x / cell) + (y / cell)) % 2;
                        pixels.extend_from_slice(&colors[which as usize].to_array());
                    }
                }
                (*width, *height, pixels.into_boxed_slice())
            },
        };

        self.host_bytes.fetch_add(pixels.len() as i64, Ordering::Relaxed);
        Ok(Image { name: name.to_string(), width, height, pixels })
    }

    fn free_impl(&self, resource: Arc<Image>)
    {
        self.host_bytes.fetch_sub(resource.byte_len() as i64, Ordering::Relaxed);
    }

    fn debug_gui(&self, ui: &mut Ui)
    {
        ui.label(format!("Host memory: {:#.2}B", format_binary!(self.host_bytes())));
    }
}

#[cfg(test)]
pub(crate) mod tests
{
    use super::*;
    use crate::colors;
    use resource_kiln::{Resource, ResourceManager};
    use std::io::Cursor;

    pub fn image_manager() -> ResourceManager<ImageLifecycler>
    {
        ResourceManager::new(ImageLifecycler::new(Arc::default()))
    }

    pub fn png_bytes(width: u32, height: u32, color: Rgba) -> Arc<[u8]>
    {
        let img = ::image::RgbaImage::from_pixel(width, height, ::image::Rgba(color.to_array()));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ::image::ImageFormat::Png).unwrap();
        bytes.into_inner().into()
    }

    mod procedural
    {
        use super::*;

        #[test]
        fn solid_fill()
        {
            let images = image_manager();
            let image = images.create("red", &ImageLoader::Solid { width: 3, height: 2, color: colors::MAGENTA }).unwrap();

            assert_eq!("red", image.name());
            assert_eq!((3, 2), (image.width, image.height));
            assert_eq!(24, image.byte_len());
            assert_eq!(Some(colors::MAGENTA), image.pixel(2, 1));
            assert_eq!(None, image.pixel(3, 0));
        }

        #[test]
        fn checker_alternates_by_cell()
        {
            let images = image_manager();
            let loader = ImageLoader::Checker { width: 4, height: 4, cell: 2, colors: [colors::BLACK, colors::WHITE] };
            let image = images.create("checker", &loader).unwrap();

            assert_eq!(Some(colors::BLACK), image.pixel(0, 0));
            assert_eq!(Some(colors::BLACK), image.pixel(1, 1));
            assert_eq!(Some(colors::WHITE), image.pixel(2, 0));
            assert_eq!(Some(colors::WHITE), image.pixel(0, 3));
            assert_eq!(Some(colors::BLACK), image.pixel(3, 3));
        }

        #[test]
        fn invalid_sizes()
        {
            let images = ResourceManager::new(ImageLifecycler::new(Arc::new(ResourcesConfig { max_image_dimension: 8, ..Default::default() })));

            assert!(images.create("empty", &ImageLoader::Solid { width: 0, height: 4, color: colors::BLACK }).is_err());
            assert!(images.create("huge", &ImageLoader::Solid { width: 9, height: 1, color: colors::BLACK }).is_err());
            assert!(images.create("cell", &ImageLoader::Checker { width: 2, height: 2, cell: 0, colors: [colors::BLACK; 2] }).is_err());
            assert!(images.is_empty());
            assert_eq!(0, images.lifecycler().host_bytes());
        }
    }

    mod decoded
    {
        use super::*;

        #[test]
        fn png_from_memory()
        {
            let images = image_manager();
            let image = images.create("blue", &ImageLoader::Memory(png_bytes(5, 3, colors::CORNFLOWER_BLUE))).unwrap();

            assert_eq!((5, 3), (image.width, image.height));
            assert_eq!(Some(colors::CORNFLOWER_BLUE), image.pixel(4, 2));
        }

        #[test]
        fn undecodable_bytes()
        {
            let images = image_manager();
            let err = images.create("junk", &ImageLoader::Memory(Arc::from(&b"definitely not an image"[..]))).unwrap_err();

            let reason = err.source().and_then(|e| e.downcast_ref::<ImageError>());
            assert!(matches!(reason, Some(ImageError::Decode(_))));
            assert!(!images.contains("junk"));
        }

        #[test]
        fn file_relative_to_root()
        {
            let root = std::env::temp_dir().join(format!("graphics_kiln_image_{}", std::process::id()));
            std::fs::create_dir_all(&root).unwrap();
            std::fs::write(root.join("gray.png"), png_bytes(2, 2, colors::GRAY)).unwrap();

            let images = ResourceManager::new(ImageLifecycler::new(Arc::new(ResourcesConfig::with_root(&root))));
            let image = images.create("gray", &ImageLoader::File("gray.png".into())).unwrap();
            assert_eq!(Some(colors::GRAY), image.pixel(1, 1));

            let missing = images.create("missing", &ImageLoader::File("missing.png".into())).unwrap_err();
            assert!(matches!(missing.source().and_then(|e| e.downcast_ref::<ImageError>()), Some(ImageError::Read { .. })));

            std::fs::remove_dir_all(&root).unwrap();
        }
    }

    #[test]
    fn host_bytes_return_to_zero()
    {
        let images = image_manager();
        images.create("a", &ImageLoader::Solid { width: 4, height: 4, color: colors::WHITE }).unwrap();
        images.create("b", &ImageLoader::Solid { width: 2, height: 2, color: colors::WHITE }).unwrap();
        assert_eq!(80, images.lifecycler().host_bytes());

        images.release("a");
        assert_eq!(16, images.lifecycler().host_bytes());
        images.clear();
        assert_eq!(0, images.lifecycler().host_bytes());
    }
}
