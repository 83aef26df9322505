use super::{Image, ImageLifecycler, ImageLoader, BYTES_PER_PIXEL};
use egui::Ui;
use nab_kiln::format_binary;
use proc_macros_kiln::FancyEnum;
use resource_kiln::{resource, BoxedError, Resource, ResourceLifecycler, ResourceManager, ResourceTypeTag};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

pub const MAX_MIP_COUNT: u32 = 16;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FancyEnum)]
#[serde(rename_all = "snake_case")]
pub enum TextureFilter
{
    Nearest,
    #[default]
    Linear,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, FancyEnum)]
#[serde(rename_all = "snake_case")]
pub enum TextureWrap
{
    #[default]
    Repeat,
    Clamp,
    Mirror,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerDesc
{
    pub filter: TextureFilter,
    pub wrap: TextureWrap,
}

// floor(log2(max(w, h))) + 1
#[inline] #[must_use]
pub fn full_mip_count(width: u32, height: u32) -> u32
{
    let largest = width.max(height).max(1);
    (u32::BITS - largest.leading_zeros()).min(MAX_MIP_COUNT)
}

#[resource(tag = ResourceTypeTag::TEXTURE)]
#[derive(Debug)]
pub struct Texture
{
    name: String,
    pub image: Arc<Image>,
    pub sampler: SamplerDesc,
    pub mip_count: u32,
    owns_image: bool,
}
impl Texture
{
    #[inline] #[must_use] pub fn width(&self) -> u32 { self.image.width }
    #[inline] #[must_use] pub fn height(&self) -> u32 { self.image.height }

    /// Size of the full mip chain once uploaded
    #[must_use]
    pub fn device_bytes(&self) -> u64
    {
        let mut total_size = 0u64;
        for mip in 0..self.mip_count
        {
            let width = (self.width() >> mip).max(1) as u64;
            let height = (self.height() >> mip).max(1) as u64;
            total_size += width * height * BYTES_PER_PIXEL as u64;
        }
        total_size
    }
}

#[derive(Debug, Clone)]
pub enum TextureLoader
{
    /// Wrap an image that already exists in the image manager
    FromImage
    {
        image: String,
        sampler: SamplerDesc,
        generate_mips: bool,
    },
    /// Create the image too, under the texture's name
    Inline
    {
        image: ImageLoader,
        sampler: SamplerDesc,
        generate_mips: bool,
    },
}

pub struct TextureLifecycler
{
    images: Arc<ResourceManager<ImageLifecycler>>,
    device_bytes: AtomicI64,
    inline_images: AtomicUsize,
}
impl TextureLifecycler
{
    #[must_use]
    pub fn new(images: Arc<ResourceManager<ImageLifecycler>>) -> Self
    {
        Self
        {
            images,
            device_bytes: AtomicI64::new(0),
            inline_images: AtomicUsize::new(0),
        }
    }

    #[inline] #[must_use]
    pub fn images(&self) -> &Arc<ResourceManager<ImageLifecycler>> { &self.images }

    #[inline] #[must_use]
    pub fn device_bytes(&self) -> i64 { self.device_bytes.load(Ordering::Relaxed) }
}
impl ResourceLifecycler for TextureLifecycler
{
    type Resource = Texture;
    type Loader = TextureLoader;

    fn create_impl(&self, name: &str, loader: &TextureLoader) -> Result<Texture, BoxedError>
    {
        let (image, sampler, generate_mips, owns_image) = match loader
        {
            TextureLoader::FromImage { image, sampler, generate_mips } =>
                (self.images.get(image)?, *sampler, *generate_mips, false),
            TextureLoader::Inline { image, sampler, generate_mips } =>
            {
                let (image, constructed) = self.images.create_or_get(name, image)?;
                if constructed { self.inline_images.fetch_add(1, Ordering::Relaxed); }
                (image, *sampler, *generate_mips, constructed)
            },
        };

        let mip_count = match generate_mips
        {
            true => full_mip_count(image.width, image.height),
            false => 1,
        };

        let texture = Texture { name: name.to_string(), image, sampler, mip_count, owns_image };
        self.device_bytes.fetch_add(texture.device_bytes() as i64, Ordering::Relaxed);
        Ok(texture)
    }

    fn free_impl(&self, resource: Arc<Texture>)
    {
        self.device_bytes.fetch_sub(resource.device_bytes() as i64, Ordering::Relaxed);

        // an image created inline shares the texture's name and goes with it
        if !resource.owns_image { return; }
        if self.images.release_instance(resource.name(), &resource.image)
        {
            self.inline_images.fetch_sub(1, Ordering::Relaxed);
        }
    }

    fn debug_gui(&self, ui: &mut Ui)
    {
        ui.label(format!("Total device bytes: {:#.2}B", format_binary!(self.device_bytes())));
        ui.label(format!("Inline images: {}", self.inline_images.load(Ordering::Relaxed)));
    }
}
