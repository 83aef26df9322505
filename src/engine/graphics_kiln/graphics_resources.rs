use crate::resources::*;
use crate::{GpuMemoryBudget, ResourcesConfig};
use debug_kiln::debug_gui::DebugGui;
use egui::Ui;
use nab_kiln::format_binary;
use resource_kiln::{ResourceFactory, ResourceManager, ResourceManagerStats, ResourceTypeTag, UntypedResourceManager};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceReport
{
    pub type_tag: ResourceTypeTag,
    pub stats: ResourceManagerStats,
    pub host_bytes: i64,
    pub device_bytes: i64,
}

/// Every graphics resource manager, wired together and registered in one factory.
///
/// Managers are built in dependency order (images before textures, textures before materials
/// and fonts, meshes before GPU meshes) and torn down in reverse.
pub struct GraphicsResources
{
    config: Arc<ResourcesConfig>,
    gpu_budget: Arc<GpuMemoryBudget>,
    factory: ResourceFactory,

    images: Arc<ResourceManager<ImageLifecycler>>,
    textures: Arc<ResourceManager<TextureLifecycler>>,
    meshes: Arc<ResourceManager<MeshLifecycler>>,
    gpu_meshes: Arc<ResourceManager<GpuMeshLifecycler>>,
    materials: Arc<ResourceManager<MaterialLifecycler>>,
    fonts: Arc<ResourceManager<BitmapFontLifecycler>>,
}
impl GraphicsResources
{
    #[must_use]
    pub fn new(config: ResourcesConfig) -> Self
    {
        let config = Arc::new(config);
        let gpu_budget = Arc::new(GpuMemoryBudget::new(config.gpu_memory_budget));

        let images = Arc::new(ResourceManager::new(ImageLifecycler::new(config.clone())));
        let textures = Arc::new(ResourceManager::new(TextureLifecycler::new(images.clone())));
        let meshes = Arc::new(ResourceManager::new(MeshLifecycler::new(config.clone())));
        let gpu_meshes = Arc::new(ResourceManager::new(GpuMeshLifecycler::new(meshes.clone(), gpu_budget.clone())));
        let materials = Arc::new(ResourceManager::new(MaterialLifecycler::new(config.clone(), textures.clone())));
        let fonts = Arc::new(ResourceManager::new(BitmapFontLifecycler::new(config.clone(), textures.clone())));

        let factory = ResourceFactory::new();
        let managers: [Arc<dyn UntypedResourceManager>; 6] =
        [
            images.clone(),
            textures.clone(),
            meshes.clone(),
            gpu_meshes.clone(),
            materials.clone(),
            fonts.clone(),
        ];
        for manager in managers
        {
            factory.register_manager(manager);
        }

        log::debug!("Graphics resources ready: root '{}', {:#.2}B GPU budget",
            config.resources_root.display(),
            format_binary!(config.gpu_memory_budget));

        Self { config, gpu_budget, factory, images, textures, meshes, gpu_meshes, materials, fonts }
    }

    #[inline] #[must_use] pub fn config(&self) -> &ResourcesConfig { &self.config }
    #[inline] #[must_use] pub fn factory(&self) -> &ResourceFactory { &self.factory }
    #[inline] #[must_use] pub fn gpu_budget(&self) -> &GpuMemoryBudget { &self.gpu_budget }

    #[inline] #[must_use] pub fn images(&self) -> &Arc<ResourceManager<ImageLifecycler>> { &self.images }
    #[inline] #[must_use] pub fn textures(&self) -> &Arc<ResourceManager<TextureLifecycler>> { &self.textures }
    #[inline] #[must_use] pub fn meshes(&self) -> &Arc<ResourceManager<MeshLifecycler>> { &self.meshes }
    #[inline] #[must_use] pub fn gpu_meshes(&self) -> &Arc<ResourceManager<GpuMeshLifecycler>> { &self.gpu_meshes }
    #[inline] #[must_use] pub fn materials(&self) -> &Arc<ResourceManager<MaterialLifecycler>> { &self.materials }
    #[inline] #[must_use] pub fn fonts(&self) -> &Arc<ResourceManager<BitmapFontLifecycler>> { &self.fonts }

    /// Per-kind counters and memory, in tag order
    #[must_use]
    pub fn report(&self) -> Vec<ResourceReport>
    {
        let gpu_mesh_bytes = self.gpu_budget.used() as i64;
        self.factory.type_tags().into_iter().filter_map(|type_tag|
        {
            let manager = self.factory.lookup(type_tag.as_str()).ok()?;
            let (host_bytes, device_bytes) = match type_tag
            {
                ResourceTypeTag::IMAGE => (self.images.lifecycler().host_bytes(), 0),
                ResourceTypeTag::MESH => (self.meshes.lifecycler().host_bytes(), 0),
                ResourceTypeTag::TEXTURE => (0, self.textures.lifecycler().device_bytes()),
                ResourceTypeTag::GPU_MESH => (0, gpu_mesh_bytes),
                _ => (0, 0),
            };
            Some(ResourceReport { type_tag, stats: manager.stats(), host_bytes, device_bytes })
        }).collect()
    }
}
impl Drop for GraphicsResources
{
    fn drop(&mut self)
    {
        self.factory.clear();

        // dependents first, so dependencies are still cached while they free
        let freed = self.fonts.clear()
            + self.materials.clear()
            + self.gpu_meshes.clear()
            + self.textures.clear()
            + self.meshes.clear()
            + self.images.clear();
        log::debug!("Shut down graphics resources, freed {freed} resource(s)");
    }
}
impl DebugGui for GraphicsResources
{
    fn display_name(&self) -> &str { "Graphics resources" }

    fn debug_gui(&self, ui: &mut Ui)
    {
        ui.label(format!("Root: {}", self.config.resources_root.display()));
        ui.label(format!("GPU budget: {:#.2}B / {:#.2}B",
            format_binary!(self.gpu_budget.used()),
            format_binary!(self.gpu_budget.capacity())));
        ui.separator();
        self.factory.debug_gui(ui);
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::colors;
    use resource_kiln::ResourceLoader;

    fn checker() -> ImageLoader
    {
        ImageLoader::Checker { width: 16, height: 16, cell: 4, colors: [colors::BLACK, colors::MAGENTA] }
    }

    #[test]
    fn registers_baseline_kinds()
    {
        let resources = GraphicsResources::new(ResourcesConfig::default());
        let mut expected = ResourceTypeTag::BASELINE.to_vec();
        expected.sort_unstable();
        assert_eq!(expected, resources.factory().type_tags());

        let images = resources.factory().lookup_typed::<ImageLifecycler>("image").unwrap();
        assert!(Arc::ptr_eq(resources.images(), &images));
    }

    #[test]
    fn create_every_kind_by_tag()
    {
        let resources = GraphicsResources::new(ResourcesConfig::default());
        let factory = resources.factory();

        let requests: [(&str, &str, Box<dyn ResourceLoader>); 6] =
        [
            ("image", "checker", Box::new(checker())),
            ("texture", "checker", Box::new(TextureLoader::FromImage { image: "checker".to_string(), sampler: SamplerDesc::default(), generate_mips: true })),
            ("mesh", "cube", Box::new(MeshLoader::Cube { half_extent: 0.5 })),
            ("gpu_mesh", "cube", Box::new(GpuMeshLoader::FromMesh { mesh: "cube".to_string() })),
            ("material", "checker", Box::new(MaterialLoader::Toml("[[textures]]\ntexture = \"checker\"".to_string()))),
            ("bitmap_font", "grid", Box::new(BitmapFontLoader::Grid { page: "checker".to_string(), cell_width: 4, cell_height: 4, first_char: 'a', glyph_count: 16 })),
        ];
        for (tag, name, loader) in &requests
        {
            factory.create(tag, name, loader.as_ref()).unwrap();
        }

        let material = resources.materials().get("checker").unwrap();
        assert!(Arc::ptr_eq(&resources.textures().get("checker").unwrap(), &material.textures[0]));
        assert_eq!(16, resources.fonts().get("grid").unwrap().glyphs.len());

        let report = resources.report();
        assert_eq!(6, report.len());
        assert!(report.iter().all(|r| r.stats.live == 1 && r.stats.failures == 0));

        let image_report = report.iter().find(|r| r.type_tag == ResourceTypeTag::IMAGE).unwrap();
        assert_eq!(16 * 16 * 4, image_report.host_bytes);
        let gpu_report = report.iter().find(|r| r.type_tag == ResourceTypeTag::GPU_MESH).unwrap();
        assert_eq!(resources.gpu_meshes().get("cube").unwrap().device_bytes() as i64, gpu_report.device_bytes);
    }

    #[test]
    fn wrong_loader_for_tag()
    {
        let resources = GraphicsResources::new(ResourcesConfig::default());
        assert!(resources.factory().create("texture", "checker", &checker()).is_err());
        assert!(resources.textures().is_empty());
        assert!(resources.images().is_empty());
    }

    #[test]
    fn gpu_budget_from_config()
    {
        let resources = GraphicsResources::new(ResourcesConfig { gpu_memory_budget: 64, ..Default::default() });
        assert_eq!(64, resources.gpu_budget().capacity());
        assert!(resources.gpu_meshes().create("cube", &GpuMeshLoader::Inline { mesh: MeshLoader::Cube { half_extent: 1.0 } }).is_err());
        assert!(resources.meshes().is_empty());
    }

    #[test]
    fn drop_tears_everything_down()
    {
        let resources = GraphicsResources::new(ResourcesConfig::default());
        resources.textures().create("checker", &TextureLoader::Inline { image: checker(), sampler: SamplerDesc::default(), generate_mips: true }).unwrap();
        resources.materials().create("mat", &MaterialLoader::Toml("[[textures]]\ntexture = \"checker\"".to_string())).unwrap();
        resources.gpu_meshes().create("quad", &GpuMeshLoader::Inline { mesh: MeshLoader::Quad { half_extent: 1.0 } }).unwrap();

        let images = resources.images().clone();
        let textures = resources.textures().clone();
        let meshes = resources.meshes().clone();
        drop(resources);

        assert!(images.is_empty());
        assert!(textures.is_empty());
        assert!(meshes.is_empty());
        assert_eq!(0, images.lifecycler().host_bytes());
        assert_eq!(0, textures.lifecycler().device_bytes());
        assert_eq!(0, meshes.lifecycler().host_bytes());
    }
}
