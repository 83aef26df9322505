use super::{SamplerDesc, Texture, TextureLifecycler, TextureLoader};
use crate::{colors, ResourcesConfig, Rgba};
use arrayvec::ArrayVec;
use egui::Ui;
use nab_kiln::{TomlRead, TomlWrite};
use proc_macros_kiln::FancyEnum;
use resource_kiln::{resource, BoxedError, Resource, ResourceLifecycler, ResourceManager, ResourceTypeTag};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const MAX_MATERIAL_TEXTURE_BINDINGS: usize = 16;

#[derive(PartialEq, Eq, Serialize, Deserialize, Debug, FancyEnum, Hash, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum MaterialClass
{
    #[default]
    #[enum_prop(shader = "simple_opaque")]
    SimpleOpaque,
    #[enum_prop(shader = "alpha_blended")]
    Translucent,
    #[enum_prop(shader = "unlit")]
    Unlit,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PbrProps
{
    pub albedo_color: Rgba,
    pub metallicity: f32,
    pub roughness: f32,
}
impl Default for PbrProps
{
    fn default() -> Self
    {
        Self
        {
            albedo_color: colors::WHITE,
            metallicity: 0.0,
            roughness: 0.5,
        }
    }
}

/// A texture binding. With `image` set the texture is created from that image if it doesn't exist yet,
/// otherwise it must already exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialTextureRef
{
    pub texture: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub sampler: SamplerDesc,
    #[serde(default)]
    pub generate_mips: bool,
}
impl MaterialTextureRef
{
    #[must_use]
    pub fn existing(texture: impl Into<String>) -> Self
    {
        Self { texture: texture.into(), image: None, sampler: SamplerDesc::default(), generate_mips: false }
    }
}

/// Material descriptor, stored as TOML
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialFile
{
    #[serde(default)]
    pub class: MaterialClass,
    #[serde(default)]
    pub props: PbrProps,
    #[serde(default, skip_serializing_if = "ArrayVec::is_empty")]
    pub textures: ArrayVec<MaterialTextureRef, MAX_MATERIAL_TEXTURE_BINDINGS>,
}
impl TomlRead for MaterialFile { }
impl TomlWrite for MaterialFile { }

#[derive(Debug)]
pub enum MaterialError
{
    PropertyOutOfRange { property: &'static str, value: f32 },
    TranslucentWithOpaqueAlbedo,
}
impl Display for MaterialError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self
        {
            MaterialError::PropertyOutOfRange { property, value } => write!(f, "{property} must be within [0, 1], got {value}"),
            MaterialError::TranslucentWithOpaqueAlbedo => f.write_str("Translucent materials need an albedo alpha below 255"),
        }
    }
}
impl Error for MaterialError { }

fn validate_props(class: MaterialClass, props: &PbrProps) -> Result<(), MaterialError>
{
    for (property, value) in [("metallicity", props.metallicity), ("roughness", props.roughness)]
    {
        if !(0.0..=1.0).contains(&value)
        {
            return Err(MaterialError::PropertyOutOfRange { property, value });
        }
    }
    if class == MaterialClass::Translucent && props.albedo_color.is_opaque()
    {
        return Err(MaterialError::TranslucentWithOpaqueAlbedo);
    }
    Ok(())
}

#[resource(tag = ResourceTypeTag::MATERIAL)]
#[derive(Debug)]
pub struct Material
{
    name: String,
    pub class: MaterialClass,
    pub props: PbrProps,
    pub textures: ArrayVec<Arc<Texture>, MAX_MATERIAL_TEXTURE_BINDINGS>,
}
impl Material
{
    #[inline] #[must_use]
    pub fn shader_name(&self) -> &'static str { self.class.shader().unwrap_or("simple_opaque") }
}

#[derive(Debug, Clone)]
pub enum MaterialLoader
{
    Toml(String),
    /// TOML file relative to the resources root
    File(PathBuf),
    Desc(MaterialFile),
}

pub struct MaterialLifecycler
{
    config: Arc<ResourcesConfig>,
    textures: Arc<ResourceManager<TextureLifecycler>>,
    live_by_class: [AtomicUsize; MaterialClass::variant_count()],
}
impl MaterialLifecycler
{
    #[must_use]
    pub fn new(config: Arc<ResourcesConfig>, textures: Arc<ResourceManager<TextureLifecycler>>) -> Self
    {
        Self
        {
            config,
            textures,
            live_by_class: std::array::from_fn(|_| AtomicUsize::new(0)),
        }
    }

    #[inline] #[must_use]
    pub fn textures(&self) -> &Arc<ResourceManager<TextureLifecycler>> { &self.textures }

    #[must_use]
    pub fn live_count(&self, class: MaterialClass) -> usize
    {
        self.live_by_class[class as usize].load(Ordering::Relaxed)
    }

    /// The bound texture, and whether this call created it
    fn bind_texture(&self, binding: &MaterialTextureRef) -> Result<(Arc<Texture>, bool), BoxedError>
    {
        let bound = match &binding.image
        {
            Some(image) => self.textures.create_or_get(&binding.texture, &TextureLoader::FromImage
            {
                image: image.clone(),
                sampler: binding.sampler,
                generate_mips: binding.generate_mips,
            })?,
            None => (self.textures.get(&binding.texture)?, false),
        };
        Ok(bound)
    }
}
impl ResourceLifecycler for MaterialLifecycler
{
    type Resource = Material;
    type Loader = MaterialLoader;

    fn create_impl(&self, name: &str, loader: &MaterialLoader) -> Result<Material, BoxedError>
    {
        let parsed;
        let mtl_file = match loader
        {
            MaterialLoader::Toml(text) => { parsed = MaterialFile::from_toml_str(text)?; &parsed },
            MaterialLoader::File(path) => { parsed = MaterialFile::load_file(self.config.resolve_path(path))?; &parsed },
            MaterialLoader::Desc(desc) => desc,
        };

        validate_props(mtl_file.class, &mtl_file.props)?;

        let mut textures = ArrayVec::<_, MAX_MATERIAL_TEXTURE_BINDINGS>::new();
        let mut created = ArrayVec::<_, MAX_MATERIAL_TEXTURE_BINDINGS>::new();
        for binding in &mtl_file.textures
        {
            match self.bind_texture(binding)
            {
                Ok((texture, constructed)) =>
                {
                    if constructed { created.push(texture.clone()); }
                    textures.push(texture);
                },
                Err(err) =>
                {
                    // a failed material leaves no textures of its own behind
                    for texture in &created
                    {
                        self.textures.release_instance(texture.name(), texture);
                    }
                    return Err(err);
                }
            }
        }

        self.live_by_class[mtl_file.class as usize].fetch_add(1, Ordering::Relaxed);
        Ok(Material
        {
            name: name.to_string(),
            class: mtl_file.class,
            props: mtl_file.props,
            textures,
        })
    }

    fn free_impl(&self, resource: Arc<Material>)
    {
        self.live_by_class[resource.class as usize].fetch_sub(1, Ordering::Relaxed);
    }

    fn debug_gui(&self, ui: &mut Ui)
    {
        for class in MaterialClass::ALL
        {
            ui.label(format!("{}: {}", class.variant_name(), self.live_count(class)));
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::resources::texture::tests::{solid, texture_manager};
    use resource_kiln::{Resource, ResourceError};

    fn material_manager() -> ResourceManager<MaterialLifecycler>
    {
        ResourceManager::new(MaterialLifecycler::new(Arc::default(), Arc::new(texture_manager())))
    }

    fn reason<E: Error + 'static>(err: &ResourceError) -> Option<&E>
    {
        err.source().and_then(|e| e.downcast_ref::<E>())
    }

    const BRICKS_TOML: &str = r#"
        class = "simple_opaque"

        [props]
        albedo_color = [200, 80, 60, 255]
        roughness = 0.9

        [[textures]]
        texture = "bricks_albedo"
        image = "bricks"
        generate_mips = true
        sampler = { filter = "nearest", wrap = "clamp" }
    "#;

    mod parsing
    {
        use super::*;

        #[test]
        fn toml_creates_referenced_textures()
        {
            let materials = material_manager();
            let images = materials.lifecycler().textures().lifecycler().images().clone();
            images.create("bricks", &solid(8, 8)).unwrap();

            let material = materials.create("bricks", &MaterialLoader::Toml(BRICKS_TOML.to_string())).unwrap();
            assert_eq!("bricks", material.name());
            assert_eq!(MaterialClass::SimpleOpaque, material.class);
            assert_eq!(Rgba::new(200, 80, 60, 255), material.props.albedo_color);
            assert_eq!(0.9, material.props.roughness);
            assert_eq!(0.0, material.props.metallicity);

            assert_eq!(1, material.textures.len());
            assert_eq!("bricks_albedo", material.textures[0].name());
            assert_eq!(4, material.textures[0].mip_count);
            assert!(materials.lifecycler().textures().contains("bricks_albedo"));
            assert_eq!(1, materials.lifecycler().live_count(MaterialClass::SimpleOpaque));
        }

        #[test]
        fn defaults_for_empty_descriptor()
        {
            let materials = material_manager();
            let material = materials.create("plain", &MaterialLoader::Toml(String::new())).unwrap();

            assert_eq!(MaterialClass::SimpleOpaque, material.class);
            assert_eq!(PbrProps::default(), material.props);
            assert!(material.textures.is_empty());
            assert_eq!("simple_opaque", material.shader_name());
        }

        #[test]
        fn malformed_toml()
        {
            let materials = material_manager();
            assert!(materials.create("bad", &MaterialLoader::Toml("class = \"plaid\"".to_string())).is_err());
            assert!(materials.create("bad", &MaterialLoader::Toml("props = 3".to_string())).is_err());
            assert!(materials.is_empty());
        }

        #[test]
        fn too_many_textures()
        {
            let mut text = String::new();
            for i in 0..=MAX_MATERIAL_TEXTURE_BINDINGS
            {
                text += &format!("[[textures]]\ntexture = \"t{i}\"\n");
            }
            assert!(MaterialFile::from_toml_str(&text).is_err());
        }

        #[test]
        fn file_round_trip()
        {
            let root = std::env::temp_dir().join(format!("graphics_kiln_material_{}", std::process::id()));
            std::fs::create_dir_all(&root).unwrap();

            let desc = MaterialFile
            {
                class: MaterialClass::Unlit,
                props: PbrProps { metallicity: 1.0, ..Default::default() },
                textures: ArrayVec::new(),
            };
            std::fs::write(root.join("chrome.toml"), desc.to_toml_string(true).unwrap()).unwrap();

            let materials = ResourceManager::new(MaterialLifecycler::new(
                Arc::new(ResourcesConfig::with_root(&root)),
                Arc::new(texture_manager())));
            let material = materials.create("chrome", &MaterialLoader::File("chrome.toml".into())).unwrap();
            assert_eq!(desc.class, material.class);
            assert_eq!(desc.props, material.props);
            assert_eq!("unlit", material.shader_name());

            std::fs::remove_dir_all(&root).unwrap();
        }
    }

    mod validation
    {
        use super::*;

        #[test]
        fn properties_in_range()
        {
            let materials = material_manager();
            let desc = MaterialFile { props: PbrProps { roughness: 1.5, ..Default::default() }, ..Default::default() };

            let err = materials.create("rough", &MaterialLoader::Desc(desc)).unwrap_err();
            assert!(matches!(reason::<MaterialError>(&err), Some(MaterialError::PropertyOutOfRange { property: "roughness", .. })));

            let desc = MaterialFile { props: PbrProps { metallicity: f32::NAN, ..Default::default() }, ..Default::default() };
            assert!(materials.create("nan", &MaterialLoader::Desc(desc)).is_err());
        }

        #[test]
        fn translucent_needs_alpha()
        {
            let materials = material_manager();
            let mut desc = MaterialFile { class: MaterialClass::Translucent, ..Default::default() };
            assert!(materials.create("glass", &MaterialLoader::Desc(desc.clone())).is_err());

            desc.props.albedo_color = Rgba::new(255, 255, 255, 128);
            let glass = materials.create("glass", &MaterialLoader::Desc(desc)).unwrap();
            assert_eq!("alpha_blended", glass.shader_name());
        }

        #[test]
        fn missing_texture()
        {
            let materials = material_manager();
            let mut desc = MaterialFile::default();
            desc.textures.push(MaterialTextureRef::existing("nowhere"));

            let err = materials.create("broken", &MaterialLoader::Desc(desc)).unwrap_err();
            assert!(reason::<ResourceError>(&err).is_some_and(ResourceError::is_not_found));
            assert_eq!(0, materials.lifecycler().live_count(MaterialClass::SimpleOpaque));
        }

        #[test]
        fn failed_binding_releases_created_textures()
        {
            let materials = material_manager();
            let textures = materials.lifecycler().textures().clone();
            textures.lifecycler().images().create("img", &solid(4, 4)).unwrap();

            let mut desc = MaterialFile::default();
            desc.textures.push(MaterialTextureRef { image: Some("img".to_string()), ..MaterialTextureRef::existing("t1") });
            desc.textures.push(MaterialTextureRef::existing("nowhere"));

            assert!(materials.create("broken", &MaterialLoader::Desc(desc)).is_err());
            assert!(materials.is_empty());
            assert!(!textures.contains("t1"));
            assert_eq!(0, textures.lifecycler().device_bytes());
            assert!(textures.lifecycler().images().contains("img"));
        }

        #[test]
        fn failed_binding_keeps_preexisting_textures()
        {
            let materials = material_manager();
            let textures = materials.lifecycler().textures().clone();
            textures.lifecycler().images().create("img", &solid(4, 4)).unwrap();
            let loader = TextureLoader::FromImage { image: "img".to_string(), sampler: SamplerDesc::default(), generate_mips: false };
            let existing = textures.create("t1", &loader).unwrap();

            let mut desc = MaterialFile::default();
            desc.textures.push(MaterialTextureRef { image: Some("img".to_string()), ..MaterialTextureRef::existing("t1") });
            desc.textures.push(MaterialTextureRef::existing("nowhere"));

            assert!(materials.create("broken", &MaterialLoader::Desc(desc)).is_err());
            assert!(Arc::ptr_eq(&existing, &textures.get("t1").unwrap()));
        }
    }

    #[test]
    fn shares_existing_textures()
    {
        let materials = material_manager();
        let textures = materials.lifecycler().textures().clone();
        textures.create("shared", &TextureLoader::Inline { image: solid(2, 2), sampler: SamplerDesc::default(), generate_mips: false }).unwrap();

        let mut desc = MaterialFile::default();
        desc.textures.push(MaterialTextureRef::existing("shared"));
        let a = materials.create("a", &MaterialLoader::Desc(desc.clone())).unwrap();
        let b = materials.create("b", &MaterialLoader::Desc(desc)).unwrap();

        assert!(Arc::ptr_eq(&a.textures[0], &b.textures[0]));
        assert_eq!(1, textures.len());

        materials.clear();
        assert_eq!(0, materials.lifecycler().live_count(MaterialClass::SimpleOpaque));
        assert!(textures.contains("shared"));
    }
}
