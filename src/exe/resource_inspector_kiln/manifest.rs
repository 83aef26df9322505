use graphics_kiln::resources::*;
use graphics_kiln::Rgba;
use nab_kiln::TomlRead;
use resource_kiln::{ResourceLoader, ResourceTypeTag};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

/// Resources to create, in order. Entries may refer to anything listed before them.
#[derive(Debug, Default, Deserialize)]
pub struct Manifest
{
    #[serde(default, rename = "resource")]
    pub resources: Vec<ManifestEntry>,
}
impl TomlRead for Manifest { }

#[derive(Debug, Deserialize)]
pub struct ManifestEntry
{
    #[serde(rename = "type")]
    pub type_tag: String,
    pub name: String,
    pub source: toml::Table,
}
impl ManifestEntry
{
    /// Turn the `source` table into the loader the entry's type expects
    pub fn loader(&self) -> Result<Box<dyn ResourceLoader>, ManifestError>
    {
        let Some(type_tag) = ResourceTypeTag::baseline(&self.type_tag)
            else { return Err(ManifestError::UnknownType(self.type_tag.clone())); };

        let source = Source { type_tag, table: &self.source };
        Ok(match type_tag
        {
            ResourceTypeTag::IMAGE => Box::new(source.image()?),
            ResourceTypeTag::TEXTURE => Box::new(source.texture()?),
            ResourceTypeTag::MESH => Box::new(source.mesh()?),
            ResourceTypeTag::GPU_MESH => Box::new(source.gpu_mesh()?),
            ResourceTypeTag::MATERIAL => Box::new(source.material()?),
            ResourceTypeTag::BITMAP_FONT => Box::new(source.bitmap_font()?),
            _ => return Err(ManifestError::UnknownType(self.type_tag.clone())),
        })
    }
}

#[derive(Debug)]
pub enum ManifestError
{
    UnknownType(String),
    NoSource { type_tag: ResourceTypeTag, expected: &'static str },
    MissingKey { type_tag: ResourceTypeTag, key: &'static str },
    BadValue { key: &'static str, reason: String },
}
impl Display for ManifestError
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        match self
        {
            ManifestError::UnknownType(type_tag) => write!(f, "Unknown resource type '{type_tag}'"),
            ManifestError::NoSource { type_tag, expected } => write!(f, "A {type_tag} source needs one of: {expected}"),
            ManifestError::MissingKey { type_tag, key } => write!(f, "The {type_tag} source is missing '{key}'"),
            ManifestError::BadValue { key, reason } => write!(f, "Invalid '{key}': {reason}"),
        }
    }
}
impl Error for ManifestError { }

struct Source<'m>
{
    type_tag: ResourceTypeTag,
    table: &'m toml::Table,
}
impl Source<'_>
{
    fn get<T: DeserializeOwned>(&self, key: &'static str) -> Result<Option<T>, ManifestError>
    {
        self.table.get(key)
            .map(|value| T::deserialize(value.clone()).map_err(|e| ManifestError::BadValue { key, reason: e.to_string() }))
            .transpose()
    }

    fn require<T: DeserializeOwned>(&self, key: &'static str) -> Result<T, ManifestError>
    {
        self.get(key)?.ok_or(ManifestError::MissingKey { type_tag: self.type_tag, key })
    }

    fn no_source(&self, expected: &'static str) -> ManifestError
    {
        ManifestError::NoSource { type_tag: self.type_tag, expected }
    }

    fn sampler(&self) -> Result<SamplerDesc, ManifestError>
    {
        Ok(SamplerDesc
        {
            filter: self.get("filter")?.unwrap_or_default(),
            wrap: self.get("wrap")?.unwrap_or_default(),
        })
    }

    fn image(&self) -> Result<ImageLoader, ManifestError>
    {
        if let Some(file) = self.get::<PathBuf>("file")?
        {
            return Ok(ImageLoader::File(file));
        }
        if let Some(color) = self.get::<Rgba>("solid")?
        {
            return Ok(ImageLoader::Solid { width: self.require("width")?, height: self.require("height")?, color });
        }
        if let Some(colors) = self.get::<[Rgba; 2]>("checker")?
        {
            return Ok(ImageLoader::Checker
            {
                width: self.require("width")?,
                height: self.require("height")?,
                cell: self.get("cell")?.unwrap_or(8),
                colors,
            });
        }
        Err(self.no_source("file, solid, checker"))
    }

    fn texture(&self) -> Result<TextureLoader, ManifestError>
    {
        let sampler = self.sampler()?;
        let generate_mips = self.get("mips")?.unwrap_or(false);

        if let Some(image) = self.get::<String>("image")?
        {
            return Ok(TextureLoader::FromImage { image, sampler, generate_mips });
        }
        if let Some(file) = self.get::<PathBuf>("file")?
        {
            return Ok(TextureLoader::Inline { image: ImageLoader::File(file), sampler, generate_mips });
        }
        Err(self.no_source("image, file"))
    }

    fn mesh(&self) -> Result<MeshLoader, ManifestError>
    {
        if let Some(file) = self.get::<PathBuf>("file")?
        {
            return Ok(MeshLoader::File(file));
        }
        if let Some(half_extent) = self.get::<f32>("cube")?
        {
            return Ok(MeshLoader::Cube { half_extent });
        }
        if let Some(half_extent) = self.get::<f32>("quad")?
        {
            return Ok(MeshLoader::Quad { half_extent });
        }
        Err(self.no_source("file, cube, quad"))
    }

    fn gpu_mesh(&self) -> Result<GpuMeshLoader, ManifestError>
    {
        if let Some(mesh) = self.get::<String>("mesh")?
        {
            return Ok(GpuMeshLoader::FromMesh { mesh });
        }
        match self.mesh()
        {
            Ok(mesh) => Ok(GpuMeshLoader::Inline { mesh }),
            Err(ManifestError::NoSource { .. }) => Err(self.no_source("mesh, file, cube, quad")),
            Err(err) => Err(err),
        }
    }

    fn material(&self) -> Result<MaterialLoader, ManifestError>
    {
        if let Some(file) = self.get::<PathBuf>("file")?
        {
            return Ok(MaterialLoader::File(file));
        }
        if let Some(text) = self.get::<String>("toml")?
        {
            return Ok(MaterialLoader::Toml(text));
        }
        if let Some(desc) = self.get::<MaterialFile>("desc")?
        {
            return Ok(MaterialLoader::Desc(desc));
        }
        Err(self.no_source("file, toml, desc"))
    }

    fn bitmap_font(&self) -> Result<BitmapFontLoader, ManifestError>
    {
        if let Some(file) = self.get::<PathBuf>("file")?
        {
            return Ok(BitmapFontLoader::File(file));
        }
        if let Some(page) = self.get::<String>("grid")?
        {
            return Ok(BitmapFontLoader::Grid
            {
                page,
                cell_width: self.require("cell_width")?,
                cell_height: self.require("cell_height")?,
                first_char: self.get("first_char")?.unwrap_or(' '),
                glyph_count: self.require("glyph_count")?,
            });
        }
        Err(self.no_source("file, grid"))
    }
}

/// A `tag:name` pair from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTarget
{
    pub type_tag: String,
    pub name: String,
}
impl FromStr for ReleaseTarget
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.split_once(':')
        {
            Some((type_tag, name)) if !type_tag.is_empty() && !name.is_empty() =>
                Ok(Self { type_tag: type_tag.to_string(), name: name.to_string() }),
            _ => Err(format!("Expected <type>:<name>, got '{s}'")),
        }
    }
}
