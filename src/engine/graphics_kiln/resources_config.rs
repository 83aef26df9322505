use nab_kiln::{TomlRead, TomlWrite};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcesConfig
{
    /// Relative loader paths resolve against this
    pub resources_root: PathBuf,
    pub gpu_memory_budget: u64,
    /// Images larger than this on either axis are rejected
    pub max_image_dimension: u32,
}
impl ResourcesConfig
{
    pub const DEFAULT_GPU_MEMORY_BUDGET: u64 = 256 * 1024 * 1024;
    pub const DEFAULT_MAX_IMAGE_DIMENSION: u32 = 16384;

    #[must_use]
    pub fn with_root(resources_root: impl Into<PathBuf>) -> Self
    {
        Self { resources_root: resources_root.into(), ..Self::default() }
    }

    #[must_use]
    pub fn resolve_path(&self, path: &Path) -> PathBuf
    {
        match path.is_absolute()
        {
            true => path.to_path_buf(),
            false => self.resources_root.join(path),
        }
    }
}
impl Default for ResourcesConfig
{
    fn default() -> Self
    {
        Self
        {
            resources_root: PathBuf::from("."),
            gpu_memory_budget: Self::DEFAULT_GPU_MEMORY_BUDGET,
            max_image_dimension: Self::DEFAULT_MAX_IMAGE_DIMENSION,
        }
    }
}
impl TomlRead for ResourcesConfig { }
impl TomlWrite for ResourcesConfig { }

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn missing_keys_use_defaults()
    {
        let config = ResourcesConfig::from_toml_str("resources_root = \"data\"").unwrap();
        assert_eq!(PathBuf::from("data"), config.resources_root);
        assert_eq!(ResourcesConfig::DEFAULT_GPU_MEMORY_BUDGET, config.gpu_memory_budget);
        assert_eq!(ResourcesConfig::DEFAULT_MAX_IMAGE_DIMENSION, config.max_image_dimension);
    }

    #[test]
    fn saved_config_reloads()
    {
        let config = ResourcesConfig { gpu_memory_budget: 1024, ..ResourcesConfig::with_root("assets") };
        let text = config.to_toml_string(true).unwrap();
        assert_eq!(config, ResourcesConfig::from_toml_str(&text).unwrap());
    }

    #[test]
    fn relative_paths_resolve_under_root()
    {
        let config = ResourcesConfig::with_root("assets");
        assert_eq!(Path::new("assets").join("hero.png"), config.resolve_path(Path::new("hero.png")));

        let absolute = std::env::temp_dir().join("hero.png");
        assert_eq!(absolute, config.resolve_path(&absolute));
    }
}
