use std::borrow::Borrow;
use std::fmt::{Display, Formatter};

/// Stable string identifier of a resource kind, used as the factory key.
///
/// Hashes and compares like the underlying `str`, so maps keyed by tags can be queried with `&str`.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResourceTypeTag(&'static str);
impl ResourceTypeTag
{
    pub const IMAGE: Self = Self("image");
    pub const MESH: Self = Self("mesh");
    pub const GPU_MESH: Self = Self("gpu_mesh");
    pub const MATERIAL: Self = Self("material");
    pub const TEXTURE: Self = Self("texture");
    pub const BITMAP_FONT: Self = Self("bitmap_font");

    // The kinds every engine configuration registers
    pub const BASELINE: [Self; 6] =
    [
        Self::IMAGE,
        Self::MESH,
        Self::GPU_MESH,
        Self::MATERIAL,
        Self::TEXTURE,
        Self::BITMAP_FONT,
    ];

    #[inline] #[must_use]
    pub const fn new(tag: &'static str) -> Self { Self(tag) }

    #[inline] #[must_use]
    pub const fn as_str(&self) -> &'static str { self.0 }

    #[must_use]
    pub fn baseline(tag: &str) -> Option<Self>
    {
        Self::BASELINE.into_iter().find(|t| t.0 == tag)
    }

    #[inline] #[must_use]
    pub fn is_baseline(&self) -> bool { Self::baseline(self.0).is_some() }
}
impl Display for ResourceTypeTag
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.0) }
}
impl Borrow<str> for ResourceTypeTag
{
    fn borrow(&self) -> &str { self.0 }
}
impl AsRef<str> for ResourceTypeTag
{
    fn as_ref(&self) -> &str { self.0 }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn baseline_tags()
    {
        let strs: Vec<_> = ResourceTypeTag::BASELINE.iter().map(|t| t.as_str()).collect();
        assert_eq!(vec!["image", "mesh", "gpu_mesh", "material", "texture", "bitmap_font"], strs);

        assert_eq!(Some(ResourceTypeTag::GPU_MESH), ResourceTypeTag::baseline("gpu_mesh"));
        assert_eq!(None, ResourceTypeTag::baseline("GPU_MESH"));
        assert!(!ResourceTypeTag::new("sound").is_baseline());
    }

    #[test]
    fn lookup_by_str()
    {
        let mut map = HashMap::new();
        map.insert(ResourceTypeTag::MESH, 1);
        map.insert(ResourceTypeTag::new("custom"), 2);

        assert_eq!(Some(&1), map.get("mesh"));
        assert_eq!(Some(&2), map.get("custom"));
        assert_eq!(None, map.get("image"));
    }
}
