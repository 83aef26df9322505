use crate::ResourceTypeTag;
use std::any::Any;
use std::fmt::Debug;

/// A named, typed piece of engine data owned by exactly one [`crate::ResourceManager`].
///
/// Usually implemented with `#[resource(tag = "...")]`, which expects a `name: String` field.
pub trait Resource: Send + Sync + 'static
{
    /// The tag of the manager that owns resources of this type
    fn resource_type() -> ResourceTypeTag;

    /// Unique within the owning manager, fixed at creation
    fn name(&self) -> &str;
}

/// Supplies the data for a single resource creation call.
///
/// Loaders are never retained by the resource or the manager. Any `Debug + Send + Sync` type
/// qualifies; managers reached through the factory downcast to the loader type they expect.
pub trait ResourceLoader: Any + Send + Sync + Debug
{
    fn as_any(&self) -> &dyn Any;
}
impl<T: Any + Send + Sync + Debug> ResourceLoader for T
{
    fn as_any(&self) -> &dyn Any { self }
}

// Call this on the trait object itself, a Box<dyn ResourceLoader> is a loader in its own right
#[inline] #[must_use]
pub fn downcast_loader<L: ResourceLoader>(loader: &dyn ResourceLoader) -> Option<&L>
{
    loader.as_any().downcast_ref::<L>()
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::resource;

    #[derive(Debug)]
    struct PathLoader(&'static str);

    #[derive(Debug)]
    struct BytesLoader(Vec<u8>);

    #[test]
    fn downcast_to_concrete_loader()
    {
        let loader = PathLoader("hero.png");
        let erased: &dyn ResourceLoader = &loader;

        assert_eq!("hero.png", downcast_loader::<PathLoader>(erased).unwrap().0);
        assert!(downcast_loader::<BytesLoader>(erased).is_none());
    }

    #[test]
    fn boxed_loaders_downcast_through_as_ref()
    {
        let boxed: Box<dyn ResourceLoader> = Box::new(BytesLoader(vec![1, 2, 3]));
        let found = downcast_loader::<BytesLoader>(boxed.as_ref()).unwrap();
        assert_eq!(3, found.0.len());
    }

    #[resource(tag = "test_named")]
    struct Named
    {
        name: String,
    }

    #[resource(tag = ResourceTypeTag::IMAGE, name_field = label)]
    struct Labelled
    {
        label: String,
    }

    #[test]
    fn attribute_implements_resource()
    {
        assert_eq!("test_named", Named::resource_type().as_str());
        assert_eq!("brick", Named { name: "brick".to_string() }.name());

        assert_eq!(ResourceTypeTag::IMAGE, Labelled::resource_type());
        assert_eq!("sky", Labelled { label: "sky".to_string() }.name());
    }
}
