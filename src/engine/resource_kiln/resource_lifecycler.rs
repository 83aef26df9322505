use crate::{BoxedError, Resource, ResourceLoader};
use egui::Ui;
use std::sync::Arc;

/// The type-specific half of a [`crate::ResourceManager`]: how one kind of resource is built and torn down.
///
/// The manager owns caching and naming; lifecyclers only construct and destroy.
pub trait ResourceLifecycler: Send + Sync + 'static
{
    type Resource: Resource;
    type Loader: ResourceLoader;

    /// Build a fully initialized resource called `name` from `loader`.
    /// Must not register the result anywhere, and must not create resources in its own manager.
    fn create_impl(&self, name: &str, loader: &Self::Loader) -> Result<Self::Resource, BoxedError>;

    /// Release whatever the resource holds. Called exactly once per created resource.
    fn free_impl(&self, resource: Arc<Self::Resource>)
    {
        drop(resource);
    }

    fn debug_gui(&self, _ui: &mut Ui) { }
}
