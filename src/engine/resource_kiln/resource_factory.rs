use super::*;
use debug_kiln::debug_gui::DebugGui;
use egui::Ui;
use nab_kiln::utils::ShortTypeName;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// Registry of resource managers keyed by type tag.
///
/// The factory never owns a manager: it keeps a weak reference, and a manager whose last
/// outside handle is dropped stops resolving (lookups report it as not found).
/// Registering under an occupied tag replaces the old manager (see [`Self::try_register_manager`]
/// for the strict form). Dropping the factory clears all registrations.
#[derive(Default)]
pub struct ResourceFactory
{
    managers: RwLock<HashMap<ResourceTypeTag, Weak<dyn UntypedResourceManager>>>,
}
impl ResourceFactory
{
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Register `manager` under its own tag, returning whatever live manager was registered there before.
    /// Only a weak reference is kept, the caller stays responsible for keeping `manager` alive.
    pub fn register_manager(&self, manager: Arc<dyn UntypedResourceManager>) -> Option<Arc<dyn UntypedResourceManager>>
    {
        let type_tag = manager.type_tag();
        let replaced = self.managers.write()
            .insert(type_tag, Arc::downgrade(&manager))
            .and_then(|previous| previous.upgrade());
        match &replaced
        {
            Some(previous) => log::warn!("Replaced the '{type_tag}' resource manager (it still holds {} resource(s))", previous.len()),
            None => log::debug!("Registered the '{type_tag}' resource manager"),
        }
        replaced
    }

    /// Like [`Self::register_manager`] but refuses to replace a live registration
    pub fn try_register_manager(&self, manager: Arc<dyn UntypedResourceManager>) -> Result<(), ResourceError>
    {
        let type_tag = manager.type_tag();
        let mut managers = self.managers.write();
        if managers.get(&type_tag).is_some_and(|m| m.strong_count() > 0)
        {
            return Err(ResourceError::DuplicateRegistration(type_tag));
        }
        managers.insert(type_tag, Arc::downgrade(&manager));
        log::debug!("Registered the '{type_tag}' resource manager");
        Ok(())
    }

    /// Remove the registration for `type_tag`. The manager itself is untouched.
    pub fn unregister_manager(&self, type_tag: &str) -> Option<Arc<dyn UntypedResourceManager>>
    {
        self.managers.write().remove(type_tag).and_then(|m| m.upgrade())
    }

    pub fn lookup(&self, type_tag: &str) -> Result<Arc<dyn UntypedResourceManager>, ResourceError>
    {
        self.managers.read().get(type_tag).and_then(Weak::upgrade)
            .ok_or_else(|| ResourceError::manager_not_found(type_tag))
    }

    /// Lookup for callers that know which lifecycler implements the tag
    pub fn lookup_typed<L: ResourceLifecycler>(&self, type_tag: &str) -> Result<Arc<ResourceManager<L>>, ResourceError>
    {
        let manager = self.lookup(type_tag)?;
        let registered_tag = manager.type_tag();
        manager.into_any_arc().downcast::<ResourceManager<L>>().map_err(|_| ResourceError::TypeMismatch
        {
            type_tag: registered_tag,
            expected: ResourceManager::<L>::short_type_name(),
        })
    }

    /// Create (or fetch) `name` through whichever manager serves `type_tag`
    pub fn create(&self, type_tag: &str, name: &str, loader: &dyn ResourceLoader) -> Result<UntypedResource, ResourceError>
    {
        // don't hold the registry lock while a lifecycler runs
        let manager = self.lookup(type_tag)?;
        manager.create_untyped(name, loader)
    }

    /// Release `name` from the `type_tag` manager. False if either is missing.
    pub fn release(&self, type_tag: &str, name: &str) -> bool
    {
        match self.lookup(type_tag)
        {
            Ok(manager) => manager.release(name),
            Err(_) => false,
        }
    }

    #[must_use]
    pub fn contains(&self, type_tag: &str) -> bool { self.lookup(type_tag).is_ok() }

    fn live_managers(&self) -> Vec<Arc<dyn UntypedResourceManager>>
    {
        self.managers.read().values().filter_map(Weak::upgrade).collect()
    }

    // sorted, live managers only
    #[must_use]
    pub fn type_tags(&self) -> Vec<ResourceTypeTag>
    {
        let mut tags: Vec<_> = self.live_managers().iter().map(|m| m.type_tag()).collect();
        tags.sort_unstable();
        tags
    }

    #[must_use]
    pub fn len(&self) -> usize { self.managers.read().values().filter(|m| m.strong_count() > 0).count() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Drop every registration, managers are not destroyed
    pub fn clear(&self)
    {
        self.managers.write().clear();
    }
}
impl Drop for ResourceFactory
{
    fn drop(&mut self)
    {
        self.clear();
    }
}
impl DebugGui for ResourceFactory
{
    fn display_name(&self) -> &str { "Resources" }

    fn debug_gui(&self, ui: &mut Ui)
    {
        // snapshot so manager GUIs don't run under the registry lock
        let mut managers = self.live_managers();
        managers.sort_unstable_by_key(|m| m.type_tag());

        ui.label(format!("Registered managers: {}", managers.len()));
        for manager in managers
        {
            ui.collapsing(format!("{} ({} live)", manager.type_tag(), manager.len()), |cui|
            {
                cui.label(format!("{} from {}", manager.resource_type_name(), manager.loader_type_name()));
                manager.debug_gui(cui);
            });
        }
    }
}
