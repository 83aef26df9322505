use super::*;
use debug_kiln::debug_gui::DebugGui;
use egui::Ui;
use nab_kiln::utils::ShortTypeName;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

pub type UntypedResource = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResourceManagerStats
{
    pub live: usize,
    pub created: usize,
    pub freed: usize,
    pub hits: usize,
    pub failures: usize,
}

struct ResourceCache<R>
{
    resources: HashMap<String, Arc<R>>,
    created: usize,
    freed: usize,
    hits: usize,
    failures: usize,
}

/// Owns every resource of one type, keyed by name.
///
/// At most one resource is constructed per name until it is released; the cache lock is held
/// across lookup and construction so racing creates of the same name build it once.
/// Dropping the manager frees everything still cached.
pub struct ResourceManager<L: ResourceLifecycler>
{
    lifecycler: L,
    cache: Mutex<ResourceCache<L::Resource>>,
}
impl<L: ResourceLifecycler> ResourceManager<L>
{
    #[must_use]
    pub fn new(lifecycler: L) -> Self
    {
        Self
        {
            lifecycler,
            cache: Mutex::new(ResourceCache
            {
                resources: HashMap::new(),
                created: 0,
                freed: 0,
                hits: 0,
                failures: 0,
            }),
        }
    }

    #[inline] #[must_use]
    pub fn type_tag(&self) -> ResourceTypeTag { L::Resource::resource_type() }

    #[inline] #[must_use]
    pub fn lifecycler(&self) -> &L { &self.lifecycler }

    /// Fetch `name`, creating it from `loader` if it isn't cached. The loader is ignored on a hit.
    #[inline]
    pub fn create(&self, name: &str, loader: &L::Loader) -> Result<Arc<L::Resource>, ResourceError>
    {
        self.create_or_get(name, loader).map(|(resource, _)| resource)
    }

    /// Like [`Self::create`], also reporting whether this call constructed the resource (false on a cache hit).
    /// Decided under the same lock as the lookup, so racing callers never both see `true`.
    pub fn create_or_get(&self, name: &str, loader: &L::Loader) -> Result<(Arc<L::Resource>, bool), ResourceError>
    {
        if name.is_empty()
        {
            return Err(ResourceError::InvalidName { type_tag: self.type_tag() });
        }

        let mut cache = self.cache.lock();

        if let Some(existing) = cache.resources.get(name).cloned()
        {
            cache.hits += 1;
            return Ok((existing, false));
        }

        let resource = match self.lifecycler.create_impl(name, loader)
        {
            Ok(resource) => resource,
            Err(reason) =>
            {
                cache.failures += 1;
                log::warn!("Failed to create {} '{name}' from {loader:?}: {reason}", self.type_tag());
                return Err(ResourceError::Creation { type_tag: self.type_tag(), name: name.to_string(), reason });
            }
        };

        let resource = Arc::new(resource);
        if resource.name() != name
        {
            let created_name = resource.name().to_string();
            cache.failures += 1;
            drop(cache);
            self.lifecycler.free_impl(resource);
            return Err(ResourceError::Creation
            {
                type_tag: self.type_tag(),
                name: name.to_string(),
                reason: format!("{} created a resource named '{created_name}'", L::short_type_name()).into(),
            });
        }

        cache.resources.insert(name.to_string(), resource.clone());
        cache.created += 1;
        log::debug!("Created {} '{name}'", self.type_tag());
        Ok((resource, true))
    }

    /// Query-only lookup, never creates
    pub fn get(&self, name: &str) -> Result<Arc<L::Resource>, ResourceError>
    {
        self.try_get(name).ok_or_else(|| ResourceError::resource_not_found(self.type_tag(), name))
    }

    #[must_use]
    pub fn try_get(&self, name: &str) -> Option<Arc<L::Resource>>
    {
        self.cache.lock().resources.get(name).cloned()
    }

    /// Evict and free `name`. Returns false (and does nothing) if it isn't cached.
    pub fn release(&self, name: &str) -> bool
    {
        let removed =
        {
            let mut cache = self.cache.lock();
            let removed = cache.resources.remove(name);
            if removed.is_some() { cache.freed += 1; }
            removed
        };

        match removed
        {
            None => false,
            Some(resource) =>
            {
                log::debug!("Releasing {} '{name}'", self.type_tag());
                self.lifecycler.free_impl(resource);
                true
            }
        }
    }

    #[inline]
    pub fn destroy(&self, name: &str) -> bool { self.release(name) }

    /// Release `name` only if it is still `instance`. False if it was released or replaced meanwhile.
    pub fn release_instance(&self, name: &str, instance: &Arc<L::Resource>) -> bool
    {
        let removed =
        {
            let mut cache = self.cache.lock();
            match cache.resources.get(name)
            {
                Some(cached) if Arc::ptr_eq(cached, instance) =>
                {
                    cache.freed += 1;
                    cache.resources.remove(name)
                },
                _ => None,
            }
        };

        match removed
        {
            None => false,
            Some(resource) =>
            {
                log::debug!("Releasing {} '{name}'", self.type_tag());
                self.lifecycler.free_impl(resource);
                true
            }
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool { self.cache.lock().resources.contains_key(name) }

    #[must_use]
    pub fn len(&self) -> usize { self.cache.lock().resources.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    // sorted
    #[must_use]
    pub fn names(&self) -> Vec<String>
    {
        let mut names: Vec<_> = self.cache.lock().resources.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn stats(&self) -> ResourceManagerStats
    {
        let cache = self.cache.lock();
        ResourceManagerStats
        {
            live: cache.resources.len(),
            created: cache.created,
            freed: cache.freed,
            hits: cache.hits,
            failures: cache.failures,
        }
    }

    /// Free every cached resource, returns how many were freed
    pub fn clear(&self) -> usize
    {
        let drained: Vec<_> =
        {
            let mut cache = self.cache.lock();
            let drained: Vec<_> = cache.resources.drain().collect();
            cache.freed += drained.len();
            drained
        };

        let count = drained.len();
        for (_, resource) in drained
        {
            self.lifecycler.free_impl(resource);
        }
        count
    }
}
impl<L: ResourceLifecycler> Drop for ResourceManager<L>
{
    fn drop(&mut self)
    {
        let still_shared =
        {
            let cache = self.cache.lock();
            cache.resources.values().filter(|r| Arc::strong_count(r) > 1).count()
        };
        if still_shared > 0
        {
            log::warn!("{still_shared} {} resource(s) are still referenced outside their manager at shutdown", self.type_tag());
        }

        let freed = self.clear();
        if freed > 0
        {
            log::debug!("Freed {freed} {} resource(s) at shutdown", self.type_tag());
        }
    }
}
impl<L: ResourceLifecycler> Debug for ResourceManager<L>
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result
    {
        f.debug_struct("ResourceManager")
            .field("type_tag", &self.type_tag())
            .field("lifecycler", &L::short_type_name())
            .field("stats", &self.stats())
            .finish()
    }
}
impl<L: ResourceLifecycler> DebugGui for ResourceManager<L>
{
    fn display_name(&self) -> &str { self.type_tag().as_str() }

    fn debug_gui(&self, ui: &mut Ui)
    {
        let stats = self.stats();
        ui.label(format!("Live: {}", stats.live));
        ui.label(format!("Created: {}  Freed: {}", stats.created, stats.freed));
        ui.label(format!("Cache hits: {}  Failures: {}", stats.hits, stats.failures));

        self.lifecycler.debug_gui(ui);

        ui.separator();
        ui.collapsing("Resources", |cui|
        {
            for name in self.names()
            {
                cui.label(name);
            }
        });
    }
}

/// Object-safe view of any [`ResourceManager`], used by the factory to dispatch by tag
pub trait UntypedResourceManager: Send + Sync + DebugGui + 'static
{
    fn type_tag(&self) -> ResourceTypeTag;
    fn resource_type_name(&self) -> &'static str;
    fn loader_type_name(&self) -> &'static str;

    /// Fails with a creation error if `loader` is not this manager's loader type
    fn create_untyped(&self, name: &str, loader: &dyn ResourceLoader) -> Result<UntypedResource, ResourceError>;
    fn get_untyped(&self, name: &str) -> Result<UntypedResource, ResourceError>;
    fn release(&self, name: &str) -> bool;
    fn contains(&self, name: &str) -> bool;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool { self.len() == 0 }
    fn names(&self) -> Vec<String>;
    fn stats(&self) -> ResourceManagerStats;
    fn clear(&self) -> usize;

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}
impl<L: ResourceLifecycler> UntypedResourceManager for ResourceManager<L>
{
    fn type_tag(&self) -> ResourceTypeTag { Self::type_tag(self) }
    fn resource_type_name(&self) -> &'static str { L::Resource::short_type_name() }
    fn loader_type_name(&self) -> &'static str { L::Loader::short_type_name() }

    fn create_untyped(&self, name: &str, loader: &dyn ResourceLoader) -> Result<UntypedResource, ResourceError>
    {
        let Some(typed_loader) = downcast_loader::<L::Loader>(loader) else
        {
            return Err(ResourceError::Creation
            {
                type_tag: Self::type_tag(self),
                name: name.to_string(),
                reason: Box::new(ResourceError::LoaderMismatch
                {
                    type_tag: Self::type_tag(self),
                    expected: L::Loader::short_type_name(),
                }),
            });
        };
        let resource: UntypedResource = Self::create(self, name, typed_loader)?;
        Ok(resource)
    }

    fn get_untyped(&self, name: &str) -> Result<UntypedResource, ResourceError>
    {
        let resource: UntypedResource = Self::get(self, name)?;
        Ok(resource)
    }

    fn release(&self, name: &str) -> bool { Self::release(self, name) }
    fn contains(&self, name: &str) -> bool { Self::contains(self, name) }
    fn len(&self) -> usize { Self::len(self) }
    fn names(&self) -> Vec<String> { Self::names(self) }
    fn stats(&self) -> ResourceManagerStats { Self::stats(self) }
    fn clear(&self) -> usize { Self::clear(self) }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> { self }
}
