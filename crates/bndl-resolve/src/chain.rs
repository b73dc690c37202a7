//! Resolver registration and chain construction.
//!
//! Resolvers are looked up by name in a [`ResolverRegistry`], a table of
//! factories populated at startup. A chain is built fresh for every
//! operation: either the custom list from [`Settings::resolvers`] or one of
//! the built-in chains.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::error::{ResolutionError, ResolverError, Result};
use crate::repository::BundleRepository;
use crate::resolver::Resolver;
use crate::resolvers::{
    ContainerResolver, OfflineCacheResolver, RegistryResolver, StdinResolver, UriResolver,
};
use crate::settings::Settings;

/// Chain used when online.
pub const DEFAULT_CHAIN: [&str; 4] = [
    StdinResolver::NAME,
    UriResolver::NAME,
    RegistryResolver::NAME,
    ContainerResolver::ONLINE,
];

/// Chain used in offline mode.
pub const OFFLINE_CHAIN: [&str; 3] = [
    StdinResolver::NAME,
    OfflineCacheResolver::NAME,
    ContainerResolver::OFFLINE,
];

/// Builds a resolver from settings.
pub type ResolverFactory =
    Box<dyn Fn(&Settings) -> std::result::Result<Arc<dyn Resolver>, ResolverError> + Send + Sync>;

/// Table of resolver factories, keyed by resolver name.
pub struct ResolverRegistry {
    factories: BTreeMap<String, ResolverFactory>,
}

impl ResolverRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        ResolverRegistry {
            factories: BTreeMap::new(),
        }
    }

    /// A registry holding every built-in resolver.
    pub fn with_builtins() -> Self {
        let mut registry = ResolverRegistry::new();
        registry
            .register(StdinResolver::NAME, |_| Ok(Arc::new(StdinResolver::new())))
            .register(UriResolver::NAME, |settings| {
                let timeout = Duration::from_secs(settings.http.timeout_secs);
                Ok(Arc::new(UriResolver::new(timeout)))
            })
            .register(RegistryResolver::NAME, |settings| {
                let repository = BundleRepository::new(settings.repository_path());
                Ok(Arc::new(RegistryResolver::new(
                    repository,
                    settings.repository.org.clone(),
                )))
            })
            .register(ContainerResolver::ONLINE, |settings| {
                Ok(Arc::new(ContainerResolver::online(&settings.container.program)))
            })
            .register(OfflineCacheResolver::NAME, |settings| {
                Ok(Arc::new(OfflineCacheResolver::new(settings.cache_dir())))
            })
            .register(ContainerResolver::OFFLINE, |settings| {
                Ok(Arc::new(ContainerResolver::offline(&settings.container.program)))
            });
        registry
    }

    /// Register (or replace) the factory for `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&Settings) -> std::result::Result<Arc<dyn Resolver>, ResolverError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    /// Instantiate the resolver registered under `name`.
    pub fn load(&self, name: &str, settings: &Settings) -> Result<Arc<dyn Resolver>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ResolutionError::UnknownResolver {
                name: name.to_string(),
            })?;
        factory(settings).map_err(|source| ResolutionError::ResolverInit {
            name: name.to_string(),
            source,
        })
    }

    /// Build the resolver chain for one operation.
    ///
    /// A non-empty `resolvers` list in `settings` is used verbatim and wins
    /// over `offline`. Otherwise the offline or default chain is used,
    /// including when settings exist but name no resolvers.
    pub fn chain(&self, settings: Option<&Settings>, offline: bool) -> Result<Vec<Arc<dyn Resolver>>> {
        let defaults = Settings::default();
        let settings = settings.unwrap_or(&defaults);

        if let Some(names) = settings.resolvers().filter(|names| !names.is_empty()) {
            info!(resolvers = ?names, "using custom bundle resolver chain");
            return names.iter().map(|name| self.load(name, settings)).collect();
        }

        let names: &[&str] = if offline { &OFFLINE_CHAIN } else { &DEFAULT_CHAIN };
        names.iter().map(|name| self.load(name, settings)).collect()
    }
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        ResolverRegistry::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(chain: &[Arc<dyn Resolver>]) -> Vec<&str> {
        chain.iter().map(|r| r.name()).collect()
    }

    fn custom(resolvers: &[&str]) -> Settings {
        Settings {
            resolvers: Some(resolvers.iter().map(|s| s.to_string()).collect()),
            ..Settings::default()
        }
    }

    #[test]
    fn builtin_names_load_matching_resolvers() {
        let registry = ResolverRegistry::with_builtins();
        let settings = Settings::default();

        for name in DEFAULT_CHAIN.iter().chain(OFFLINE_CHAIN.iter()) {
            assert_eq!(registry.load(name, &settings).unwrap().name(), *name);
        }
    }

    #[test]
    fn default_and_offline_chains() {
        let registry = ResolverRegistry::with_builtins();

        let chain = registry.chain(None, false).unwrap();
        assert_eq!(names(&chain), DEFAULT_CHAIN);

        let chain = registry.chain(None, true).unwrap();
        assert_eq!(names(&chain), OFFLINE_CHAIN);
    }

    #[test]
    fn settings_without_resolvers_fall_back_to_builtin_chains() {
        let registry = ResolverRegistry::with_builtins();
        let settings = Settings::parse("[repository]\norg = \"typesafe\"\n").unwrap();

        let chain = registry.chain(Some(&settings), false).unwrap();
        assert_eq!(names(&chain), DEFAULT_CHAIN);

        let chain = registry.chain(Some(&custom(&[])), true).unwrap();
        assert_eq!(names(&chain), OFFLINE_CHAIN);
    }

    #[test]
    fn custom_chain_overrides_offline_mode() {
        let registry = ResolverRegistry::with_builtins();
        let settings = custom(&["uri", "stdin", "uri"]);

        let chain = registry.chain(Some(&settings), true).unwrap();
        assert_eq!(names(&chain), vec!["uri", "stdin", "uri"]);
    }

    #[test]
    fn unknown_resolver_is_fatal() {
        let registry = ResolverRegistry::with_builtins();
        let settings = custom(&["stdin", "bintray"]);

        let err = registry.chain(Some(&settings), false).unwrap_err();
        assert!(matches!(err, ResolutionError::UnknownResolver { ref name } if name == "bintray"));
    }

    #[test]
    fn factory_failure_is_fatal() {
        let mut registry = ResolverRegistry::new();
        registry.register("broken", |_| {
            Err(ResolverError::EmptyInput {
                source_name: "factory".to_string(),
            })
        });

        let err = registry.chain(Some(&custom(&["broken"])), false).unwrap_err();
        assert!(matches!(err, ResolutionError::ResolverInit { ref name, .. } if name == "broken"));
    }

    #[test]
    fn registered_factory_receives_settings() {
        let mut registry = ResolverRegistry::with_builtins();
        registry.register("x_resolver", |settings| {
            Ok(Arc::new(RegistryResolver::new(
                BundleRepository::new(settings.repository_path()),
                None,
            )))
        });

        let chain = registry.chain(Some(&custom(&["x_resolver"])), true).unwrap();
        assert_eq!(names(&chain), vec!["registry"]);
    }
}
