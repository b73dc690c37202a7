//! The resolution engine.
//!
//! Every operation offers its request to each resolver of the active chain
//! in order and stops at the first success. Bundle and configuration
//! resolution run two passes: a cache pass over the whole chain, then a
//! network pass over the whole chain. Resolver errors are recorded per pass
//! and only surface if nothing succeeds.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::chain::ResolverRegistry;
use crate::error::{ResolutionError, ResolverError, ResolverFailure, Result};
use crate::resolver::{ArtifactKind, Resolved, Resolver};
use crate::settings::Settings;
use crate::version::BundleVersion;

/// Runs resolution operations over chains built from a [`ResolverRegistry`].
pub struct ResolutionEngine {
    registry: ResolverRegistry,
}

impl ResolutionEngine {
    pub fn new(registry: ResolverRegistry) -> Self {
        ResolutionEngine { registry }
    }

    /// The chain an operation would use.
    pub fn chain(&self, settings: Option<&Settings>, offline: bool) -> Result<Vec<Arc<dyn Resolver>>> {
        self.registry.chain(settings, offline)
    }

    /// Resolve a bundle, trying every cache before any network source.
    pub fn resolve_bundle(
        &self,
        settings: Option<&Settings>,
        cache_dir: &Path,
        uri: &str,
        offline: bool,
    ) -> Result<Resolved> {
        self.resolve_artifact(ArtifactKind::Bundle, settings, cache_dir, uri, offline)
    }

    /// Resolve a bundle configuration, trying every cache before any
    /// network source.
    pub fn resolve_bundle_configuration(
        &self,
        settings: Option<&Settings>,
        cache_dir: &Path,
        uri: &str,
        offline: bool,
    ) -> Result<Resolved> {
        self.resolve_artifact(ArtifactKind::Configuration, settings, cache_dir, uri, offline)
    }

    /// Resolve the version `uri` refers to.
    pub fn resolve_bundle_version(
        &self,
        settings: Option<&Settings>,
        uri: &str,
        offline: bool,
    ) -> Result<BundleVersion> {
        let chain = self.chain(settings, offline)?;

        let mut resolution_errors = Vec::new();
        if let Some(version) = first_success(&chain, "version", &mut resolution_errors, |r| {
            r.resolve_bundle_version(uri)
        }) {
            return Ok(version);
        }

        Err(ResolutionError::BundleResolution {
            uri: uri.to_string(),
            cache_errors: Vec::new(),
            resolution_errors,
        })
    }

    /// Derive a continuous delivery URI from a resolved version.
    pub fn continuous_delivery_uri(
        &self,
        settings: Option<&Settings>,
        version: &BundleVersion,
        offline: bool,
    ) -> Result<String> {
        let chain = self.chain(settings, offline)?;

        // Derivation cannot fail per resolver, so nothing is ever recorded.
        let mut unused = Vec::new();
        first_success(&chain, "cd-uri", &mut unused, |r| {
            Ok(r.continuous_delivery_uri(version))
        })
        .ok_or_else(|| ResolutionError::ContinuousDelivery {
            version: version.to_string(),
        })
    }

    fn resolve_artifact(
        &self,
        kind: ArtifactKind,
        settings: Option<&Settings>,
        cache_dir: &Path,
        uri: &str,
        offline: bool,
    ) -> Result<Resolved> {
        let chain = self.chain(settings, offline)?;

        let mut cache_errors = Vec::new();
        if let Some(resolved) = first_success(&chain, "cache", &mut cache_errors, |r| {
            kind.load_from_cache(r, cache_dir, uri)
        }) {
            return Ok(resolved);
        }

        let mut resolution_errors = Vec::new();
        if let Some(resolved) = first_success(&chain, "network", &mut resolution_errors, |r| {
            kind.resolve(r, cache_dir, uri)
        }) {
            return Ok(resolved);
        }

        Err(ResolutionError::BundleResolution {
            uri: uri.to_string(),
            cache_errors,
            resolution_errors,
        })
    }
}

impl Default for ResolutionEngine {
    fn default() -> Self {
        ResolutionEngine::new(ResolverRegistry::with_builtins())
    }
}

/// Try each resolver in order and return the first success.
///
/// Errors are appended to `failures` and never stop the iteration.
fn first_success<T, F>(
    chain: &[Arc<dyn Resolver>],
    phase: &str,
    failures: &mut Vec<ResolverFailure>,
    mut attempt: F,
) -> Option<T>
where
    F: FnMut(&dyn Resolver) -> std::result::Result<Option<T>, ResolverError>,
{
    for resolver in chain {
        debug!(resolver = resolver.name(), phase, "trying resolver");
        match attempt(resolver.as_ref()) {
            Ok(Some(value)) => {
                info!(resolver = resolver.name(), phase, "resolved");
                return Some(value);
            }
            Ok(None) => {}
            Err(error) => {
                warn!(resolver = resolver.name(), phase, %error, "resolver failed");
                failures.push(ResolverFailure {
                    resolver: resolver.name().to_string(),
                    error,
                });
            }
        }
    }
    None
}
