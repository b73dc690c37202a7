//! Offline counterpart of `uri` and `registry`: serves bundle references
//! from the bundle cache and otherwise accepts only local files.

use std::path::{Path, PathBuf};

use super::{cached_reference, local_file};
use crate::cache::BundleCache;
use crate::error::ResolverError;
use crate::reference::BundleRef;
use crate::resolver::{ArtifactKind, Lookup, Resolver};
use crate::version::BundleVersion;

pub struct OfflineCacheResolver {
    cache_dir: PathBuf,
}

impl OfflineCacheResolver {
    pub const NAME: &'static str = "offline-cache";

    /// `cache_dir` is consulted when resolving versions, which carry no
    /// cache directory of their own.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        OfflineCacheResolver {
            cache_dir: cache_dir.into(),
        }
    }
}

impl Resolver for OfflineCacheResolver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn load_bundle_from_cache(&self, cache_dir: &Path, uri: &str) -> Lookup {
        cached_reference(cache_dir, uri, ArtifactKind::Bundle)
    }

    fn resolve_bundle(&self, _cache_dir: &Path, uri: &str) -> Lookup {
        local_file(uri)
    }

    fn load_bundle_configuration_from_cache(&self, cache_dir: &Path, uri: &str) -> Lookup {
        cached_reference(cache_dir, uri, ArtifactKind::Configuration)
    }

    fn resolve_bundle_configuration(&self, _cache_dir: &Path, uri: &str) -> Lookup {
        local_file(uri)
    }

    fn resolve_bundle_version(&self, uri: &str) -> Result<Option<BundleVersion>, ResolverError> {
        let Some(reference) = BundleRef::recognize(uri)? else {
            return Ok(None);
        };

        let cache = BundleCache::new(&self.cache_dir);
        let Some(entry) = cache.find(&reference.name, &reference.requirement, ArtifactKind::Bundle)?
        else {
            return Ok(None);
        };

        Ok(Some(BundleVersion {
            resolver: Self::NAME.to_string(),
            org: reference.org,
            digest: cache.digest(&entry)?,
            package_name: entry.name,
            tag: entry.version,
        }))
    }
}
