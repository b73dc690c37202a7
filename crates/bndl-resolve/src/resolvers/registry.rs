//! Resolves bundle references (`[org/]name[:requirement]`) against a
//! [`BundleRepository`], caching fetched artifacts in the [`BundleCache`].

use std::path::Path;

use tracing::debug;

use super::cached_reference;
use crate::cache::BundleCache;
use crate::error::ResolverError;
use crate::integrity::ContentHash;
use crate::reference::BundleRef;
use crate::repository::BundleRepository;
use crate::resolver::{ArtifactKind, Lookup, Resolved, Resolver};
use crate::version::BundleVersion;

pub struct RegistryResolver {
    repository: BundleRepository,
    org: Option<String>,
}

impl RegistryResolver {
    pub const NAME: &'static str = "registry";

    pub fn new(repository: BundleRepository, org: Option<String>) -> Self {
        RegistryResolver { repository, org }
    }

    fn fetch(&self, cache_dir: &Path, uri: &str, kind: ArtifactKind) -> Lookup {
        let Some(reference) = BundleRef::recognize(uri)? else {
            return Ok(None);
        };
        let Some(version) = self
            .repository
            .best_version(&reference.name, &reference.requirement)?
        else {
            return Ok(None);
        };
        let Some(data) = self.repository.fetch(&reference.name, &version, kind)? else {
            return Ok(None);
        };

        debug!(bundle = %reference.name, %version, "caching {}", kind.file_name());
        let entry = BundleCache::new(cache_dir).store(
            &reference.name,
            &version.to_string(),
            kind,
            &data,
        )?;
        Ok(Some(Resolved::file(entry.display_name(kind), entry.path)))
    }
}

impl Resolver for RegistryResolver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn load_bundle_from_cache(&self, cache_dir: &Path, uri: &str) -> Lookup {
        cached_reference(cache_dir, uri, ArtifactKind::Bundle)
    }

    fn resolve_bundle(&self, cache_dir: &Path, uri: &str) -> Lookup {
        self.fetch(cache_dir, uri, ArtifactKind::Bundle)
    }

    fn load_bundle_configuration_from_cache(&self, cache_dir: &Path, uri: &str) -> Lookup {
        cached_reference(cache_dir, uri, ArtifactKind::Configuration)
    }

    fn resolve_bundle_configuration(&self, cache_dir: &Path, uri: &str) -> Lookup {
        self.fetch(cache_dir, uri, ArtifactKind::Configuration)
    }

    fn resolve_bundle_version(&self, uri: &str) -> Result<Option<BundleVersion>, ResolverError> {
        let Some(reference) = BundleRef::recognize(uri)? else {
            return Ok(None);
        };
        let Some(version) = self
            .repository
            .best_version(&reference.name, &reference.requirement)?
        else {
            return Ok(None);
        };

        let digest = match self
            .repository
            .artifact_path(&reference.name, &version, ArtifactKind::Bundle)
        {
            Some(path) => Some(ContentHash::of_file(&path)?.to_string()),
            None => None,
        };

        Ok(Some(BundleVersion {
            resolver: Self::NAME.to_string(),
            org: reference.org.or_else(|| self.org.clone()),
            package_name: reference.name,
            tag: version.to_string(),
            digest,
        }))
    }

    fn continuous_delivery_uri(&self, version: &BundleVersion) -> Option<String> {
        if version.resolver != Self::NAME {
            return None;
        }
        Some(match &version.org {
            Some(org) => format!("deploy/{org}/{}", version.package_name),
            None => format!("deploy/{}", version.package_name),
        })
    }
}
