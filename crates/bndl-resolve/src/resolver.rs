//! The resolver capability.
//!
//! A `Resolver` knows how to locate bundles, bundle configurations and
//! bundle versions from one kind of source. The engine never inspects a
//! URI itself: it offers each URI to every resolver in chain order and each
//! resolver decides whether the URI is its concern.
//!
//! Every lookup returns one of three outcomes:
//! - `Ok(Some(_))`: resolved; the chain stops here.
//! - `Ok(None)`: not recognized or not found; the chain moves on silently.
//! - `Err(_)`: recognized but failed; recorded, and the chain moves on.

use std::path::{Path, PathBuf};

use crate::error::ResolverError;
use crate::version::BundleVersion;

/// Where a resolved artifact lives. Opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactHandle {
    /// A file on the local filesystem.
    File(PathBuf),
    /// Artifact contents held in memory.
    Bytes(Vec<u8>),
}

/// A resolved bundle or bundle configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// File name of the artifact.
    pub file_name: String,
    /// Artifact location or contents.
    pub handle: ArtifactHandle,
}

impl Resolved {
    pub fn file(file_name: impl Into<String>, path: PathBuf) -> Self {
        Resolved {
            file_name: file_name.into(),
            handle: ArtifactHandle::File(path),
        }
    }

    pub fn bytes(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Resolved {
            file_name: file_name.into(),
            handle: ArtifactHandle::Bytes(data),
        }
    }
}

/// Outcome of a single resolver lookup.
pub type Lookup = Result<Option<Resolved>, ResolverError>;

/// The two artifact kinds a resolver materializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Bundle,
    Configuration,
}

impl ArtifactKind {
    /// File name used when the artifact is stored in a repository or cache.
    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactKind::Bundle => "bundle.zip",
            ArtifactKind::Configuration => "config.zip",
        }
    }

    /// Cache-phase lookup of this kind on `resolver`.
    pub fn load_from_cache(&self, resolver: &dyn Resolver, cache_dir: &Path, uri: &str) -> Lookup {
        match self {
            ArtifactKind::Bundle => resolver.load_bundle_from_cache(cache_dir, uri),
            ArtifactKind::Configuration => {
                resolver.load_bundle_configuration_from_cache(cache_dir, uri)
            }
        }
    }

    /// Network-phase resolution of this kind on `resolver`.
    pub fn resolve(&self, resolver: &dyn Resolver, cache_dir: &Path, uri: &str) -> Lookup {
        match self {
            ArtifactKind::Bundle => resolver.resolve_bundle(cache_dir, uri),
            ArtifactKind::Configuration => resolver.resolve_bundle_configuration(cache_dir, uri),
        }
    }
}

/// A source of bundles.
///
/// Implementations must be cheap to call with URIs they do not understand:
/// an unrecognized URI is `Ok(None)`, never an error.
pub trait Resolver: Send + Sync {
    /// Stable name; the key this resolver is registered under.
    fn name(&self) -> &str;

    /// Look for an already materialized bundle.
    fn load_bundle_from_cache(&self, cache_dir: &Path, uri: &str) -> Lookup;

    /// Fetch the bundle from this resolver's source.
    fn resolve_bundle(&self, cache_dir: &Path, uri: &str) -> Lookup;

    /// Look for an already materialized bundle configuration.
    fn load_bundle_configuration_from_cache(&self, cache_dir: &Path, uri: &str) -> Lookup;

    /// Fetch the bundle configuration from this resolver's source.
    fn resolve_bundle_configuration(&self, cache_dir: &Path, uri: &str) -> Lookup;

    /// Resolve the version `uri` refers to.
    fn resolve_bundle_version(&self, _uri: &str) -> Result<Option<BundleVersion>, ResolverError> {
        Ok(None)
    }

    /// Derive a continuous delivery URI from a version this resolver produced.
    fn continuous_delivery_uri(&self, _version: &BundleVersion) -> Option<String> {
        None
    }
}

impl std::fmt::Debug for dyn Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Resolver({})", self.name())
    }
}
