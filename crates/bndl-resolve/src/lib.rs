//! Bundle resolution for the bndl toolchain.
//!
//! Turns a bundle URI into a locally usable artifact by consulting an
//! ordered chain of pluggable resolvers. Handles bundles, bundle
//! configurations, bundle versions, and continuous delivery URIs.
//!
//! # Architecture
//!
//! - **Resolvers**: one per kind of source (stdin, URIs, the bundle
//!   repository, container images, the offline cache)
//! - **Registry**: name → factory table the chain is built from
//! - **Engine**: first-success iteration over the chain, cache pass
//!   before network pass, with per-pass error collection
//!
//! Downloaded and fetched artifacts are kept in a versioned cache with
//! SHA-256 integrity records.

pub mod cache;
pub mod chain;
pub mod engine;
pub mod error;
pub mod integrity;
pub mod reference;
pub mod repository;
pub mod resolver;
pub mod resolvers;
pub mod settings;
pub mod version;

// Re-exports for convenience.
pub use cache::{BundleCache, CacheEntry};
pub use chain::{ResolverRegistry, DEFAULT_CHAIN, OFFLINE_CHAIN};
pub use engine::ResolutionEngine;
pub use error::{Phase, ResolutionError, ResolverError, ResolverFailure, Result};
pub use integrity::ContentHash;
pub use reference::BundleRef;
pub use repository::BundleRepository;
pub use resolver::{ArtifactHandle, ArtifactKind, Lookup, Resolved, Resolver};
pub use settings::Settings;
pub use version::{BundleVersion, Version, VersionReq};
