//! Local bundle cache.
//!
//! Stores bundles and bundle configurations fetched from a repository so
//! the cache phase can serve them without touching the source again.
//!
//! Layout:
//! ```text
//! <cache_dir>/
//!   <bundle-name>/
//!     <version>/
//!       bundle.zip      — Bundle archive
//!       config.zip      — Bundle configuration (optional)
//!       integrity.json  — SHA-256 per stored file
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ResolverError;
use crate::integrity::ContentHash;
use crate::resolver::ArtifactKind;
use crate::version::{self, Version, VersionReq};

const INTEGRITY_FILE: &str = "integrity.json";

/// A bundle cache backed by the filesystem.
#[derive(Debug, Clone)]
pub struct BundleCache {
    root: PathBuf,
}

/// A cached artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Path to the cached file.
    pub path: PathBuf,
    /// Bundle name.
    pub name: String,
    /// Bundle version.
    pub version: String,
}

impl CacheEntry {
    /// File name presented to callers, e.g. `visualizer-1.0.0.zip`.
    pub fn display_name(&self, kind: ArtifactKind) -> String {
        match kind {
            ArtifactKind::Bundle => format!("{}-{}.zip", self.name, self.version),
            ArtifactKind::Configuration => format!("{}-{}-config.zip", self.name, self.version),
        }
    }
}

impl BundleCache {
    /// Create a cache rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        BundleCache { root: root.into() }
    }

    /// Check if an artifact is cached.
    pub fn contains(&self, name: &str, version: &str, kind: ArtifactKind) -> bool {
        self.bundle_dir(name, version).join(kind.file_name()).is_file()
    }

    /// Get the cache entry for an artifact, if it exists.
    pub fn get(&self, name: &str, version: &str, kind: ArtifactKind) -> Option<CacheEntry> {
        if !self.contains(name, version, kind) {
            return None;
        }
        Some(CacheEntry {
            path: self.bundle_dir(name, version).join(kind.file_name()),
            name: name.to_string(),
            version: version.to_string(),
        })
    }

    /// Highest cached version of `name` satisfying `req` that has `kind`.
    pub fn find(
        &self,
        name: &str,
        req: &VersionReq,
        kind: ArtifactKind,
    ) -> Result<Option<CacheEntry>, ResolverError> {
        let versions: Vec<Version> = version::parse_all(self.list_versions(name)?)
            .into_iter()
            .filter(|v| self.contains(name, &v.to_string(), kind))
            .collect();
        Ok(version::resolve_best(&versions, req)
            .and_then(|v| self.get(name, &v.to_string(), kind)))
    }

    /// Store an artifact and record its digest.
    pub fn store(
        &self,
        name: &str,
        version: &str,
        kind: ArtifactKind,
        data: &[u8],
    ) -> Result<CacheEntry, ResolverError> {
        let dir = self.bundle_dir(name, version);
        std::fs::create_dir_all(&dir).map_err(|e| ResolverError::Cache {
            path: dir.clone(),
            detail: format!("creating cache dir: {e}"),
        })?;

        let path = dir.join(kind.file_name());
        std::fs::write(&path, data).map_err(|e| ResolverError::Cache {
            path: path.clone(),
            detail: format!("writing {}: {e}", kind.file_name()),
        })?;

        let mut records = self.read_integrity(&dir)?;
        records.insert(
            kind.file_name().to_string(),
            ContentHash::compute(data).as_str().to_string(),
        );
        let integrity_path = dir.join(INTEGRITY_FILE);
        std::fs::write(&integrity_path, serde_json::to_string_pretty(&records)?).map_err(|e| {
            ResolverError::Cache {
                path: integrity_path,
                detail: format!("writing integrity: {e}"),
            }
        })?;

        Ok(CacheEntry {
            path,
            name: name.to_string(),
            version: version.to_string(),
        })
    }

    /// List all cached versions of a bundle.
    pub fn list_versions(&self, name: &str) -> Result<Vec<String>, ResolverError> {
        let bundle_dir = self.root.join(name);
        if !bundle_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut versions = Vec::new();
        for entry in std::fs::read_dir(&bundle_dir).map_err(|e| ResolverError::Cache {
            path: bundle_dir.clone(),
            detail: format!("listing versions: {e}"),
        })? {
            let entry = entry.map_err(|e| ResolverError::Cache {
                path: bundle_dir.clone(),
                detail: format!("reading entry: {e}"),
            })?;
            if entry.path().is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    versions.push(name.to_string());
                }
            }
        }
        versions.sort();
        Ok(versions)
    }

    /// Check a cached artifact against its recorded digest.
    pub fn verify_integrity(&self, entry: &CacheEntry) -> Result<(), ResolverError> {
        let dir = self.bundle_dir(&entry.name, &entry.version);
        let records = self.read_integrity(&dir)?;

        let file_name = entry
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let actual = ContentHash::of_file(&entry.path).map_err(|e| ResolverError::Cache {
            path: entry.path.clone(),
            detail: format!("reading {file_name}: {e}"),
        })?;

        match records.get(file_name) {
            Some(expected) if expected == actual.as_str() => Ok(()),
            expected => Err(ResolverError::Integrity {
                name: entry.name.clone(),
                version: entry.version.clone(),
                expected: expected.cloned().unwrap_or_else(|| "no record".to_string()),
                actual: actual.to_string(),
            }),
        }
    }

    /// Recorded digest of a cached artifact.
    pub fn digest(&self, entry: &CacheEntry) -> Result<Option<String>, ResolverError> {
        let dir = self.bundle_dir(&entry.name, &entry.version);
        let records = self.read_integrity(&dir)?;
        let file_name = entry.path.file_name().and_then(|n| n.to_str());
        Ok(file_name.and_then(|n| records.get(n).cloned()))
    }

    fn read_integrity(&self, dir: &Path) -> Result<BTreeMap<String, String>, ResolverError> {
        let path = dir.join(INTEGRITY_FILE);
        if !path.is_file() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| ResolverError::Cache {
            path: path.clone(),
            detail: format!("reading integrity: {e}"),
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    fn bundle_dir(&self, name: &str, version: &str) -> PathBuf {
        self.root.join(name).join(version)
    }
}
