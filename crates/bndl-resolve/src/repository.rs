//! Filesystem bundle repository.
//!
//! The repository is the network-phase source of the `registry` resolver.
//! It is a plain directory tree, so it can live on a shared mount:
//!
//! ```text
//! <root>/
//!   <bundle-name>/
//!     <version>/
//!       bundle.zip
//!       config.zip   (optional)
//! ```

use std::path::PathBuf;

use crate::error::ResolverError;
use crate::resolver::ArtifactKind;
use crate::version::{self, Version, VersionReq};

/// A bundle repository rooted at a directory.
#[derive(Debug, Clone)]
pub struct BundleRepository {
    root: PathBuf,
}

impl BundleRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        BundleRepository { root: root.into() }
    }

    /// Sorted versions published for `name`.
    pub fn list_versions(&self, name: &str) -> Result<Vec<Version>, ResolverError> {
        let bundle_dir = self.root.join(name);
        if !bundle_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&bundle_dir)? {
            let entry = entry?;
            if entry.path().join(ArtifactKind::Bundle.file_name()).is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        Ok(version::parse_all(names))
    }

    /// Highest published version of `name` satisfying `req`.
    pub fn best_version(&self, name: &str, req: &VersionReq) -> Result<Option<Version>, ResolverError> {
        Ok(version::resolve_best(&self.list_versions(name)?, req))
    }

    /// Path of a published artifact, if present.
    pub fn artifact_path(&self, name: &str, version: &Version, kind: ArtifactKind) -> Option<PathBuf> {
        let path = self.version_dir(name, version).join(kind.file_name());
        path.is_file().then_some(path)
    }

    /// Read a published artifact. A missing artifact is `Ok(None)`.
    pub fn fetch(
        &self,
        name: &str,
        version: &Version,
        kind: ArtifactKind,
    ) -> Result<Option<Vec<u8>>, ResolverError> {
        match self.artifact_path(name, version, kind) {
            Some(path) => Ok(Some(std::fs::read(path)?)),
            None => Ok(None),
        }
    }

    /// Publish a bundle and, optionally, its configuration.
    ///
    /// Published versions are immutable: publishing an existing version fails.
    #[cfg(test)]
    pub(crate) fn publish(
        &self,
        name: &str,
        version: &Version,
        bundle: &[u8],
        configuration: Option<&[u8]>,
    ) -> Result<(), ResolverError> {
        let dir = self.version_dir(name, version);
        if dir.join(ArtifactKind::Bundle.file_name()).is_file() {
            return Err(ResolverError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{name}@{version} already published"),
            )));
        }

        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join(ArtifactKind::Bundle.file_name()), bundle)?;
        if let Some(configuration) = configuration {
            std::fs::write(dir.join(ArtifactKind::Configuration.file_name()), configuration)?;
        }
        Ok(())
    }

    fn version_dir(&self, name: &str, version: &Version) -> PathBuf {
        self.root.join(name).join(version.to_string())
    }
}
