//! Built-in resolvers.
//!
//! | name                 | source                                       |
//! |----------------------|----------------------------------------------|
//! | `stdin`              | standard input (`-`)                         |
//! | `uri`                | local paths, `file://`, `http(s)://`         |
//! | `registry`           | filesystem bundle repository                 |
//! | `container-registry` | `docker://` images, pulled then saved        |
//! | `offline-cache`      | bundle cache and local paths only            |
//! | `offline-container`  | `docker://` images already on the host       |

pub mod container;
pub mod offline;
pub mod registry;
pub mod stdin;
pub mod uri;

pub use container::{ContainerResolver, ImageRef};
pub use offline::OfflineCacheResolver;
pub use registry::RegistryResolver;
pub use stdin::StdinResolver;
pub use uri::UriResolver;

use std::path::{Path, PathBuf};

use crate::cache::BundleCache;
use crate::error::ResolverError;
use crate::reference::BundleRef;
use crate::resolver::{ArtifactKind, Lookup, Resolved};

/// Resolve `uri` as a local file: a `file://` URI or an existing path.
///
/// A `file://` URI that points nowhere is an error; a bare path that does
/// not exist is simply not ours.
pub(crate) fn local_file(uri: &str) -> Lookup {
    let path = match uri.strip_prefix("file://") {
        Some(path) => {
            let path = PathBuf::from(path);
            if !path.is_file() {
                return Err(ResolverError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} does not exist", path.display()),
                )));
            }
            path
        }
        None if uri != "-" && !uri.contains("://") && Path::new(uri).is_file() => {
            PathBuf::from(uri)
        }
        None => return Ok(None),
    };
    Ok(Some(Resolved::file(file_name(&path), path)))
}

/// Cache-phase lookup of a bundle reference in the bundle cache.
pub(crate) fn cached_reference(cache_dir: &Path, uri: &str, kind: ArtifactKind) -> Lookup {
    let Some(reference) = BundleRef::recognize(uri)? else {
        return Ok(None);
    };

    let cache = BundleCache::new(cache_dir);
    match cache.find(&reference.name, &reference.requirement, kind)? {
        Some(entry) => {
            cache.verify_integrity(&entry)?;
            Ok(Some(Resolved::file(entry.display_name(kind), entry.path)))
        }
        None => Ok(None),
    }
}

/// Move a fully written temporary file to `path`. The temporary file is
/// removed if the move fails.
pub(crate) fn promote(tmp_path: &Path, path: &Path) -> Result<(), ResolverError> {
    std::fs::rename(tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(tmp_path);
        ResolverError::Io(e)
    })
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ArtifactHandle;

    #[test]
    fn local_path_and_file_uri() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("visualizer.zip");
        std::fs::write(&path, b"zip").unwrap();

        let resolved = local_file(path.to_str().unwrap()).unwrap().unwrap();
        assert_eq!(resolved.file_name, "visualizer.zip");
        assert_eq!(resolved.handle, ArtifactHandle::File(path.clone()));

        let uri = format!("file://{}", path.display());
        assert!(local_file(&uri).unwrap().is_some());
    }

    #[test]
    fn missing_file_uri_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let uri = format!("file://{}", dir.path().join("missing.zip").display());
        assert!(local_file(&uri).is_err());
    }

    #[test]
    fn other_inputs_are_not_local() {
        for uri in ["-", "visualizer:1.0.0", "https://example.com/b.zip", "/no/such/file"] {
            assert!(local_file(uri).unwrap().is_none(), "{uri}");
        }
    }

    #[test]
    fn cached_reference_verifies_integrity() {
        let dir = tempfile::tempdir().unwrap();
        let cache = BundleCache::new(dir.path());
        let entry = cache
            .store("visualizer", "1.0.0", ArtifactKind::Bundle, b"bundle")
            .unwrap();

        let resolved = cached_reference(dir.path(), "visualizer", ArtifactKind::Bundle)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.file_name, "visualizer-1.0.0.zip");

        std::fs::write(&entry.path, b"corrupt").unwrap();
        assert!(matches!(
            cached_reference(dir.path(), "visualizer", ArtifactKind::Bundle),
            Err(ResolverError::Integrity { .. })
        ));
    }

    #[test]
    fn promote_moves_file_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = dir.path().join("bundle.zip.tmp");
        let path = dir.path().join("bundle.zip");
        std::fs::write(&tmp, b"zip").unwrap();

        promote(&tmp, &path).unwrap();
        assert!(!tmp.exists());
        assert_eq!(std::fs::read(&path).unwrap(), b"zip");
    }

    #[test]
    fn failed_promote_removes_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = dir.path().join("bundle.zip.tmp");
        std::fs::write(&tmp, b"zip").unwrap();

        let target = dir.path().join("missing-dir/bundle.zip");
        assert!(matches!(promote(&tmp, &target), Err(ResolverError::Io(_))));
        assert!(!tmp.exists());
        assert!(!target.exists());
    }
}
