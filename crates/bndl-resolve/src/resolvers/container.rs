//! Container image bundles, addressed as `docker://[host/][namespace/]name[:tag]`.
//!
//! Images are materialized as `save` archives under `<cache_dir>/container/`
//! using the configured container CLI. The online variant pulls the image
//! first; the offline variant only saves images already present locally.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use super::promote;
use crate::error::ResolverError;
use crate::resolver::{Lookup, Resolved, Resolver};
use crate::version::BundleVersion;

const SCHEME: &str = "docker://";
const DEFAULT_TAG: &str = "latest";

/// A parsed container image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Everything before the last path segment (registry host and namespace).
    pub namespace: Option<String>,
    pub name: String,
    pub tag: String,
}

impl ImageRef {
    /// Recognize a `docker://` reference. Other URIs are `Ok(None)`.
    pub fn recognize(uri: &str) -> Result<Option<ImageRef>, ResolverError> {
        match uri.strip_prefix(SCHEME) {
            Some(image) => ImageRef::parse(uri, image).map(Some),
            None => Ok(None),
        }
    }

    fn parse(uri: &str, image: &str) -> Result<ImageRef, ResolverError> {
        let malformed = |detail: &str| ResolverError::MalformedUri {
            uri: uri.to_string(),
            detail: detail.to_string(),
        };

        let (path, tag) = match image.rsplit_once(':') {
            Some((path, tag)) if !tag.contains('/') => (path, tag),
            _ => (image, DEFAULT_TAG),
        };
        let (namespace, name) = match path.rsplit_once('/') {
            Some((namespace, name)) => (Some(namespace), name),
            None => (None, path),
        };

        if name.is_empty() || !name.chars().all(is_name_char) {
            return Err(malformed("invalid image name"));
        }
        if let Some(namespace) = namespace {
            if namespace.is_empty()
                || !namespace
                    .chars()
                    .all(|c| is_name_char(c) || c == '/' || c == ':')
            {
                return Err(malformed("invalid image namespace"));
            }
        }
        if tag.is_empty()
            || tag.len() > 128
            || !tag
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(malformed("invalid image tag"));
        }

        Ok(ImageRef {
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
            tag: tag.to_string(),
        })
    }

    /// The reference as the container CLI expects it.
    pub fn image(&self) -> String {
        match &self.namespace {
            Some(namespace) => format!("{namespace}/{}:{}", self.name, self.tag),
            None => format!("{}:{}", self.name, self.tag),
        }
    }

    /// Archive file name, safe for use as a single path component.
    pub fn archive_name(&self) -> String {
        let flat: String = self
            .image()
            .chars()
            .map(|c| if matches!(c, '/' | ':') { '_' } else { c })
            .collect();
        format!("{flat}.tar")
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-')
}

pub struct ContainerResolver {
    name: &'static str,
    program: String,
    pull: bool,
}

impl ContainerResolver {
    pub const ONLINE: &'static str = "container-registry";
    pub const OFFLINE: &'static str = "offline-container";

    /// Pulls images before saving them.
    pub fn online(program: impl Into<String>) -> Self {
        ContainerResolver {
            name: Self::ONLINE,
            program: program.into(),
            pull: true,
        }
    }

    /// Saves images already present on the host.
    pub fn offline(program: impl Into<String>) -> Self {
        ContainerResolver {
            name: Self::OFFLINE,
            program: program.into(),
            pull: false,
        }
    }

    fn archive_path(cache_dir: &Path, image: &ImageRef) -> PathBuf {
        cache_dir.join("container").join(image.archive_name())
    }

    fn run(&self, args: &[&str]) -> Result<(), ResolverError> {
        debug!(program = %self.program, ?args, "running container cli");
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| ResolverError::Command {
                program: self.program.clone(),
                detail: e.to_string(),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ResolverError::Command {
                program: self.program.clone(),
                detail: format!(
                    "{} {}: {}",
                    args.join(" "),
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            })
        }
    }
}

impl Resolver for ContainerResolver {
    fn name(&self) -> &str {
        self.name
    }

    fn load_bundle_from_cache(&self, cache_dir: &Path, uri: &str) -> Lookup {
        let Some(image) = ImageRef::recognize(uri)? else {
            return Ok(None);
        };
        let path = Self::archive_path(cache_dir, &image);
        Ok(path.is_file().then(|| Resolved::file(image.archive_name(), path)))
    }

    fn resolve_bundle(&self, cache_dir: &Path, uri: &str) -> Lookup {
        let Some(image) = ImageRef::recognize(uri)? else {
            return Ok(None);
        };
        let reference = image.image();
        let path = Self::archive_path(cache_dir, &image);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if self.pull {
            self.run(&["pull", &reference])?;
        }

        // The cache phase trusts any archive at `path`, so only a complete
        // save is moved there.
        let tmp_path = path.with_file_name(format!("{}.tmp", image.archive_name()));
        let archive = tmp_path.to_string_lossy().into_owned();
        if let Err(e) = self.run(&["save", "-o", &archive, &reference]) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e);
        }
        if !tmp_path.is_file() {
            return Err(ResolverError::Command {
                program: self.program.clone(),
                detail: format!("save produced no archive at {archive}"),
            });
        }

        promote(&tmp_path, &path)?;
        Ok(Some(Resolved::file(image.archive_name(), path)))
    }

    fn load_bundle_configuration_from_cache(&self, _cache_dir: &Path, _uri: &str) -> Lookup {
        Ok(None)
    }

    fn resolve_bundle_configuration(&self, _cache_dir: &Path, _uri: &str) -> Lookup {
        Ok(None)
    }

    fn resolve_bundle_version(&self, uri: &str) -> Result<Option<BundleVersion>, ResolverError> {
        Ok(ImageRef::recognize(uri)?.map(|image| BundleVersion {
            resolver: self.name.to_string(),
            org: image.namespace,
            package_name: image.name,
            tag: image.tag,
            digest: None,
        }))
    }
}
