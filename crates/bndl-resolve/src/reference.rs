//! Bundle references of the form `[org/]name[:requirement]`.
//!
//! A reference is what users type when they mean "a bundle from the
//! repository" rather than a file or URL:
//!
//! ```text
//! visualizer
//! visualizer:1.0.0
//! typesafe/visualizer:^1.2
//! ```
//!
//! A bare version such as `1.0.0` is treated as an exact requirement.

use std::path::Path;

use crate::error::ResolverError;
use crate::version::{self, VersionReq};

/// A parsed bundle reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleRef {
    pub org: Option<String>,
    pub name: String,
    pub requirement: VersionReq,
}

impl BundleRef {
    /// Recognize and parse a bundle reference.
    ///
    /// Returns `Ok(None)` when `uri` is plainly something else (stdin, a URL,
    /// an existing path), and an error when it looks like a reference but
    /// cannot be parsed.
    pub fn recognize(uri: &str) -> Result<Option<BundleRef>, ResolverError> {
        if !looks_like_reference(uri) {
            return Ok(None);
        }
        BundleRef::parse(uri).map(Some)
    }

    /// Parse a bundle reference unconditionally.
    pub fn parse(uri: &str) -> Result<BundleRef, ResolverError> {
        let malformed = |detail: String| ResolverError::MalformedUri {
            uri: uri.to_string(),
            detail,
        };

        let (path, requirement) = match uri.split_once(':') {
            Some((path, req)) => (path, Some(req)),
            None => (uri, None),
        };

        let (org, name) = match path.split_once('/') {
            Some((org, name)) => (Some(org), name),
            None => (None, path),
        };

        if let Some(org) = org {
            if !is_valid_segment(org) {
                return Err(malformed(format!("invalid organization '{org}'")));
            }
        }
        if !is_valid_segment(name) {
            return Err(malformed(format!("invalid bundle name '{name}'")));
        }

        let requirement = match requirement {
            None => VersionReq::STAR,
            Some(req) => parse_requirement(req).map_err(|e| malformed(e.to_string()))?,
        };

        Ok(BundleRef {
            org: org.map(str::to_string),
            name: name.to_string(),
            requirement,
        })
    }
}

/// Exact versions are pinned with `=`; anything else is a semver range.
fn parse_requirement(req: &str) -> Result<VersionReq, semver::Error> {
    if version::Version::parse(req).is_ok() {
        version::parse_requirement(&format!("={req}"))
    } else {
        version::parse_requirement(req)
    }
}

fn looks_like_reference(uri: &str) -> bool {
    !(uri.is_empty()
        || uri == "-"
        || uri.contains("://")
        || uri.starts_with(['/', '.', '~'])
        || uri.contains('\\')
        || uri.ends_with(".zip")
        || Path::new(uri).exists())
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphanumeric() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}
