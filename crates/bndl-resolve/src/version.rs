//! Resolved bundle versions and semantic version selection.

use serde::{Deserialize, Serialize};

/// A parsed semantic version.
pub type Version = semver::Version;

/// A version requirement (range expression).
pub type VersionReq = semver::VersionReq;

/// A bundle version as resolved by one resolver.
///
/// `resolver` names the resolver that produced it, which lets
/// [`crate::Resolver::continuous_delivery_uri`] claim only its own versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleVersion {
    /// Name of the resolver that resolved this version.
    pub resolver: String,
    /// Owning organization, if the source has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    /// Bundle (or image) name.
    pub package_name: String,
    /// Version string or image tag.
    pub tag: String,
    /// Content digest of the resolved artifact, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl std::fmt::Display for BundleVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(org) = &self.org {
            write!(f, "{org}/")?;
        }
        write!(f, "{}:{}", self.package_name, self.tag)
    }
}

/// Parse a version requirement string like ">=1.0.0, <2.0.0" or "^1.2".
pub fn parse_requirement(s: &str) -> Result<VersionReq, semver::Error> {
    VersionReq::parse(s)
}

/// Find the best matching version from a list of available versions.
///
/// Returns the highest version that satisfies the requirement.
pub fn resolve_best(available: &[Version], req: &VersionReq) -> Option<Version> {
    available.iter().filter(|v| req.matches(v)).max().cloned()
}

/// Parse directory names into versions, skipping anything that is not semver.
pub fn parse_all<I, S>(names: I) -> Vec<Version>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut versions: Vec<Version> = names
        .into_iter()
        .filter_map(|n| Version::parse(n.as_ref()).ok())
        .collect();
    versions.sort();
    versions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn resolve_best_version() {
        let versions = vec![v("0.9.0"), v("1.0.0"), v("1.2.0"), v("1.1.0"), v("2.0.0")];
        let req = parse_requirement(">=1.0.0, <2.0.0").unwrap();
        assert_eq!(resolve_best(&versions, &req), Some(v("1.2.0")));
    }

    #[test]
    fn resolve_best_no_match() {
        let versions = vec![v("0.1.0")];
        let req = parse_requirement(">=1.0.0").unwrap();
        assert!(resolve_best(&versions, &req).is_none());
    }

    #[test]
    fn wildcard_picks_latest() {
        let versions = vec![v("1.0.0"), v("3.1.4"), v("2.0.0")];
        assert_eq!(resolve_best(&versions, &VersionReq::STAR), Some(v("3.1.4")));
    }

    #[test]
    fn parse_all_skips_non_semver() {
        let versions = parse_all(["2.0.0", "latest", "1.0.0", ".tmp"]);
        assert_eq!(versions, vec![v("1.0.0"), v("2.0.0")]);
    }

    #[test]
    fn display_with_and_without_org() {
        let mut version = BundleVersion {
            resolver: "registry".to_string(),
            org: None,
            package_name: "visualizer".to_string(),
            tag: "1.0.0".to_string(),
            digest: None,
        };
        assert_eq!(version.to_string(), "visualizer:1.0.0");

        version.org = Some("typesafe".to_string());
        assert_eq!(version.to_string(), "typesafe/visualizer:1.0.0");
    }

    #[test]
    fn json_omits_empty_fields() {
        let version = BundleVersion {
            resolver: "registry".to_string(),
            org: None,
            package_name: "visualizer".to_string(),
            tag: "1.0.0".to_string(),
            digest: None,
        };
        let json = serde_json::to_string(&version).unwrap();
        assert_eq!(
            json,
            r#"{"resolver":"registry","package_name":"visualizer","tag":"1.0.0"}"#
        );
    }
}
