//! Resolution error types.

use std::path::PathBuf;

/// An error raised by a single resolver that recognized its input but
/// failed to act on it.
///
/// These never abort the chain. They are collected and only surface inside
/// [`ResolutionError::BundleResolution`] when every resolver has failed.
#[derive(Debug, thiserror::Error)]
pub enum ResolverError {
    /// The URI belongs to this resolver's scheme but is not well formed.
    #[error("malformed uri '{uri}': {detail}")]
    MalformedUri { uri: String, detail: String },

    /// Input stream produced no data.
    #[error("no data available on {source_name}")]
    EmptyInput { source_name: String },

    /// Remote fetch failed.
    #[error("failed to fetch {uri}: {detail}")]
    Fetch { uri: String, detail: String },

    /// External program failed or could not be started.
    #[error("`{program}` failed: {detail}")]
    Command { program: String, detail: String },

    /// Cached artifact does not match its recorded digest.
    #[error("integrity check failed for '{name}@{version}': expected {expected}, got {actual}")]
    Integrity {
        name: String,
        version: String,
        expected: String,
        actual: String,
    },

    /// Cache I/O error.
    #[error("cache error at {path}: {detail}")]
    Cache { path: PathBuf, detail: String },

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A resolver-local error tagged with the resolver that raised it.
#[derive(Debug)]
pub struct ResolverFailure {
    /// Name of the resolver.
    pub resolver: String,
    /// What went wrong.
    pub error: ResolverError,
}

impl std::fmt::Display for ResolverFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.resolver, self.error)
    }
}

/// Phase in which a [`ResolverFailure`] was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Lookup against already-materialized local state.
    Cache,
    /// Active fetch against the resolver's source.
    Network,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Cache => "cache",
            Phase::Network => "network",
        }
    }
}

/// Errors returned by the resolution engine and the resolver registry.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    /// Every resolver in the chain failed or did not match.
    #[error("unable to resolve bundle using {uri}")]
    BundleResolution {
        uri: String,
        cache_errors: Vec<ResolverFailure>,
        resolution_errors: Vec<ResolverFailure>,
    },

    /// No resolver could derive a continuous delivery URI.
    #[error("unable to form continuous delivery uri using {version}")]
    ContinuousDelivery { version: String },

    /// A custom chain names a resolver that is not registered.
    #[error("unknown resolver '{name}'")]
    UnknownResolver { name: String },

    /// A registered resolver factory failed to construct its resolver.
    #[error("failed to load resolver '{name}': {source}")]
    ResolverInit {
        name: String,
        #[source]
        source: ResolverError,
    },

    /// Invalid settings.
    #[error("invalid settings at {path}: {detail}")]
    Settings { path: PathBuf, detail: String },

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResolutionError {
    /// Every resolver failure carried by an aggregated failure, cache phase
    /// first. Empty for all other variants.
    pub fn failures(&self) -> impl Iterator<Item = (Phase, &ResolverFailure)> {
        let (cache, network): (&[ResolverFailure], &[ResolverFailure]) = match self {
            ResolutionError::BundleResolution {
                cache_errors,
                resolution_errors,
                ..
            } => (cache_errors, resolution_errors),
            _ => (&[], &[]),
        };
        cache
            .iter()
            .map(|f| (Phase::Cache, f))
            .chain(network.iter().map(|f| (Phase::Network, f)))
    }
}

/// Result type alias for chain-level operations.
pub type Result<T> = std::result::Result<T, ResolutionError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(resolver: &str) -> ResolverFailure {
        ResolverFailure {
            resolver: resolver.to_string(),
            error: ResolverError::EmptyInput {
                source_name: "stdin".to_string(),
            },
        }
    }

    #[test]
    fn failures_are_tagged_by_phase() {
        let err = ResolutionError::BundleResolution {
            uri: "visualizer".to_string(),
            cache_errors: vec![failure("a")],
            resolution_errors: vec![failure("b"), failure("c")],
        };

        let tagged: Vec<_> = err
            .failures()
            .map(|(phase, f)| (phase, f.resolver.as_str()))
            .collect();
        assert_eq!(
            tagged,
            vec![(Phase::Cache, "a"), (Phase::Network, "b"), (Phase::Network, "c")]
        );
    }

    #[test]
    fn other_variants_carry_no_failures() {
        let err = ResolutionError::UnknownResolver {
            name: "nope".to_string(),
        };
        assert_eq!(err.failures().count(), 0);
    }

    #[test]
    fn display_messages() {
        let err = ResolutionError::ContinuousDelivery {
            version: "visualizer:1.0.0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unable to form continuous delivery uri using visualizer:1.0.0"
        );
        assert_eq!(failure("stdin").to_string(), "stdin: no data available on stdin");
    }
}
