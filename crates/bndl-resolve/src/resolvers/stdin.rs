//! Reads a bundle or configuration piped on standard input (`-`).

use std::io::Read;
use std::path::Path;
use std::sync::Mutex;

use crate::error::ResolverError;
use crate::resolver::{Lookup, Resolved, Resolver};

pub struct StdinResolver {
    input: Mutex<Box<dyn Read + Send>>,
}

impl StdinResolver {
    pub const NAME: &'static str = "stdin";

    pub fn new() -> Self {
        StdinResolver::with_reader(std::io::stdin())
    }

    /// Read from `reader` instead of the process's standard input.
    pub fn with_reader(reader: impl Read + Send + 'static) -> Self {
        StdinResolver {
            input: Mutex::new(Box::new(reader)),
        }
    }

    fn read(&self, uri: &str) -> Lookup {
        if uri != "-" {
            return Ok(None);
        }

        let mut input = self
            .input
            .lock()
            .map_err(|_| ResolverError::Io(std::io::Error::other("stdin reader poisoned")))?;
        let mut data = Vec::new();
        input.read_to_end(&mut data)?;

        if data.is_empty() {
            return Err(ResolverError::EmptyInput {
                source_name: Self::NAME.to_string(),
            });
        }
        Ok(Some(Resolved::bytes(Self::NAME, data)))
    }
}

impl Default for StdinResolver {
    fn default() -> Self {
        StdinResolver::new()
    }
}

impl Resolver for StdinResolver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn load_bundle_from_cache(&self, _cache_dir: &Path, _uri: &str) -> Lookup {
        Ok(None)
    }

    fn resolve_bundle(&self, _cache_dir: &Path, uri: &str) -> Lookup {
        self.read(uri)
    }

    fn load_bundle_configuration_from_cache(&self, _cache_dir: &Path, _uri: &str) -> Lookup {
        Ok(None)
    }

    fn resolve_bundle_configuration(&self, _cache_dir: &Path, uri: &str) -> Lookup {
        self.read(uri)
    }
}
