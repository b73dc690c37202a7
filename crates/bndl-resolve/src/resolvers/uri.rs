//! Resolves bundles addressed directly by location: local paths, `file://`
//! and `http(s)://` URIs.
//!
//! Remote artifacts are downloaded into the cache directory under the last
//! segment of their URL path, which is also what the cache phase looks for.

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use super::{file_name, local_file, promote};
use crate::error::ResolverError;
use crate::resolver::{Lookup, Resolved, Resolver};

pub struct UriResolver {
    agent: ureq::Agent,
}

impl UriResolver {
    pub const NAME: &'static str = "uri";

    pub fn new(timeout: Duration) -> Self {
        UriResolver {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    fn from_cache(&self, cache_dir: &Path, uri: &str) -> Lookup {
        if !is_remote(uri) {
            return Ok(None);
        }
        let name = remote_file_name(uri)?;
        let path = cache_dir.join(&name);
        Ok(path.is_file().then(|| Resolved::file(name, path)))
    }

    fn resolve(&self, cache_dir: &Path, uri: &str) -> Lookup {
        if is_remote(uri) {
            self.download(cache_dir, uri).map(Some)
        } else {
            local_file(uri)
        }
    }

    fn download(&self, cache_dir: &Path, uri: &str) -> Result<Resolved, ResolverError> {
        let name = remote_file_name(uri)?;
        let fetch_error = |detail: String| ResolverError::Fetch {
            uri: uri.to_string(),
            detail,
        };

        debug!(uri, "downloading");
        let response = self
            .agent
            .get(uri)
            .call()
            .map_err(|e| fetch_error(e.to_string()))?;

        std::fs::create_dir_all(cache_dir)?;
        let tmp_path = cache_dir.join(format!("{name}.tmp"));
        let mut file = std::fs::File::create(&tmp_path)?;
        if let Err(e) = std::io::copy(&mut response.into_reader(), &mut file) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(fetch_error(format!("reading response body: {e}")));
        }
        drop(file);

        let path = cache_dir.join(&name);
        promote(&tmp_path, &path)?;
        Ok(Resolved::file(file_name(&path), path))
    }
}

impl Resolver for UriResolver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn load_bundle_from_cache(&self, cache_dir: &Path, uri: &str) -> Lookup {
        self.from_cache(cache_dir, uri)
    }

    fn resolve_bundle(&self, cache_dir: &Path, uri: &str) -> Lookup {
        self.resolve(cache_dir, uri)
    }

    fn load_bundle_configuration_from_cache(&self, cache_dir: &Path, uri: &str) -> Lookup {
        self.from_cache(cache_dir, uri)
    }

    fn resolve_bundle_configuration(&self, cache_dir: &Path, uri: &str) -> Lookup {
        self.resolve(cache_dir, uri)
    }
}

fn is_remote(uri: &str) -> bool {
    uri.starts_with("http://") || uri.starts_with("https://")
}

/// Last path segment of a URL, without query or fragment.
fn remote_file_name(uri: &str) -> Result<String, ResolverError> {
    let without_scheme = uri.split_once("://").map_or(uri, |(_, rest)| rest);
    let path = without_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    match path.split_once('/').map(|(_, p)| p) {
        Some(p) => match p.rsplit('/').next() {
            Some(name) if !name.is_empty() => Ok(name.to_string()),
            _ => Err(ResolverError::MalformedUri {
                uri: uri.to_string(),
                detail: "no file name in path".to_string(),
            }),
        },
        None => Err(ResolverError::MalformedUri {
            uri: uri.to_string(),
            detail: "no path".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ArtifactHandle;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;

    fn resolver() -> UriResolver {
        UriResolver::new(Duration::from_secs(5))
    }

    /// Serve a single HTTP response on a loopback port.
    fn serve_once(status: &'static str, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            )
            .unwrap();
            stream.write_all(body).unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn file_name_from_url() {
        assert_eq!(
            remote_file_name("https://example.com/bundles/visualizer-1.0.0.zip?x=1").unwrap(),
            "visualizer-1.0.0.zip"
        );
        assert!(remote_file_name("https://example.com").is_err());
        assert!(remote_file_name("https://example.com/bundles/").is_err());
    }

    #[test]
    fn cache_hit_for_previously_downloaded_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("visualizer.zip"), b"zip").unwrap();

        let resolved = resolver()
            .load_bundle_from_cache(dir.path(), "https://example.com/b/visualizer.zip")
            .unwrap()
            .unwrap();
        assert_eq!(resolved.file_name, "visualizer.zip");

        assert!(resolver()
            .load_bundle_from_cache(dir.path(), "https://example.com/b/other.zip")
            .unwrap()
            .is_none());
    }

    #[test]
    fn local_files_bypass_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("visualizer.zip");
        std::fs::write(&path, b"zip").unwrap();
        let uri = path.to_str().unwrap();

        assert!(resolver().load_bundle_from_cache(dir.path(), uri).unwrap().is_none());
        let resolved = resolver().resolve_bundle(dir.path(), uri).unwrap().unwrap();
        assert_eq!(resolved.handle, ArtifactHandle::File(path.clone()));
    }

    #[test]
    fn downloads_into_cache_dir() {
        let base = serve_once("200 OK", b"remote bundle");
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = dir.path().join("cache");

        let uri = format!("{base}/bundles/visualizer.zip");
        let resolved = resolver().resolve_bundle(&cache_dir, &uri).unwrap().unwrap();

        let expected = cache_dir.join("visualizer.zip");
        assert_eq!(resolved.file_name, "visualizer.zip");
        assert_eq!(resolved.handle, ArtifactHandle::File(expected.clone()));
        assert_eq!(std::fs::read(expected).unwrap(), b"remote bundle");
    }

    #[test]
    fn http_error_is_a_fetch_error() {
        let base = serve_once("404 Not Found", b"");
        let dir = tempfile::tempdir().unwrap();

        let uri = format!("{base}/bundles/missing.zip");
        assert!(matches!(
            resolver().resolve_bundle_configuration(dir.path(), &uri),
            Err(ResolverError::Fetch { .. })
        ));
        assert!(!dir.path().join("missing.zip").exists());
    }

    #[test]
    fn unrecognized_uris() {
        let dir = tempfile::tempdir().unwrap();
        for uri in ["-", "visualizer:1.0.0", "docker://nginx"] {
            assert!(resolver().resolve_bundle(dir.path(), uri).unwrap().is_none(), "{uri}");
        }
    }
}
