//! Resolution commands: bundle, config, version, cd-uri.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use bndl_resolve::{ArtifactHandle, BundleVersion, Resolved};

use super::Context;

/// Run `bndl bundle <uri>`.
pub fn bundle(ctx: &Context, uri: &str) -> Result<()> {
    let resolved =
        ctx.engine
            .resolve_bundle(Some(&ctx.settings), &ctx.cache_dir, uri, ctx.offline)?;
    print_resolved(&ctx.cache_dir, &resolved)
}

/// Run `bndl config <uri>`.
pub fn config(ctx: &Context, uri: &str) -> Result<()> {
    let resolved = ctx.engine.resolve_bundle_configuration(
        Some(&ctx.settings),
        &ctx.cache_dir,
        uri,
        ctx.offline,
    )?;
    print_resolved(&ctx.cache_dir, &resolved)
}

/// Run `bndl version <uri>`.
pub fn version(ctx: &Context, uri: &str) -> Result<()> {
    let version = resolve_version(ctx, uri)?;
    println!("{}", serde_json::to_string_pretty(&version)?);
    Ok(())
}

/// Run `bndl cd-uri <uri>`.
pub fn cd_uri(ctx: &Context, uri: &str) -> Result<()> {
    let version = resolve_version(ctx, uri)?;
    let cd_uri = ctx
        .engine
        .continuous_delivery_uri(Some(&ctx.settings), &version, ctx.offline)?;
    println!("{cd_uri}");
    Ok(())
}

fn resolve_version(ctx: &Context, uri: &str) -> Result<BundleVersion> {
    Ok(ctx
        .engine
        .resolve_bundle_version(Some(&ctx.settings), uri, ctx.offline)?)
}

fn print_resolved(cache_dir: &Path, resolved: &Resolved) -> Result<()> {
    let path = materialize(cache_dir, resolved)?;
    println!("{}\t{}", resolved.file_name, path.display());
    Ok(())
}

/// Location of a resolved artifact on disk. In-memory artifacts are written
/// into `cache_dir` under their file name.
pub fn materialize(cache_dir: &Path, resolved: &Resolved) -> Result<PathBuf> {
    match &resolved.handle {
        ArtifactHandle::File(path) => Ok(path.clone()),
        ArtifactHandle::Bytes(data) => {
            std::fs::create_dir_all(cache_dir)
                .with_context(|| format!("creating {}", cache_dir.display()))?;
            let path = cache_dir.join(&resolved.file_name);
            std::fs::write(&path, data)
                .with_context(|| format!("writing {}", path.display()))?;
            Ok(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bndl_resolve::ResolutionError;

    fn context(dir: &Path, settings: &str, offline: bool) -> Context {
        let path = dir.join("settings.toml");
        std::fs::write(&path, settings).unwrap();
        Context::load(Some(&path), Some(dir.join("cache")), offline).unwrap()
    }

    /// Lay out `<dir>/repository/<name>/<version>/` the way the `registry`
    /// resolver reads it.
    fn publish(dir: &Path, name: &str, version: &str, config: Option<&[u8]>) {
        let version_dir = dir.join("repository").join(name).join(version);
        std::fs::create_dir_all(&version_dir).unwrap();
        std::fs::write(version_dir.join("bundle.zip"), b"zip").unwrap();
        if let Some(config) = config {
            std::fs::write(version_dir.join("config.zip"), config).unwrap();
        }
    }

    fn repository_settings(dir: &Path) -> String {
        format!(
            "[repository]\npath = {:?}\norg = \"typesafe\"\n",
            dir.join("repository")
        )
    }

    #[test]
    fn materialize_file_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("visualizer.zip");

        let resolved = Resolved::file("visualizer.zip", file.clone());
        assert_eq!(materialize(dir.path(), &resolved).unwrap(), file);

        let cache = dir.path().join("cache");
        let resolved = Resolved::bytes("stdin", b"zip".to_vec());
        let path = materialize(&cache, &resolved).unwrap();
        assert_eq!(path, cache.join("stdin"));
        assert_eq!(std::fs::read(path).unwrap(), b"zip");
    }

    #[test]
    fn local_bundle_resolves_through_default_chain() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("visualizer.zip");
        std::fs::write(&file, b"zip").unwrap();
        let ctx = context(dir.path(), "", false);

        bundle(&ctx, file.to_str().unwrap()).unwrap();
    }

    #[test]
    fn repository_bundle_version_and_cd_uri() {
        let dir = tempfile::tempdir().unwrap();
        publish(dir.path(), "visualizer", "1.2.0", Some(&b"conf"[..]));
        let ctx = context(dir.path(), &repository_settings(dir.path()), false);

        bundle(&ctx, "visualizer").unwrap();
        config(&ctx, "visualizer:^1").unwrap();
        assert!(ctx.cache_dir.join("visualizer/1.2.0/bundle.zip").is_file());
        assert!(ctx.cache_dir.join("visualizer/1.2.0/config.zip").is_file());

        let version = resolve_version(&ctx, "visualizer").unwrap();
        assert_eq!(version.tag, "1.2.0");
        assert_eq!(version.org.as_deref(), Some("typesafe"));
        cd_uri(&ctx, "visualizer").unwrap();
    }

    #[test]
    fn offline_mode_uses_cache_populated_online() {
        let dir = tempfile::tempdir().unwrap();
        publish(dir.path(), "visualizer", "1.0.0", None);
        let online = context(dir.path(), &repository_settings(dir.path()), false);
        bundle(&online, "visualizer").unwrap();

        let offline = context(dir.path(), "", true);
        bundle(&offline, "visualizer:1.0.0").unwrap();

        let version = resolve_version(&offline, "visualizer").unwrap();
        assert_eq!(version.resolver, "offline-cache");

        let err = cd_uri(&offline, "visualizer").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ResolutionError>(),
            Some(ResolutionError::ContinuousDelivery { .. })
        ));
    }

    #[test]
    fn exhausted_chain_reports_resolver_failures() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), "resolvers = [\"uri\"]\n", false);

        let err = bundle(&ctx, "file:///nonexistent/visualizer.zip").unwrap_err();
        let report = super::super::report(&err);
        assert!(report.starts_with(
            "error: unable to resolve bundle using file:///nonexistent/visualizer.zip"
        ));
        assert!(report.contains("  [network] uri: "));
    }
}
