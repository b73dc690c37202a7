//! `bndl chain`: show which resolvers an operation would consult.

use anyhow::Result;

use super::Context;

/// Run `bndl chain`.
pub fn run(ctx: &Context) -> Result<()> {
    print!("{}", describe(ctx)?);
    Ok(())
}

/// One line per resolver, in the order they are tried.
pub fn describe(ctx: &Context) -> Result<String> {
    let chain = ctx.engine.chain(Some(&ctx.settings), ctx.offline)?;
    let source = match ctx.settings.resolvers() {
        Some(names) if !names.is_empty() => "custom",
        _ if ctx.offline => "offline",
        _ => "default",
    };

    let mut out = format!("{source} chain:\n");
    for (index, resolver) in chain.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", index + 1, resolver.name()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn context(dir: &Path, settings: &str, offline: bool) -> Context {
        let path = dir.join("settings.toml");
        std::fs::write(&path, settings).unwrap();
        Context::load(Some(&path), Some(dir.join("cache")), offline).unwrap()
    }

    #[test]
    fn describe_builtin_chains() {
        let dir = tempfile::tempdir().unwrap();

        let online = describe(&context(dir.path(), "", false)).unwrap();
        assert_eq!(
            online,
            "default chain:\n  1. stdin\n  2. uri\n  3. registry\n  4. container-registry\n"
        );

        let offline = describe(&context(dir.path(), "resolvers = []\n", true)).unwrap();
        assert_eq!(
            offline,
            "offline chain:\n  1. stdin\n  2. offline-cache\n  3. offline-container\n"
        );
    }

    #[test]
    fn describe_custom_chain() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), "resolvers = [\"registry\", \"uri\"]\n", true);

        assert_eq!(
            describe(&ctx).unwrap(),
            "custom chain:\n  1. registry\n  2. uri\n"
        );
    }

    #[test]
    fn unknown_resolver_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), "resolvers = [\"bintray\"]\n", false);

        let err = describe(&ctx).unwrap_err();
        assert!(err.to_string().contains("bintray"));
    }
}
