//! Icon and pattern image lookup.
//!
//! Themes reference images by `src`. The engine never touches the file
//! system itself; it asks a [`ResourceResolver`] passed to `Style::load`.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

pub trait ResourceResolver {
    /// Location of the image named by `src`, or `None` if it cannot be found.
    fn resolve(&self, src: &str) -> Option<PathBuf>;
}

/// Resolves `src` relative to the directory holding the theme file.
///
/// Sources that would leave that directory (`..` components) are not found.
#[derive(Debug, Clone)]
pub struct DirectoryResolver {
    root: PathBuf,
}

impl DirectoryResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolver for the directory containing `theme`.
    pub fn for_theme(theme: &Path) -> Self {
        Self::new(theme.parent().unwrap_or_else(|| Path::new(".")))
    }
}

impl ResourceResolver for DirectoryResolver {
    fn resolve(&self, src: &str) -> Option<PathBuf> {
        let relative = src.strip_prefix("file:").unwrap_or(src);
        let relative = relative.trim_start_matches('/');
        if relative.is_empty() {
            return None;
        }
        let escapes = Path::new(relative)
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            tracing::warn!("Resources: '{}' points outside the theme directory", src);
            return None;
        }
        let path = self.root.join(relative);
        path.is_file().then_some(path)
    }
}

/// Fixed set of known sources, mostly for tests and embedded themes.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    known: HashSet<String>,
}

impl MemoryResolver {
    pub fn new<I, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: sources.into_iter().map(Into::into).collect(),
        }
    }
}

impl ResourceResolver for MemoryResolver {
    fn resolve(&self, src: &str) -> Option<PathBuf> {
        self.known.contains(src).then(|| PathBuf::from(src))
    }
}

/// Resolver that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResources;

impl ResourceResolver for NoResources {
    fn resolve(&self, _src: &str) -> Option<PathBuf> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_resolver_finds_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("symbols")).unwrap();
        std::fs::write(dir.path().join("symbols/pub.svg"), "<svg/>").unwrap();

        let resolver = DirectoryResolver::new(dir.path());
        assert_eq!(
            resolver.resolve("file:/symbols/pub.svg"),
            Some(dir.path().join("symbols/pub.svg"))
        );
        assert!(resolver.resolve("symbols/pub.svg").is_some());
        assert!(resolver.resolve("file:/symbols/cafe.svg").is_none());
        assert!(resolver.resolve("file:").is_none());
    }

    #[test]
    fn directory_resolver_stays_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("theme");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(dir.path().join("secret.png"), b"png").unwrap();
        std::fs::write(root.join("icon.png"), b"png").unwrap();

        let resolver = DirectoryResolver::new(&root);
        assert!(resolver.resolve("../secret.png").is_none());
        assert!(resolver.resolve("file:/../secret.png").is_none());
        assert!(resolver.resolve("symbols/../../secret.png").is_none());
        assert!(resolver.resolve("./icon.png").is_some());
    }

    #[test]
    fn directory_resolver_for_theme_uses_parent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("icon.png"), b"png").unwrap();

        let resolver = DirectoryResolver::for_theme(&dir.path().join("theme.xml"));
        assert!(resolver.resolve("icon.png").is_some());
    }

    #[test]
    fn memory_resolver() {
        let resolver = MemoryResolver::new(["a.svg"]);
        assert_eq!(resolver.resolve("a.svg"), Some(PathBuf::from("a.svg")));
        assert_eq!(resolver.resolve("b.svg"), None);
        assert_eq!(NoResources.resolve("a.svg"), None);
    }
}
