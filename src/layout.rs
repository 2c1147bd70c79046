//! Install layout - where the binary directory lives and how staging redirects it

use std::path::{Component, Path, PathBuf};

/// Detect the install prefix on this system
pub fn detect_prefix() -> PathBuf {
    for var in ["GYP_FORMULA_PREFIX", "HOMEBREW_PREFIX"] {
        if let Ok(prefix) = std::env::var(var) {
            if !prefix.is_empty() {
                return PathBuf::from(prefix);
            }
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        PathBuf::from("/opt/homebrew")
    }
    #[cfg(not(target_arch = "aarch64"))]
    {
        PathBuf::from("/usr/local")
    }
}

/// Staging root from `DESTDIR`, if set and non-empty
pub fn detect_destdir() -> Option<PathBuf> {
    std::env::var_os("DESTDIR")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    pub prefix: PathBuf,
    bin_dir: Option<PathBuf>,
    pub destdir: Option<PathBuf>,
}

impl InstallLayout {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            bin_dir: None,
            destdir: None,
        }
    }

    /// Layout from the environment, with explicit overrides taking precedence
    pub fn resolve(
        prefix: Option<PathBuf>,
        bin_dir: Option<PathBuf>,
        destdir: Option<PathBuf>,
    ) -> Self {
        Self {
            prefix: prefix.unwrap_or_else(detect_prefix),
            bin_dir,
            destdir: destdir.or_else(detect_destdir),
        }
    }

    pub fn with_bin_dir(mut self, bin_dir: impl Into<PathBuf>) -> Self {
        self.bin_dir = Some(bin_dir.into());
        self
    }

    pub fn with_destdir(mut self, destdir: impl Into<PathBuf>) -> Self {
        self.destdir = Some(destdir.into());
        self
    }

    /// The binary directory as it will appear on the installed system
    pub fn bin_dir(&self) -> PathBuf {
        self.bin_dir
            .clone()
            .unwrap_or_else(|| self.prefix.join("bin"))
    }

    /// The directory actually written to, accounting for staging
    pub fn staged_bin_dir(&self) -> PathBuf {
        stage(self.destdir.as_deref(), &self.bin_dir())
    }
}

/// Re-root `path` under `destdir`, dropping its root and prefix components
pub fn stage(destdir: Option<&Path>, path: &Path) -> PathBuf {
    match destdir {
        None => path.to_path_buf(),
        Some(root) => {
            let relative: PathBuf = path
                .components()
                .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
                .collect();
            root.join(relative)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_prefix() {
        let prefix = detect_prefix();
        assert!(!prefix.as_os_str().is_empty());
    }

    #[test]
    fn test_default_bin_dir() {
        let layout = InstallLayout::new("/usr/local");
        assert_eq!(layout.bin_dir(), PathBuf::from("/usr/local/bin"));
        assert_eq!(layout.staged_bin_dir(), PathBuf::from("/usr/local/bin"));
    }

    #[test]
    fn test_bin_dir_override() {
        let layout = InstallLayout::new("/usr/local").with_bin_dir("/opt/tools/bin");
        assert_eq!(layout.bin_dir(), PathBuf::from("/opt/tools/bin"));
    }

    #[test]
    fn test_destdir_staging() {
        let layout = InstallLayout::new("/usr/local").with_destdir("/tmp/stage");
        assert_eq!(layout.bin_dir(), PathBuf::from("/usr/local/bin"));
        assert_eq!(
            layout.staged_bin_dir(),
            PathBuf::from("/tmp/stage/usr/local/bin")
        );
    }

    #[test]
    fn test_stage_relative_path() {
        let staged = stage(Some(Path::new("/stage")), Path::new("bin"));
        assert_eq!(staged, PathBuf::from("/stage/bin"));
    }

    #[test]
    fn test_resolve_prefers_explicit_values() {
        let layout = InstallLayout::resolve(
            Some(PathBuf::from("/p")),
            Some(PathBuf::from("/b")),
            Some(PathBuf::from("/d")),
        );
        assert_eq!(layout.prefix, PathBuf::from("/p"));
        assert_eq!(layout.bin_dir(), PathBuf::from("/b"));
        assert_eq!(layout.staged_bin_dir(), PathBuf::from("/d/b"));
    }
}
