use std::io;
use std::path::{self, Path, PathBuf};

/// Filesystem layout of a project root.
///
/// ```text
/// <root>/patches/<id>.patch     patch files
/// <root>/ext/src/<archive>      pinned upstream archive, extracted in place
/// <root>/ext/dst/               install prefix
/// <root>/ext/log/               stage logs
/// <root>/ext/build.complete     completion marker
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub root: PathBuf,
    pub source_dir: PathBuf,
    pub patches_dir: PathBuf,
    pub prefix: PathBuf,
    pub log_dir: PathBuf,
    pub marker: PathBuf,
}

impl Layout {
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let ext = root.join("ext");
        Self {
            source_dir: ext.join("src"),
            patches_dir: root.join("patches"),
            prefix: ext.join("dst"),
            log_dir: ext.join("log"),
            marker: ext.join("build.complete"),
            root,
        }
    }

    /// Layout of `root` resolved against the current directory. External tools run in
    /// other directories, so every derived path must be absolute.
    pub fn absolute(root: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::from_root(path::absolute(root)?))
    }

    pub fn log(&self, name: &str) -> PathBuf {
        self.log_dir.join(format!("{name}.log"))
    }

    /// Path of a file given relative to the project root (absolute paths are kept).
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}
