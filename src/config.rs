use crate::error::Error;
use crate::pipeline::patch::PatchSet;
use crate::pipeline::source::SourceArchive;
use crate::version::Version;
use crate::{muted_error, weak_error};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};

/// Archive compression, selects the `tar` decompression flag.
#[derive(Copy, Clone, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Bz2,
    Gz,
    Xz,
    None,
}

impl Compression {
    pub fn extension(self) -> &'static str {
        match self {
            Compression::Bz2 => "tar.bz2",
            Compression::Gz => "tar.gz",
            Compression::Xz => "tar.xz",
            Compression::None => "tar",
        }
    }

    pub fn tar_flag(self) -> Option<&'static str> {
        match self {
            Compression::Bz2 => Some("-j"),
            Compression::Gz => Some("-z"),
            Compression::Xz => Some("-J"),
            Compression::None => None,
        }
    }
}

/// Pinned upstream release.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Upstream {
    pub package: String,
    pub version: String,
    pub compression: Compression,
    /// Directory inside the extracted tree where patches are applied.
    pub patch_root: PathBuf,
    /// `patch -p` strip level.
    pub strip: u32,
}

/// Hosts accepted by the compatibility check.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostPolicy {
    pub os: String,
    pub arch: Vec<String>,
}

/// Scripting runtime embedded into the debugger.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    pub name: String,
    /// Development headers in priority order, relative to an include dir.
    pub headers: Vec<String>,
    pub install_hint: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LauncherConfig {
    /// Interpreter binary spawned in `none` mode, looked up in `PATH`.
    pub interpreter: String,
    /// Scripting extension, relative to the project root.
    pub script: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Report {
    pub contact: String,
}

/// Build and launch configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub upstream: Upstream,
    pub patches: BTreeMap<String, Vec<String>>,
    pub host: HostPolicy,
    pub runtime: RuntimeConfig,
    pub launcher: LauncherConfig,
    pub report: Report,
}

impl Default for Config {
    fn default() -> Self {
        let preset = include_str!("preset/pipeline.toml");
        toml::de::from_str(preset).expect("should de")
    }
}

impl Config {
    const DEFAULT_PATH: &'static str = ".config/gdbforge/pipeline.toml";

    /// Load configuration. An explicit file must be valid, otherwise the user file from the
    /// home directory is tried and the builtin preset is used if it is missing or broken.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::from_home().unwrap_or_default()),
        }
    }

    fn from_home() -> Option<Self> {
        let path = home::home_dir()?.join(Self::DEFAULT_PATH);
        muted_error!(read_to_string(&path))?;
        weak_error!(Self::from_file(&path), "user config ignored:")
    }

    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let data = read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::de::from_str(&data).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Pinned archive descriptor.
    pub fn archive(&self) -> Result<SourceArchive, Error> {
        let version = Version::parse(&self.upstream.version)?;
        Ok(SourceArchive::pinned(
            &self.upstream.package,
            version,
            self.upstream.compression,
        ))
    }

    /// Patch list owned by the pinned version.
    pub fn patch_set(&self) -> Result<PatchSet, Error> {
        let version = Version::parse(&self.upstream.version)?;
        let ids = self
            .patches
            .get(&self.upstream.version)
            .ok_or_else(|| Error::NoPatchSet {
                package: self.upstream.package.clone(),
                version: self.upstream.version.clone(),
            })?;
        Ok(PatchSet::new(version, ids.clone()))
    }
}
