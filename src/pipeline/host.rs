use crate::config::{HostPolicy, RuntimeConfig};
use crate::error::Error;
use itertools::Itertools;
use std::env;
use std::path::{Path, PathBuf};

const SYSTEM_INCLUDE_DIRS: &[&str] = &["/usr/include", "/usr/local/include"];

/// Host properties relevant for building.
#[derive(Debug, Clone, PartialEq)]
pub struct HostProfile {
    pub os: String,
    pub arch: String,
    /// Header search path, in lookup order.
    pub include_dirs: Vec<PathBuf>,
}

impl HostProfile {
    /// Probe current host.
    ///
    /// # Arguments
    ///
    /// * `runtime_dir`: scripting runtime installation, its `include` directory is searched first
    pub fn probe(runtime_dir: Option<&Path>) -> Self {
        let include_dirs = runtime_dir
            .map(|dir| dir.join("include"))
            .into_iter()
            .chain(SYSTEM_INCLUDE_DIRS.iter().map(PathBuf::from))
            .collect();

        Self {
            os: env::consts::OS.to_string(),
            arch: env::consts::ARCH.to_string(),
            include_dirs,
        }
    }
}

/// Successful compatibility check.
#[derive(Debug, Clone, PartialEq)]
pub struct HostReport {
    /// Header candidate that matched.
    pub header: String,
    /// Full path of matched header.
    pub path: PathBuf,
}

/// Validates host before anything touches the filesystem.
pub struct HostChecker<'a> {
    policy: &'a HostPolicy,
    runtime: &'a RuntimeConfig,
}

impl<'a> HostChecker<'a> {
    pub fn new(policy: &'a HostPolicy, runtime: &'a RuntimeConfig) -> Self {
        Self { policy, runtime }
    }

    /// Check OS and architecture first, then look for a runtime development header.
    /// Header candidates are tried in priority order, first match wins.
    pub fn check(&self, profile: &HostProfile) -> Result<HostReport, Error> {
        let arch_ok = self.policy.arch.iter().any(|a| a == &profile.arch);
        if profile.os != self.policy.os || !arch_ok {
            return Err(Error::UnsupportedHost {
                os: profile.os.clone(),
                arch: profile.arch.clone(),
                supported: format!("{} {}", self.policy.arch.join("|"), self.policy.os),
            });
        }

        for header in &self.runtime.headers {
            let found = profile
                .include_dirs
                .iter()
                .map(|dir| dir.join(header))
                .find(|path| path.is_file());
            if let Some(path) = found {
                return Ok(HostReport {
                    header: header.clone(),
                    path,
                });
            }
        }

        Err(Error::MissingRuntimeHeader {
            runtime: self.runtime.name.clone(),
            tried: self.runtime.headers.iter().join(", "),
            install_hint: self.runtime.install_hint.clone(),
        })
    }
}
