use crate::pipeline::build::Step;
use crate::pipeline::exec::Failure;
use nix::unistd::Pid;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // --------------------------------- generic errors --------------------------------------------
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error("config {path}: {reason}")]
    Config { path: PathBuf, reason: String },
    #[error("invalid upstream version `{0}`, expected MAJOR.MINOR[.PATCH]")]
    InvalidVersion(String),
    #[error("no patch list configured for {package} {version}")]
    NoPatchSet { package: String, version: String },

    // --------------------------------- host compatibility errors ---------------------------------
    #[error("unsupported host {os}-{arch} (supported: {supported})")]
    UnsupportedHost {
        os: String,
        arch: String,
        supported: String,
    },
    #[error("{runtime} development header not found, tried: {tried}")]
    MissingRuntimeHeader {
        runtime: String,
        tried: String,
        install_hint: String,
    },

    // --------------------------------- source extraction errors ----------------------------------
    #[error("source archive {0} not found or unreadable")]
    ArchiveNotFound(PathBuf),
    #[error("extraction: {0}")]
    Extraction(Failure),
    #[error("extraction of {archive} did not produce {dir}")]
    ExtractionIncomplete { archive: PathBuf, dir: PathBuf },

    // --------------------------------- patch errors ----------------------------------------------
    #[error("patch {id} ({position}/{total}) not found at {path}")]
    PatchNotFound {
        id: String,
        position: usize,
        total: usize,
        path: PathBuf,
    },
    #[error("patch {id} ({position}/{total}): {failure}")]
    Patch {
        id: String,
        position: usize,
        total: usize,
        failure: Failure,
    },

    // --------------------------------- build errors ----------------------------------------------
    #[error("{step} step: {failure}")]
    Build {
        step: Step,
        failure: Failure,
        extra_logs: Vec<PathBuf>,
    },

    // --------------------------------- launcher errors -------------------------------------------
    #[error("{0}")]
    Usage(String),
    #[error("debugger is not built (missing {0})")]
    NotBuilt(PathBuf),
    #[error("scripting extension {0} not found")]
    ScriptNotFound(PathBuf),
    #[error("process pid {0} not found")]
    ProcessNotFound(Pid),
    #[error("interpreter `{name}` not found: {source}")]
    InterpreterNotFound { name: String, source: which::Error },
    #[error("replace process image with `{command}`: {source}")]
    Exec {
        command: String,
        source: std::io::Error,
    },
}

impl Error {
    /// Return a remediation hint for the operator, if there is one.
    pub fn hint(&self) -> Option<String> {
        match self {
            Error::UnsupportedHost { supported, .. } => {
                Some(format!("only {supported} hosts are supported (for now)"))
            }
            Error::MissingRuntimeHeader {
                runtime,
                install_hint,
                ..
            } => Some(format!(
                "{runtime} required ({install_hint}), or point --with-python-dir at an installation"
            )),
            Error::ArchiveNotFound(_) => {
                Some("put the pinned upstream archive into the source directory".to_string())
            }
            Error::PatchNotFound { .. } => Some("patch files are named <patch-id>.patch".to_string()),
            Error::Patch { position, .. } if *position > 1 => Some(format!(
                "source tree is left with patches 1..{} applied",
                position - 1
            )),
            Error::NotBuilt(_) => Some("run gdbforge-build first".to_string()),
            Error::Usage(_) => Some(crate::launcher::usage()),
            _ => None,
        }
    }

    /// Log files worth attaching to a bug report.
    pub fn logs(&self) -> Vec<&Path> {
        match self {
            Error::Extraction(failure) | Error::Patch { failure, .. } => {
                failure.log.as_deref().into_iter().collect()
            }
            Error::Build {
                failure,
                extra_logs,
                ..
            } => failure
                .log
                .as_deref()
                .into_iter()
                .chain(extra_logs.iter().map(PathBuf::as_path))
                .collect(),
            _ => vec![],
        }
    }
}

#[macro_export]
macro_rules! _error {
    ($log_fn: path, $res: expr) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "gdbforge", "{:#}", e);
                None
            }
        }
    };
    ($log_fn: path, $res: expr, $msg: tt) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "gdbforge", concat!($msg, " {:#}"), e);
                None
            }
        }
    };
}

/// Transforms `Result` into `Option` and logs an error if it occurs.
#[macro_export]
macro_rules! weak_error {
    ($res: expr) => {
        $crate::_error!(log::warn, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::warn, $res, $msg)
    };
}

/// Transforms `Result` into `Option` and put error into debug logs if it occurs.
#[macro_export]
macro_rules! muted_error {
    ($res: expr) => {
        $crate::_error!(log::debug, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::debug, $res, $msg)
    };
}
