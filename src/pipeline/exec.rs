use crate::gf_info;
use crate::utils::shell_join;
use std::ffi::{OsStr, OsString};
use std::fmt::{Display, Formatter};
use std::fs::{File, OpenOptions};
use std::io;
use std::io::Write;
use std::iter;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

/// External tool invocation (tar, patch, git, configure, make).
///
/// Exit status is the only success signal. Output of the tool goes into the log file
/// when one is set. Program and arguments are kept as OS strings and reach the tool
/// unchanged, quoting is only applied for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalCommand {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    stdin: Option<PathBuf>,
    log: Option<PathBuf>,
}

impl ExternalCommand {
    /// Create new command, but dont run it.
    ///
    /// # Arguments
    ///
    /// * `program`: program name or path
    /// * `args`: program arguments
    pub fn new<ARGS: IntoIterator<Item = I>, I: Into<OsString>>(
        program: impl Into<OsString>,
        args: ARGS,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            stdin: None,
            log: None,
        }
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Feed file content into standard input.
    pub fn stdin_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdin = Some(path.into());
        self
    }

    /// Append stdout and stderr into a log file.
    pub fn log_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.log = Some(path.into());
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    pub fn stdin(&self) -> Option<&Path> {
        self.stdin.as_deref()
    }

    pub fn log(&self) -> Option<&Path> {
        self.log.as_deref()
    }

    /// Run command with an executor and wait for it.
    /// Return [`Failure`] if command cannot be started or exit with non-zero status.
    pub fn run(&self, executor: &mut dyn Executor) -> Result<(), Failure> {
        gf_info!(target: "pipeline", "  -- {self}");

        let termination = match executor.execute(self) {
            Ok(status) if status.success() => return Ok(()),
            Ok(status) => Termination::Exited(status),
            Err(e) => Termination::NotStarted(e),
        };

        Err(Failure {
            command: self.to_string(),
            termination,
            log: self.log.clone(),
        })
    }
}

impl Display for ExternalCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let words = iter::once(&self.program).chain(self.args.iter());
        f.write_str(&shell_join(words.map(|w| w.to_string_lossy())))?;
        if let Some(stdin) = &self.stdin {
            write!(f, " < {}", stdin.display())?;
        }
        Ok(())
    }
}

/// How an external command ended.
#[derive(Debug)]
pub enum Termination {
    Exited(ExitStatus),
    NotStarted(io::Error),
}

impl Display for Termination {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Exited(status) => write!(f, "{status}"),
            Termination::NotStarted(e) => write!(f, "could not be started: {e}"),
        }
    }
}

/// Failed external command.
#[derive(Debug)]
pub struct Failure {
    pub command: String,
    pub termination: Termination,
    pub log: Option<PathBuf>,
}

impl Display for Failure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "`{}` failed ({})", self.command, self.termination)
    }
}

/// Runs external commands and blocks until they exit.
pub trait Executor {
    fn execute(&mut self, cmd: &ExternalCommand) -> io::Result<ExitStatus>;
}

/// Executor that spawns real processes.
#[derive(Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn execute(&mut self, cmd: &ExternalCommand) -> io::Result<ExitStatus> {
        let mut command = Command::new(cmd.program());
        command.args(cmd.args());

        if let Some(cwd) = cmd.cwd() {
            command.current_dir(cwd);
        }

        match cmd.stdin() {
            Some(path) => command.stdin(File::open(path)?),
            None => command.stdin(Stdio::null()),
        };

        if let Some(log) = cmd.log() {
            let mut file = OpenOptions::new().create(true).append(true).open(log)?;
            writeln!(file, "-- {cmd}")?;
            command.stdout(file.try_clone()?).stderr(file);
        }

        command.status()
    }
}
