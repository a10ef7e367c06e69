//! Start the built debugger with the scripting extension preloaded, attached to a running
//! interpreter or spawning a new one.

use crate::error::Error;
use crate::gf_debug;
use crate::pipeline::build::BuildArtifact;
use crate::utils::shell_join;
use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use std::convert::Infallible;
use std::ffi::OsString;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Literal argument that selects spawn mode.
pub const NO_TARGET: &str = "none";

/// Two-line usage text.
pub fn usage() -> String {
    format!(
        "Usage:\n  {bin} <pid> | {bin} {NO_TARGET} | {bin} <interpreter> <pid>",
        bin = env!("CARGO_PKG_NAME")
    )
}

/// What the debugger should do once started.
#[derive(Debug, Clone, PartialEq)]
pub enum LaunchTarget {
    /// Attach to a running process. `interpreter` is the binary given in the legacy
    /// `<interpreter> <pid>` form, gdb loads it as the program and uses it on `run`.
    Attach {
        pid: Pid,
        interpreter: Option<PathBuf>,
    },
    /// Start a new interpreter under debugger control.
    Spawn { interpreter: PathBuf },
}

fn parse_pid(arg: &str) -> Option<Pid> {
    if arg.is_empty() || !arg.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    arg.parse::<i32>().ok().filter(|pid| *pid > 0).map(Pid::from_raw)
}

impl LaunchTarget {
    /// Parse launcher arguments. Accepted shapes: `<pid>`, `none` and the legacy
    /// `<interpreter-path> <pid>` where the interpreter is an existing file.
    ///
    /// # Arguments
    ///
    /// * `args`: positional arguments
    /// * `host_interpreter`: resolves the interpreter to spawn, called only for `none`
    pub fn parse<S: AsRef<str>>(
        args: &[S],
        host_interpreter: impl FnOnce() -> Result<PathBuf, Error>,
    ) -> Result<Self, Error> {
        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        match args.as_slice() {
            [NO_TARGET] => Ok(LaunchTarget::Spawn {
                interpreter: host_interpreter()?,
            }),
            [pid] => match parse_pid(pid) {
                Some(pid) => Ok(LaunchTarget::Attach {
                    pid,
                    interpreter: None,
                }),
                None => Err(Error::Usage(format!("invalid process id `{pid}`"))),
            },
            [interpreter, pid] => {
                let pid =
                    parse_pid(pid).ok_or_else(|| Error::Usage(format!("invalid process id `{pid}`")))?;
                let interpreter = PathBuf::from(interpreter);
                if !interpreter.is_file() {
                    return Err(Error::Usage(format!(
                        "interpreter `{}` is not a file",
                        interpreter.display()
                    )));
                }
                Ok(LaunchTarget::Attach {
                    pid,
                    interpreter: Some(interpreter),
                })
            }
            _ => Err(Error::Usage(format!(
                "expected 1 or 2 arguments, got {}",
                args.len()
            ))),
        }
    }
}

/// Find interpreter binary in `PATH`.
pub fn resolve_interpreter(name: &str) -> Result<PathBuf, Error> {
    which::which(name).map_err(|source| Error::InterpreterNotFound {
        name: name.to_string(),
        source,
    })
}

/// Fail if there is no process with this pid. A process owned by another user counts as
/// existing, attaching to it is the debugger's business.
pub fn ensure_process_exists(pid: Pid) -> Result<(), Error> {
    match kill(pid, None) {
        Ok(()) | Err(Errno::EPERM) => Ok(()),
        Err(_) => Err(Error::ProcessNotFound(pid)),
    }
}

/// Debugger command line ready to replace the current process.
/// Paths go into argv byte for byte, quoting is only used to print it.
#[derive(Debug, Clone, PartialEq)]
pub struct Launch {
    program: PathBuf,
    args: Vec<OsString>,
}

impl Launch {
    /// Build debugger command line: `gdb [program] -ex 'source <script>' [-ex 'attach <pid>']`.
    pub fn new(artifact: &BuildArtifact, script: &Path, target: &LaunchTarget) -> Self {
        let mut args: Vec<OsString> = vec![];
        let interpreter = match target {
            LaunchTarget::Attach { interpreter, .. } => interpreter.as_deref(),
            LaunchTarget::Spawn { interpreter } => Some(interpreter.as_path()),
        };
        if let Some(interpreter) = interpreter {
            args.push(interpreter.as_os_str().to_owned());
        }

        let mut source = OsString::from("source ");
        source.push(script);
        args.push("-ex".into());
        args.push(source);

        if let LaunchTarget::Attach { pid, .. } = target {
            args.push("-ex".into());
            args.push(format!("attach {pid}").into());
        }

        Self {
            program: artifact.debugger.clone(),
            args,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Full argument vector, program first.
    pub fn argv(&self) -> Vec<OsString> {
        let mut argv = vec![self.program.as_os_str().to_owned()];
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// Printable command line. Bytes that aren't valid UTF-8 are shown replaced.
    pub fn command_line(&self) -> String {
        shell_join(self.argv().iter().map(|arg| arg.to_string_lossy()))
    }

    /// Replace current process image with the debugger. Returns only if `execve` fails.
    pub fn exec(self) -> Result<Infallible, Error> {
        gf_debug!(target: "launcher", "exec {}", self.command_line());
        let err = Command::new(&self.program).args(&self.args).exec();
        Err(Error::Exec {
            command: self.command_line(),
            source: err,
        })
    }
}
