use crate::error::Error;
use crate::gf_info;
use crate::layout::Layout;
use crate::pipeline::exec::{Executor, ExternalCommand};
use crate::pipeline::BuildContext;
use std::ffi::OsString;
use std::fs;
use std::fs::{File, FileTimes};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use strum_macros::{Display, IntoStaticStr};

/// Default for `--with-python`, lets upstream configure find the runtime.
pub const AUTO_DETECT: &str = "yes";

/// Upstream build steps, in execution order.
#[derive(Copy, Clone, PartialEq, Debug, Display, IntoStaticStr)]
pub enum Step {
    #[strum(serialize = "configure")]
    Configure,
    #[strum(serialize = "compile")]
    Compile,
    #[strum(serialize = "install")]
    Install,
}

impl Step {
    pub const ALL: [Step; 3] = [Step::Configure, Step::Compile, Step::Install];
}

/// Installed debugger.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildArtifact {
    pub prefix: PathBuf,
    pub debugger: PathBuf,
}

impl BuildArtifact {
    fn new(prefix: &Path) -> Self {
        Self {
            prefix: prefix.to_path_buf(),
            debugger: prefix.join("bin").join("gdb"),
        }
    }

    /// Return installed debugger if a build was completed, [`Error::NotBuilt`] otherwise.
    pub fn locate(layout: &Layout) -> Result<Self, Error> {
        if !layout.marker.is_file() {
            return Err(Error::NotBuilt(layout.marker.clone()));
        }
        Ok(Self::new(&layout.prefix))
    }
}

/// Runs configure, make and make install against a patched tree.
pub struct BuildRunner<'a> {
    ctx: &'a BuildContext,
}

impl<'a> BuildRunner<'a> {
    pub fn new(ctx: &'a BuildContext) -> Self {
        Self { ctx }
    }

    fn command(&self, step: Step, tree: &Path) -> ExternalCommand {
        let cmd = match step {
            Step::Configure => {
                let mut prefix = OsString::from("--prefix=");
                prefix.push(&self.ctx.layout.prefix);
                prefix.push("/");
                let mut python = OsString::from("--with-python=");
                match &self.ctx.runtime_dir {
                    Some(dir) => python.push(dir),
                    None => python.push(AUTO_DETECT),
                }
                ExternalCommand::new(tree.join("configure"), [prefix, python])
            }
            Step::Compile => ExternalCommand::new("make", Vec::<String>::new()),
            Step::Install => ExternalCommand::new("make", ["install"]),
        };
        cmd.current_dir(tree)
            .log_to(self.ctx.layout.log(step.into()))
    }

    /// Run all steps, stop at the first failed one. Touch completion marker on success.
    pub fn run(&self, tree: &Path, executor: &mut dyn Executor) -> Result<BuildArtifact, Error> {
        for step in Step::ALL {
            gf_info!(target: "pipeline", "{step} {}", tree.display());
            self.command(step, tree)
                .run(executor)
                .map_err(|failure| Error::Build {
                    step,
                    failure,
                    extra_logs: match step {
                        Step::Configure => vec![tree.join("config.log")],
                        _ => vec![],
                    },
                })?;
        }

        fs::create_dir_all(&self.ctx.layout.prefix)?;
        touch(&self.ctx.layout.marker)?;
        Ok(BuildArtifact::new(&self.ctx.layout.prefix))
    }
}

/// Create file or update its modification time.
fn touch(path: &Path) -> std::io::Result<()> {
    let file = File::options().create(true).append(true).open(path)?;
    file.set_times(FileTimes::new().set_modified(SystemTime::now()))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::Config;
    use crate::pipeline::exec::testing::{exit_status, ScriptedExecutor};
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    fn context(root: &Path) -> (BuildContext, PathBuf) {
        let layout = Layout::from_root(root);
        fs::create_dir_all(&layout.log_dir).unwrap();
        let tree = layout.source_dir.join("gdb-7.2");
        fs::create_dir_all(&tree).unwrap();
        (BuildContext::new(layout, Config::default()), tree)
    }

    #[test]
    fn test_build_steps() {
        let root = tempfile::tempdir().unwrap();
        let (ctx, tree) = context(root.path());
        let mut executor = ScriptedExecutor::succeeding();

        let artifact = BuildRunner::new(&ctx).run(&tree, &mut executor).unwrap();
        assert_eq!(
            executor.programs(),
            vec![
                format!(
                    "{}/configure --prefix={}/ --with-python=yes",
                    tree.display(),
                    ctx.layout.prefix.display()
                ),
                "make".to_string(),
                "make install".to_string(),
            ]
        );
        assert_eq!(
            executor.history[2].log(),
            Some(ctx.layout.log("install").as_path())
        );
        assert_eq!(artifact.debugger, ctx.layout.prefix.join("bin/gdb"));
        assert!(ctx.layout.marker.is_file());
        assert_eq!(BuildArtifact::locate(&ctx.layout).unwrap(), artifact);
    }

    #[test]
    fn test_runtime_dir_override() {
        let root = tempfile::tempdir().unwrap();
        let (mut ctx, tree) = context(root.path());
        ctx.runtime_dir = Some(PathBuf::from("/opt/python2.6"));
        let mut executor = ScriptedExecutor::succeeding();

        BuildRunner::new(&ctx).run(&tree, &mut executor).unwrap();
        assert!(executor.programs()[0].ends_with("--with-python=/opt/python2.6"));
    }

    #[test]
    fn test_configure_args_keep_raw_bytes() {
        let root = PathBuf::from(OsStr::from_bytes(b"/opt/gf-\xff"));
        let mut ctx = BuildContext::new(Layout::from_root(&root), Config::default());
        ctx.runtime_dir = Some(PathBuf::from(OsStr::from_bytes(b"/opt/py-\xfe")));
        let tree = ctx.layout.source_dir.join("gdb-7.2");

        let cmd = BuildRunner::new(&ctx).command(Step::Configure, &tree);
        assert_eq!(
            cmd.program().as_bytes(),
            b"/opt/gf-\xff/ext/src/gdb-7.2/configure"
        );
        assert_eq!(cmd.args()[0].as_bytes(), b"--prefix=/opt/gf-\xff/ext/dst/");
        assert_eq!(cmd.args()[1].as_bytes(), b"--with-python=/opt/py-\xfe");
    }

    #[test]
    fn test_abort_at_first_failed_step() {
        struct TestCase {
            failed: Step,
            expected_runs: usize,
        }
        let test_cases = [
            TestCase {
                failed: Step::Configure,
                expected_runs: 1,
            },
            TestCase {
                failed: Step::Compile,
                expected_runs: 2,
            },
            TestCase {
                failed: Step::Install,
                expected_runs: 3,
            },
        ];

        for tc in test_cases {
            let root = tempfile::tempdir().unwrap();
            let (ctx, tree) = context(root.path());
            let failed_log = ctx.layout.log(tc.failed.into());
            let mut executor = ScriptedExecutor::new(move |cmd| {
                if cmd.log() == Some(failed_log.as_path()) {
                    Ok(exit_status(2))
                } else {
                    Ok(exit_status(0))
                }
            });

            let err = BuildRunner::new(&ctx).run(&tree, &mut executor).unwrap_err();
            assert!(matches!(err, Error::Build { step, .. } if step == tc.failed));
            assert_eq!(executor.history.len(), tc.expected_runs);
            assert!(!ctx.layout.marker.exists());
            assert!(BuildArtifact::locate(&ctx.layout).is_err());

            let logs = err.logs();
            assert_eq!(logs[0], ctx.layout.log(tc.failed.into()));
            if tc.failed == Step::Configure {
                assert_eq!(logs[1], tree.join("config.log"));
            }
        }
    }

    #[test]
    fn test_touch_keeps_content() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("build.complete");
        touch(&marker).unwrap();
        fs::write(&marker, "keep").unwrap();
        touch(&marker).unwrap();
        assert_eq!(fs::read_to_string(&marker).unwrap(), "keep");
    }
}
