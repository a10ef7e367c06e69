//! Build pipeline: host check, source extraction, patching and upstream build.
//!
//! Stages run once, strictly in order. The first failure stops the pipeline and is returned
//! as is; nothing is retried or rolled back.

pub mod build;
pub mod exec;
pub mod host;
pub mod patch;
pub mod source;

use crate::config::Config;
use crate::error::Error;
use crate::layout::Layout;
use crate::pipeline::build::{BuildArtifact, BuildRunner, Step};
use crate::pipeline::exec::Executor;
use crate::pipeline::host::{HostChecker, HostProfile};
use crate::pipeline::patch::PatchApplier;
use crate::pipeline::source::SourceStager;
use crate::{gf_info, muted_error};
use std::fs;
use std::io;
use std::path::PathBuf;

/// Everything a pipeline run needs. Stages never look at the process working directory
/// or other global state.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub layout: Layout,
    pub config: Config,
    /// Scripting runtime installation (`--with-python=<dir>`), auto-detect if unset.
    pub runtime_dir: Option<PathBuf>,
    /// Commit pristine source and every applied patch into a git repository.
    pub dev_mode: bool,
}

impl BuildContext {
    pub fn new(layout: Layout, config: Config) -> Self {
        Self {
            layout,
            config,
            runtime_dir: None,
            dev_mode: false,
        }
    }

    const STAGE_LOGS: [&'static str; 3] = ["extract", "patch", "checkpoint"];

    /// Create log directory and drop logs of a previous run.
    fn prepare_logs(&self) -> Result<(), Error> {
        fs::create_dir_all(&self.layout.log_dir)?;
        let step_logs = Step::ALL.map(<&'static str>::from);
        for name in Self::STAGE_LOGS.iter().chain(step_logs.iter()) {
            muted_error!(fs::remove_file(self.layout.log(name)));
        }
        Ok(())
    }

    /// Forget a previous build. The marker comes back only when this run installs.
    fn drop_marker(&self) -> Result<(), Error> {
        match fs::remove_file(&self.layout.marker) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

pub struct BuildPipeline<'a, E: Executor> {
    ctx: &'a BuildContext,
    profile: HostProfile,
    executor: E,
}

impl<'a, E: Executor> BuildPipeline<'a, E> {
    pub fn new(ctx: &'a BuildContext, profile: HostProfile, executor: E) -> Self {
        Self {
            ctx,
            profile,
            executor,
        }
    }

    /// Run all stages. Nothing is written before host and configuration are validated.
    pub fn run(&mut self) -> Result<BuildArtifact, Error> {
        let config = &self.ctx.config;
        let report = HostChecker::new(&config.host, &config.runtime).check(&self.profile)?;
        gf_info!(target: "pipeline", "found {} ({})", report.header, report.path.display());

        let archive = config.archive()?;
        let patches = config.patch_set()?;

        self.ctx.prepare_logs()?;
        self.ctx.drop_marker()?;
        gf_info!(
            target: "pipeline",
            "(about to compile {}.. this will definitely take a while)",
            archive.dir_name()
        );

        let tree = SourceStager::new(self.ctx).stage(&archive, &mut self.executor)?;
        PatchApplier::new(self.ctx).apply(&tree, &patches, &mut self.executor)?;
        BuildRunner::new(self.ctx).run(&tree, &mut self.executor)
    }
}
