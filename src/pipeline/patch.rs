use crate::error::Error;
use crate::pipeline::exec::{Executor, ExternalCommand};
use crate::pipeline::BuildContext;
use crate::version::Version;
use crate::{gf_info, gf_warn};
use std::path::{Path, PathBuf};

/// Ordered patch list of an upstream version. Later patches may depend on earlier ones.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchSet {
    version: Version,
    ids: Vec<String>,
}

impl PatchSet {
    pub fn new(version: Version, ids: Vec<String>) -> Self {
        Self { version, ids }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Successfully applied patch.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedPatch {
    pub id: String,
    /// 1-based position in the patch set.
    pub position: usize,
}

/// Applies a [`PatchSet`] to an extracted tree, in order, stopping at the first failure.
/// Already applied patches are never rolled back.
pub struct PatchApplier<'a> {
    ctx: &'a BuildContext,
}

impl<'a> PatchApplier<'a> {
    pub fn new(ctx: &'a BuildContext) -> Self {
        Self { ctx }
    }

    fn patch_file(&self, id: &str) -> PathBuf {
        self.ctx.layout.patches_dir.join(format!("{id}.patch"))
    }

    /// Apply patches.
    ///
    /// # Arguments
    ///
    /// * `tree`: extracted source tree
    /// * `patches`: patch set of the pinned version
    /// * `executor`: runner for `patch` (and `git` in developer mode)
    pub fn apply(
        &self,
        tree: &Path,
        patches: &PatchSet,
        executor: &mut dyn Executor,
    ) -> Result<Vec<AppliedPatch>, Error> {
        let upstream = &self.ctx.config.upstream;
        let patch_root = tree.join(&upstream.patch_root);
        let checkpoint = self
            .ctx
            .dev_mode
            .then(|| Checkpoint::new(&patch_root, self.ctx.layout.log("checkpoint")));

        if let Some(checkpoint) = &checkpoint {
            checkpoint.init(executor);
        }

        let total = patches.len();
        gf_info!(target: "pipeline", "{total} patches for version {}", patches.version());
        let mut applied = Vec::with_capacity(total);
        for (idx, id) in patches.ids().iter().enumerate() {
            let position = idx + 1;
            let file = self.patch_file(id);
            if !file.is_file() {
                return Err(Error::PatchNotFound {
                    id: id.clone(),
                    position,
                    total,
                    path: file,
                });
            }

            gf_info!(target: "pipeline", "apply patch {id} ({position}/{total})");
            ExternalCommand::new("patch", [format!("-p{}", upstream.strip)])
                .current_dir(&patch_root)
                .stdin_file(file)
                .log_to(self.ctx.layout.log("patch"))
                .run(executor)
                .map_err(|failure| Error::Patch {
                    id: id.clone(),
                    position,
                    total,
                    failure,
                })?;

            if let Some(checkpoint) = &checkpoint {
                checkpoint.commit(id, executor);
            }
            applied.push(AppliedPatch {
                id: id.clone(),
                position,
            });
        }

        Ok(applied)
    }
}

/// Records the pristine tree and every applied patch as git commits.
/// Failures here are only reported, the build never depends on them.
struct Checkpoint {
    dir: PathBuf,
    log: PathBuf,
}

impl Checkpoint {
    const IDENTITY: [&'static str; 4] = [
        "-c",
        "user.name=gdbforge",
        "-c",
        "user.email=gdbforge@localhost",
    ];

    fn new(dir: &Path, log: PathBuf) -> Self {
        Self {
            dir: dir.to_path_buf(),
            log,
        }
    }

    fn git<'s>(&self, args: impl IntoIterator<Item = &'s str>) -> ExternalCommand {
        let args = Self::IDENTITY
            .iter()
            .map(ToString::to_string)
            .chain(args.into_iter().map(ToString::to_string));
        ExternalCommand::new("git", args)
            .current_dir(&self.dir)
            .log_to(&self.log)
    }

    fn init(&self, executor: &mut dyn Executor) {
        let steps = [
            self.git(["init", "-q"]),
            self.git(["add", "."]),
            self.git(["commit", "-q", "-m", "initial source"]),
        ];
        for step in steps {
            if let Err(failure) = step.run(executor) {
                gf_warn!(target: "pipeline", "baseline checkpoint skipped: {failure}");
                return;
            }
        }
    }

    fn commit(&self, id: &str, executor: &mut dyn Executor) {
        if let Err(failure) = self.git(["commit", "-q", "-am", id]).run(executor) {
            gf_warn!(target: "pipeline", "checkpoint for {id} skipped: {failure}");
        }
    }
}
