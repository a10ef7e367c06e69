use crate::config::Compression;
use crate::error::Error;
use crate::gf_info;
use crate::pipeline::exec::{Executor, ExternalCommand};
use crate::pipeline::BuildContext;
use crate::version::Version;
use std::ffi::OsString;
use std::fs;
use std::fs::File;
use std::path::PathBuf;

/// Pinned upstream archive.
///
/// Archive file name and extraction directory name are derived from the same
/// package and version and can't be set separately.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceArchive {
    compression: Compression,
    file_name: String,
    dir_name: String,
}

impl SourceArchive {
    pub fn pinned(package: &str, version: Version, compression: Compression) -> Self {
        let dir_name = format!("{package}-{version}");
        let file_name = format!("{dir_name}.{}", compression.extension());
        Self {
            compression,
            file_name,
            dir_name,
        }
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn dir_name(&self) -> &str {
        &self.dir_name
    }
}

/// Extracts the pinned archive into a clean directory.
pub struct SourceStager<'a> {
    ctx: &'a BuildContext,
}

impl<'a> SourceStager<'a> {
    pub fn new(ctx: &'a BuildContext) -> Self {
        Self { ctx }
    }

    /// Remove a previous extraction (if any) and extract the archive again.
    /// Return path to the extracted tree.
    ///
    /// Archive presence is checked before anything is removed.
    pub fn stage(
        &self,
        archive: &SourceArchive,
        executor: &mut dyn Executor,
    ) -> Result<PathBuf, Error> {
        let source_dir = &self.ctx.layout.source_dir;
        let archive_path = source_dir.join(archive.file_name());
        if !archive_path.is_file() || File::open(&archive_path).is_err() {
            return Err(Error::ArchiveNotFound(archive_path));
        }

        let tree = source_dir.join(archive.dir_name());
        if tree.symlink_metadata().is_ok() {
            gf_info!(target: "pipeline", "remove stale source tree {}", tree.display());
            if tree.is_dir() {
                fs::remove_dir_all(&tree)?;
            } else {
                fs::remove_file(&tree)?;
            }
        }

        let mut args = vec![OsString::from("-x")];
        if let Some(flag) = archive.compression().tar_flag() {
            args.push(flag.into());
        }
        args.extend([
            OsString::from("-f"),
            OsString::from(archive.file_name()),
            OsString::from("-C"),
            source_dir.as_os_str().to_owned(),
        ]);

        ExternalCommand::new("tar", args)
            .current_dir(source_dir)
            .log_to(self.ctx.layout.log("extract"))
            .run(executor)
            .map_err(Error::Extraction)?;

        if !tree.is_dir() {
            return Err(Error::ExtractionIncomplete {
                archive: archive_path,
                dir: tree,
            });
        }

        Ok(tree)
    }
}
