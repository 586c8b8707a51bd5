//! CSV-directory sink.
//!
//! Each table is first written to a `.partial` file next to its final name.
//! [`CsvDirectorySink::commit`] renames every staged file once the whole run
//! has loaded; [`CsvDirectorySink::rollback`] deletes them instead, so a
//! failed run never leaves a mix of new and old cleaned tables behind.

use crate::{IoError, write_table};
use ecom_cleaner::{Sink, SinkError, Table};
use ecom_core::Entity;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Writes one `<entity>_cleaned.csv` per entity into a directory.
#[derive(Debug)]
pub struct CsvDirectorySink {
    dir: PathBuf,
    delimiter: u8,
    staged: Vec<(PathBuf, PathBuf)>,
}

impl CsvDirectorySink {
    /// Creates a sink writing into `dir` with the given delimiter.
    pub fn new(dir: impl AsRef<Path>, delimiter: u8) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            delimiter,
            staged: Vec::new(),
        }
    }

    /// Final path of an entity's cleaned table.
    pub fn path_of(&self, entity: Entity) -> PathBuf {
        self.dir.join(entity.cleaned_file_name())
    }

    /// Number of tables staged and not yet committed.
    pub fn staged(&self) -> usize {
        self.staged.len()
    }

    /// Moves every staged table to its final name; returns the final paths.
    pub fn commit(&mut self) -> Result<Vec<PathBuf>, IoError> {
        let mut committed = Vec::with_capacity(self.staged.len());
        for (staging, target) in self.staged.drain(..) {
            fs::rename(&staging, &target).map_err(|e| IoError::io(&target, e))?;
            committed.push(target);
        }
        info!("Committed {} cleaned table(s) to {}", committed.len(), self.dir.display());
        Ok(committed)
    }

    /// Deletes every staged table.
    pub fn rollback(&mut self) {
        for (staging, _) in self.staged.drain(..) {
            if let Err(e) = fs::remove_file(&staging) {
                warn!("Failed to remove {}: {}", staging.display(), e);
            }
        }
    }
}

impl Sink for CsvDirectorySink {
    fn load(&mut self, entity: Entity, table: &Table) -> Result<(), SinkError> {
        let target = self.path_of(entity);
        let staging = self.dir.join(format!("{}.partial", entity.cleaned_file_name()));

        write_table(&staging, table, self.delimiter).map_err(|e| match e {
            IoError::Io { source, .. } => SinkError::Io(source),
            other => SinkError::rejected(other.to_string()),
        })?;

        debug!("Staged {} at {}", entity, staging.display());
        self.staged.push((staging, target));
        Ok(())
    }
}
