//! Port for reading fragment files.
//!
//! The engine never touches the filesystem directly; agentdesk-infra
//! provides the local-disk implementation and tests use in-memory ones.

use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use agentdesk_types::error::HistoryError;

/// A fragment file as listed by a source, before it is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentFileMeta {
    pub path: PathBuf,
    pub modified: DateTime<Utc>,
}

pub trait FragmentSource: Send + Sync {
    /// Names of all project directories under the root.
    fn list_projects(&self) -> impl Future<Output = Result<Vec<String>, HistoryError>> + Send;

    /// Fragment files inside one project directory.
    ///
    /// Returns `ProjectNotFound` if the directory does not exist.
    fn list_fragment_files(
        &self,
        project: &str,
    ) -> impl Future<Output = Result<Vec<FragmentFileMeta>, HistoryError>> + Send;

    /// Full text of one fragment file.
    fn read_fragment(&self, path: &Path)
    -> impl Future<Output = Result<String, HistoryError>> + Send;
}
