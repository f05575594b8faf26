//! Local-disk [`FragmentSource`].
//!
//! Layout: `<root>/<encoded-project>/<session>.jsonl`, with occasional
//! nested fragment files (sub-agent transcripts) a few levels below the
//! project directory. The tree is owned by the external tool and only read
//! here.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use agentdesk_core::history::project::validate_project_name;
use agentdesk_core::history::source::{FragmentFileMeta, FragmentSource};
use agentdesk_types::error::HistoryError;

/// Directory levels below a project that are searched for fragment files.
const MAX_SCAN_DEPTH: usize = 3;

const FRAGMENT_EXTENSION: &str = "jsonl";

/// Reads fragment files under a history root. All I/O goes through `tokio::fs`.
#[derive(Debug, Clone)]
pub struct LocalFragmentSource {
    root: PathBuf,
}

impl LocalFragmentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FragmentSource for LocalFragmentSource {
    async fn list_projects(&self) -> Result<Vec<String>, HistoryError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.root.display(), "history root does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(HistoryError::io("listing projects", &self.root, e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| HistoryError::io("listing projects", &self.root, e))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn list_fragment_files(&self, project: &str) -> Result<Vec<FragmentFileMeta>, HistoryError> {
        validate_project_name(project)?;
        let project_dir = self.root.join(project);
        match tokio::fs::metadata(&project_dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(HistoryError::ProjectNotFound(project.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(HistoryError::ProjectNotFound(project.to_string()));
            }
            Err(e) => return Err(HistoryError::io("reading project", &project_dir, e)),
        }

        let mut files = Vec::new();
        let mut pending = vec![(project_dir, 0usize)];
        while let Some((dir, depth)) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %dir.display(), error = %e, "skipping unreadable directory");
                    continue;
                }
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| HistoryError::io("scanning project", &dir, e))?
            {
                let path = entry.path();
                let Ok(meta) = entry.metadata().await else {
                    continue;
                };
                if meta.is_dir() {
                    if depth + 1 < MAX_SCAN_DEPTH {
                        pending.push((path, depth + 1));
                    }
                    continue;
                }
                if path.extension().and_then(|e| e.to_str()) != Some(FRAGMENT_EXTENSION) {
                    continue;
                }
                let modified = meta
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now());
                files.push(FragmentFileMeta { path, modified });
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    async fn read_fragment(&self, path: &Path) -> Result<String, HistoryError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| HistoryError::io("reading fragment", path, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentdesk_core::history::HistoryEngine;
    use tempfile::TempDir;

    async fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.unwrap();
        }
        tokio::fs::write(path, content).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_root_lists_no_projects() {
        let tmp = TempDir::new().unwrap();
        let source = LocalFragmentSource::new(tmp.path().join("absent"));
        assert!(source.list_projects().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lists_project_dirs_only() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::create_dir_all(tmp.path().join("-b-proj")).await.unwrap();
        tokio::fs::create_dir_all(tmp.path().join("-a-proj")).await.unwrap();
        write(&tmp.path().join("stray.txt"), "x").await;

        let source = LocalFragmentSource::new(tmp.path());
        assert_eq!(source.list_projects().await.unwrap(), vec!["-a-proj", "-b-proj"]);
    }

    #[tokio::test]
    async fn test_fragment_files_scanned_to_depth() {
        let tmp = TempDir::new().unwrap();
        let project = tmp.path().join("-p");
        write(&project.join("abc.jsonl"), "").await;
        write(&project.join("notes.md"), "").await;
        write(&project.join("abc/subagents/agent-1.jsonl"), "").await;
        write(&project.join("a/b/c/too-deep.jsonl"), "").await;

        let source = LocalFragmentSource::new(tmp.path());
        let files = source.list_fragment_files("-p").await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.strip_prefix(&project).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![PathBuf::from("abc.jsonl"), PathBuf::from("abc/subagents/agent-1.jsonl")]
        );
    }

    #[tokio::test]
    async fn test_missing_project_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let source = LocalFragmentSource::new(tmp.path());
        let err = source.list_fragment_files("-nope").await.unwrap_err();
        assert!(matches!(err, HistoryError::ProjectNotFound(_)));
        let err = source.list_fragment_files("../etc").await.unwrap_err();
        assert!(matches!(err, HistoryError::InvalidProject(_)));
    }

    #[tokio::test]
    async fn test_read_fragment_lossy() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("f.jsonl");
        tokio::fs::write(&path, b"ok\xff\n").await.unwrap();
        let source = LocalFragmentSource::new(tmp.path());
        let text = source.read_fragment(&path).await.unwrap();
        assert!(text.starts_with("ok"));
        assert!(source.read_fragment(&tmp.path().join("gone.jsonl")).await.is_err());
    }

    #[tokio::test]
    async fn test_engine_over_disk_tree() {
        let tmp = TempDir::new().unwrap();
        let project = tmp.path().join("-work-app");
        let first = concat!(
            r#"{"type":"user","sessionId":"abc","uuid":"u1","timestamp":"2025-01-01T10:00:00Z","message":{"role":"user","content":"hi"}}"#,
            "\n",
            "{broken\n",
            r#"{"type":"assistant","sessionId":"abc","uuid":"a1","timestamp":"2025-01-01T10:00:05Z","message":{"role":"assistant","content":[{"type":"text","text":"hello"}]}}"#,
            "\n",
        );
        write(&project.join("abc.jsonl"), first).await;
        write(
            &project.join("abc/subagents/agent-helper-1.jsonl"),
            r#"{"type":"assistant","sessionId":"abc","agentId":"helper-1","isSidechain":true,"timestamp":"2025-01-01T10:00:02Z","message":{"role":"assistant","content":"searching"}}"#,
        )
        .await;

        let engine = HistoryEngine::new(LocalFragmentSource::new(tmp.path()), 100);
        let summaries = engine.list_summaries("-work-app").await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].message_count, 2);
        assert_eq!(summaries[0].last_message_preview, "hello");
        assert!(summaries[0].agent_id.is_none());

        let conversation = engine.reconstruct("-work-app", "abc").await.unwrap();
        assert_eq!(conversation.messages.len(), 2);
        assert_eq!(conversation.metadata.skipped_lines, 1);
    }
}
