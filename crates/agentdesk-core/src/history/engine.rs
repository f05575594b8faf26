//! HistoryEngine -- summaries and full transcripts for one project.

use agentdesk_types::error::HistoryError;
use agentdesk_types::history::{
    ConversationFragmentFile, ConversationMetadata, ConversationSummary, ReconstructedConversation,
};

use super::merge::{merge_session, session_ids};
use super::parse::parse_fragment;
use super::project::{related_project_dirs, resolve_project_dir, validate_project_name};
use super::source::FragmentSource;
use super::summary::summarize;
use super::timestamps::restore_timestamps;

/// Read-side engine over a [`FragmentSource`].
///
/// Stateless apart from the source: every query re-reads and re-derives.
#[derive(Debug, Clone)]
pub struct HistoryEngine<S> {
    source: S,
    preview_chars: usize,
}

impl<S: FragmentSource> HistoryEngine<S> {
    pub fn new(source: S, preview_chars: usize) -> Self {
        Self {
            source,
            preview_chars,
        }
    }

    pub fn preview_chars(&self) -> usize {
        self.preview_chars
    }

    /// Project directory names, sorted.
    pub async fn list_projects(&self) -> Result<Vec<String>, HistoryError> {
        let mut names = self.source.list_projects().await?;
        names.sort();
        Ok(names)
    }

    /// Map an encoded project name to its on-disk directory.
    pub async fn resolve_project(&self, encoded: &str) -> Result<String, HistoryError> {
        validate_project_name(encoded)?;
        let names = self.source.list_projects().await?;
        resolve_project_dir(&names, encoded)
            .ok_or_else(|| HistoryError::ProjectNotFound(encoded.to_string()))
    }

    /// Summaries of every conversation in a project, most recent first.
    ///
    /// A project without any valid fragments yields an empty list.
    pub async fn list_summaries(
        &self,
        encoded: &str,
    ) -> Result<Vec<ConversationSummary>, HistoryError> {
        let (_, files) = self.load(encoded).await?;

        let mut summaries: Vec<ConversationSummary> = session_ids(&files)
            .into_iter()
            .filter_map(|session_id| {
                let merged = merge_session(&files, &session_id);
                let agent_id = merged.agent_id.clone();
                let (messages, _) = restore_timestamps(merged.messages);
                summarize(&session_id, &messages, agent_id.as_deref(), self.preview_chars)
            })
            .collect();

        summaries.sort_by(|a, b| {
            b.last_time
                .cmp(&a.last_time)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        tracing::debug!(project = encoded, count = summaries.len(), "listed histories");
        Ok(summaries)
    }

    /// Full transcript of one session.
    pub async fn reconstruct(
        &self,
        encoded: &str,
        session_id: &str,
    ) -> Result<ReconstructedConversation, HistoryError> {
        let (project, files) = self.load(encoded).await?;

        let merged = merge_session(&files, session_id);
        if merged.messages.is_empty() {
            return Err(HistoryError::SessionNotFound {
                project: encoded.to_string(),
                session_id: session_id.to_string(),
            });
        }

        let duplicates_removed = merged.duplicates_removed;
        let (messages, timestamps_restored) = restore_timestamps(merged.messages);
        tracing::debug!(
            project = %project,
            session_id,
            messages = messages.len(),
            duplicates_removed,
            timestamps_restored,
            "reconstructed conversation"
        );

        Ok(ReconstructedConversation {
            session_id: session_id.to_string(),
            messages,
            metadata: ConversationMetadata {
                project,
                source_files: merged.source_files,
                duplicates_removed,
                timestamps_restored,
                skipped_lines: merged.skipped_lines,
                agent_id: merged.agent_id,
            },
        })
    }

    /// Parse the resolved directory's fragment files, plus records from
    /// sub-path directories that continue one of its sessions.
    /// Unreadable files are skipped with a warning.
    async fn load(
        &self,
        encoded: &str,
    ) -> Result<(String, Vec<ConversationFragmentFile>), HistoryError> {
        validate_project_name(encoded)?;
        let names = self.source.list_projects().await?;
        let resolved = resolve_project_dir(&names, encoded)
            .ok_or_else(|| HistoryError::ProjectNotFound(encoded.to_string()))?;

        let mut files = self.load_dir(&resolved).await?;
        let known = session_ids(&files);

        for dir in related_project_dirs(&names, encoded, &resolved).into_iter().skip(1) {
            let siblings = match self.load_dir(&dir).await {
                Ok(siblings) => siblings,
                Err(e) => {
                    tracing::warn!(project = %dir, error = %e, "skipping unreadable project directory");
                    continue;
                }
            };
            for mut file in siblings {
                let file_session = file.session_id.clone();
                file.records.retain(|r| {
                    known.contains(r.session_id.as_deref().unwrap_or(&file_session))
                });
                if file.records.is_empty() {
                    continue;
                }
                tracing::debug!(project = %dir, path = %file.path.display(), "session continues in sub-path directory");
                files.push(file);
            }
        }

        Ok((resolved, files))
    }

    async fn load_dir(&self, dir: &str) -> Result<Vec<ConversationFragmentFile>, HistoryError> {
        let metas = self.source.list_fragment_files(dir).await?;
        let mut files = Vec::with_capacity(metas.len());
        for meta in metas {
            match self.source.read_fragment(&meta.path).await {
                Ok(content) => files.push(parse_fragment(&meta, &content)),
                Err(e) => {
                    tracing::warn!(path = %meta.path.display(), error = %e, "skipping unreadable fragment file");
                }
            }
        }
        Ok(files)
    }
}
