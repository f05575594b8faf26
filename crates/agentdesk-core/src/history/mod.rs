//! History reconstruction engine.
//!
//! Reads append-only fragment files through a [`source::FragmentSource`],
//! parses them permissively, merges and deduplicates same-session fragments
//! across files, restores missing timestamps, and derives summaries.

pub mod engine;
pub mod merge;
pub mod parse;
pub mod project;
pub mod source;
pub mod summary;
pub mod timestamps;

pub use engine::HistoryEngine;
pub use project::encode_project_path;
pub use source::{FragmentFileMeta, FragmentSource};
