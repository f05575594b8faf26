//! Project directory naming and resolution.
//!
//! The external CLI stores each project's logs under a directory named after
//! the project's absolute path with every non-alphanumeric character replaced
//! by `-`. When the tool runs from a sub-path the directory name gains a
//! `-suffix`, so resolution accepts those too.

use agentdesk_types::error::HistoryError;

/// Encode a filesystem path the way the CLI names project directories.
pub fn encode_project_path(path: &str) -> String {
    path.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

/// Accept either an encoded name or a raw path.
pub fn normalize_project_arg(arg: &str) -> String {
    if arg.contains('/') || arg.contains('\\') {
        encode_project_path(arg)
    } else {
        arg.to_string()
    }
}

/// Reject names that could escape the history root.
pub fn validate_project_name(name: &str) -> Result<(), HistoryError> {
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(HistoryError::InvalidProject(name.to_string()));
    }
    Ok(())
}

/// Exact match first, else the first (sorted) directory named
/// `<encoded>-<suffix>`.
pub fn resolve_project_dir(names: &[String], encoded: &str) -> Option<String> {
    if names.iter().any(|n| n == encoded) {
        return Some(encoded.to_string());
    }
    let prefix = format!("{encoded}-");
    let mut candidates: Vec<&String> = names.iter().filter(|n| n.starts_with(&prefix)).collect();
    candidates.sort();
    candidates.first().map(|n| (*n).clone())
}

/// All directories that may hold fragments for `encoded`: the resolved one
/// first, then every other sub-path directory in name order.
pub fn related_project_dirs(names: &[String], encoded: &str, resolved: &str) -> Vec<String> {
    let prefix = format!("{encoded}-");
    let mut others: Vec<String> = names
        .iter()
        .filter(|n| n.as_str() != resolved && n.starts_with(&prefix))
        .cloned()
        .collect();
    others.sort();

    let mut dirs = Vec::with_capacity(others.len() + 1);
    dirs.push(resolved.to_string());
    dirs.extend(others);
    dirs
}
