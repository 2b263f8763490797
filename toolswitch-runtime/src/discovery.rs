use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// A name list containing `L` is a `-` separated list of prefixes, each kept
/// with its trailing `-`. Anything else is a single prefix.
pub fn instance_prefixes(names: &str) -> Vec<String> {
    if names.contains('L') {
        names
            .split('-')
            .filter(|part| !part.is_empty())
            .map(|part| format!("{}-", part))
            .collect()
    } else {
        vec![names.to_string()]
    }
}

/// Files of `dir` whose name starts with one of the prefixes, sorted within
/// each prefix, prefixes in the order given.
pub fn discover_instances(dir: &Path, names: &str) -> Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to list instance directory {}", dir.display()))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .map(|e| e.path())
        .collect();
    entries.sort();

    let mut files = Vec::new();
    for prefix in instance_prefixes(names) {
        files.extend(
            entries
                .iter()
                .filter(|path| {
                    path.file_name()
                        .map(|name| name.to_string_lossy().starts_with(prefix.as_str()))
                        .unwrap_or(false)
                })
                .cloned(),
        );
    }

    if files.is_empty() {
        bail!(
            "No files found in {} matching the prefix '{}'",
            dir.display(),
            names
        );
    }
    Ok(files)
}
