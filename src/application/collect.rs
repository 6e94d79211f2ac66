//! Enumeration of the files a project sends to the renderer.

use std::path::{Path, PathBuf};

use etex_manifest::Manifest;
use thiserror::Error;
use walkdir::WalkDir;

use crate::domain::{
    file_set::FileSet,
    project::{ProjectLayout, resolve_under},
};

#[derive(Debug, Error)]
#[error("failed to collect files under {path}: {source}")]
pub struct CollectError {
    pub path: String,
    #[source]
    pub source: walkdir::Error,
}

/// Every non-directory entry below `root + subpath`, depth first, with each
/// directory level visited in file-name order.
pub fn collect(root: &Path, subpath: &str) -> Result<Vec<PathBuf>, CollectError> {
    collect_under(&resolve_under(root, subpath))
}

fn collect_under(start: &Path) -> Result<Vec<PathBuf>, CollectError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(start).sort_by_file_name() {
        let entry = entry.map_err(|source| CollectError {
            path: start.display().to_string(),
            source,
        })?;
        if !entry.file_type().is_dir() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Build the ordered file set for a project: the manifest, then the sources,
/// then figures and styles when declared.
pub fn files_to_archive(
    layout: &ProjectLayout,
    manifest: &Manifest,
) -> Result<FileSet, CollectError> {
    let mut files = FileSet::starting_with(layout.manifest_path());
    files.append(collect_under(&layout.resolve(&manifest.files_path))?);
    if let Some(figures) = manifest.figures_dir() {
        files.append(collect_under(&layout.resolve(figures))?);
    }
    if let Some(styles) = manifest.styles_dir() {
        files.append(collect_under(&layout.resolve(styles))?);
    }

    tracing::debug!(
        target = "etex::collect",
        files = files.len(),
        root = %layout.root().display(),
        "Collected project files"
    );
    Ok(files)
}
