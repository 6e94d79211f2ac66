//! Manifest-relative path handling.
//!
//! Every path a manifest declares is interpreted against the manifest's own
//! directory, never the process working directory. [`ProjectLayout`] carries
//! that directory explicitly through collection, archiving and extraction.

use std::path::{Component, Path, PathBuf};

use etex_manifest::Manifest;

use super::error::DomainError;

/// Location of a project on disk, anchored at its manifest file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    manifest_path: PathBuf,
    root: PathBuf,
}

impl ProjectLayout {
    pub fn for_manifest(manifest_path: impl Into<PathBuf>) -> Self {
        let manifest_path = manifest_path.into();
        let root = manifest_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            manifest_path,
            root,
        }
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    /// Directory containing the manifest. Empty when the manifest path has no
    /// parent component, which joins like the current directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_name(&self) -> String {
        etex_manifest::manifest_name(&self.manifest_path)
    }

    /// Join a manifest-declared path under the project root.
    ///
    /// A leading `/` is treated as project-relative: manifests commonly write
    /// `figures_path: /images` to mean `<root>/images`.
    pub fn resolve(&self, declared: &str) -> PathBuf {
        resolve_under(&self.root, declared)
    }

    /// Directory the rendered output is unpacked into.
    pub fn output_dir(&self, manifest: &Manifest) -> PathBuf {
        self.resolve(&manifest.output_path)
    }

    /// Archive member name for `file`: its path relative to the project root,
    /// joined with `/` whatever the host separator is.
    pub fn member_name(&self, file: &Path) -> Result<String, DomainError> {
        let outside = || {
            DomainError::outside_project(file.display().to_string(), self.root.display().to_string())
        };
        let relative = file.strip_prefix(&self.root).map_err(|_| outside())?;

        let mut segments = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(segment) => {
                    let segment = segment
                        .to_str()
                        .ok_or_else(|| DomainError::unrepresentable(file.display().to_string()))?;
                    segments.push(segment);
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(outside());
                }
            }
        }

        if segments.is_empty() {
            return Err(DomainError::unrepresentable(file.display().to_string()));
        }
        Ok(segments.join("/"))
    }
}

/// Join `declared` under `root`, dropping any root or prefix component so the
/// result never leaves `root` through an absolute path.
pub fn resolve_under(root: &Path, declared: &str) -> PathBuf {
    let mut resolved = root.to_path_buf();
    for component in Path::new(declared).components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            other => resolved.push(other.as_os_str()),
        }
    }
    if resolved.as_os_str().is_empty() {
        resolved.push(".");
    }
    resolved
}
