use std::path::{Path, PathBuf};

/// Ordered list of source files sent to the renderer.
///
/// The manifest is always the first entry; later entries keep the order in
/// which they were appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSet {
    paths: Vec<PathBuf>,
}

impl FileSet {
    pub fn starting_with(manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![manifest_path.into()],
        }
    }

    pub fn append<I>(&mut self, files: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.paths.extend(files);
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }
}

impl IntoIterator for FileSet {
    type Item = PathBuf;
    type IntoIter = std::vec::IntoIter<PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}
