//! Project manifest model shared by the etex client and server.
//!
//! A manifest is a small YAML mapping that names the directories holding a
//! document project's inputs and the directory that receives the rendered
//! output. Every path in it is relative to the manifest file's own directory.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Query parameter carrying the manifest's file name.
pub const MAKEFILE_NAME_PARAM: &str = "makefile_name";
/// Query parameter carrying the manifest's declared output directory.
pub const OUTPUT_PATH_PARAM: &str = "output_path";
/// Media type of both the request and the response body.
pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed manifest: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Declarative description of one document project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Manifest {
    pub files_path: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub figures_path: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub styles_path: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub output_path: String,
}

impl Manifest {
    pub fn from_yaml_str(source: &str) -> Result<Self, ManifestError> {
        Ok(serde_yaml::from_str(source)?)
    }

    /// Read and parse the manifest stored at `path`.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let source = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&source)
    }

    /// Figure directory, or `None` when the project declares no figures.
    pub fn figures_dir(&self) -> Option<&str> {
        non_empty(&self.figures_path)
    }

    /// Style directory, or `None` when the project declares no styles.
    pub fn styles_dir(&self) -> Option<&str> {
        non_empty(&self.styles_path)
    }
}

/// Base name of the manifest file as sent in [`MAKEFILE_NAME_PARAM`].
pub fn manifest_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// A YAML null (`~`, `null`, or no value) leaves an optional path unset.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_fields() {
        let manifest = Manifest::from_yaml_str(
            "files_path: md_sources\nfigures_path: images\nstyles_path: styles\noutput_path: text\n",
        )
        .expect("manifest");

        assert_eq!(manifest.files_path, "md_sources");
        assert_eq!(manifest.figures_dir(), Some("images"));
        assert_eq!(manifest.styles_dir(), Some("styles"));
        assert_eq!(manifest.output_path, "text");
    }

    #[test]
    fn optional_fields_default_to_empty() {
        let manifest = Manifest::from_yaml_str("files_path: src\n").expect("manifest");

        assert_eq!(manifest.figures_dir(), None);
        assert_eq!(manifest.styles_dir(), None);
        assert_eq!(manifest.output_path, "");
    }

    #[test]
    fn empty_optional_values_mean_absent() {
        let manifest =
            Manifest::from_yaml_str("files_path: src\nfigures_path: \"\"\n").expect("manifest");
        assert_eq!(manifest.figures_dir(), None);
    }

    #[test]
    fn null_optional_values_mean_absent() {
        let manifest = Manifest::from_yaml_str(
            "files_path: src\nfigures_path: ~\nstyles_path: null\noutput_path:\n",
        )
        .expect("manifest");

        assert_eq!(manifest.figures_dir(), None);
        assert_eq!(manifest.styles_dir(), None);
        assert_eq!(manifest.output_path, "");
    }

    #[test]
    fn bare_optional_key_means_absent() {
        let manifest =
            Manifest::from_yaml_str("files_path: src\nfigures_path:\n").expect("manifest");
        assert_eq!(manifest.figures_path, "");
    }

    #[test]
    fn rejects_non_mapping_documents() {
        let err = Manifest::from_yaml_str("- just\n- a list\n").expect_err("list is invalid");
        assert!(matches!(err, ManifestError::Parse(_)));
    }

    #[test]
    fn rejects_wrong_value_types() {
        let err = Manifest::from_yaml_str("files_path:\n  nested: map\n")
            .expect_err("mapping is not a path");
        assert!(matches!(err, ManifestError::Parse(_)));
    }

    #[test]
    fn missing_files_path_is_an_error() {
        let err = Manifest::from_yaml_str("output_path: text\n").expect_err("files_path required");
        assert!(matches!(err, ManifestError::Parse(_)));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Manifest::load(Path::new("does/not/exist.yaml")).expect_err("missing file");
        assert!(matches!(err, ManifestError::Read { .. }));
    }

    #[test]
    fn manifest_name_is_base_name() {
        assert_eq!(manifest_name(Path::new("proj/doc.yaml")), "doc.yaml");
        assert_eq!(manifest_name(Path::new("doc.yaml")), "doc.yaml");
    }
}
