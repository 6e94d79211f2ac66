//! Zip codec for the request and response bodies.
//!
//! Outbound archives hold the project's file set under manifest-relative
//! member names. Inbound archives are unpacked beneath a fixed destination;
//! members that would land outside it are rejected.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Cursor, Read, Seek, Write};
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use zip::{CompressionMethod, ZipArchive, ZipWriter, result::ZipError, write::SimpleFileOptions};

use crate::domain::{error::DomainError, file_set::FileSet, project::ProjectLayout};

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to archive {path}: {source}")]
    Source {
        path: String,
        source: io::Error,
    },
    #[error(transparent)]
    MemberName(#[from] DomainError),
    #[error("failed to encode archive: {0}")]
    Encode(#[source] ZipError),
    #[error("malformed archive: {0}")]
    Format(#[from] ZipError),
    #[error("archive member `{name}` is corrupt: {source}")]
    Corrupt {
        name: String,
        source: io::Error,
    },
    #[error("archive member `{name}` escapes the destination directory")]
    UnsafeMember { name: String },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        source: io::Error,
    },
}

impl ArchiveError {
    /// Whether the error stems from the archive bytes themselves rather than
    /// the local filesystem.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            Self::Format(_) | Self::Corrupt { .. } | Self::UnsafeMember { .. }
        )
    }

    fn unsafe_member(name: &str) -> Self {
        Self::UnsafeMember {
            name: name.to_string(),
        }
    }

    fn write(path: &Path, source: io::Error) -> Self {
        Self::Write {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Member count and uncompressed size of one archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub members: usize,
    pub bytes: u64,
}

impl ArchiveSummary {
    fn record(&mut self, bytes: u64) {
        self.members += 1;
        self.bytes += bytes;
    }
}

#[derive(Debug, Clone)]
pub struct PackedArchive {
    pub bytes: Vec<u8>,
    pub summary: ArchiveSummary,
}

/// Write every file of `files` into a deflate-compressed zip, in order.
pub fn pack(layout: &ProjectLayout, files: &FileSet) -> Result<PackedArchive, ArchiveError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut summary = ArchiveSummary::default();
    let mut seen = HashSet::new();

    for path in files.iter() {
        let name = layout.member_name(path)?;
        // An empty `files_path` walks the project root, which holds the manifest again.
        if !seen.insert(name.clone()) {
            debug!(member = %name, "Skipping duplicate archive member");
            continue;
        }
        let written = append_file(&mut writer, path, &name)?;
        debug!(member = %name, bytes = written, "Packed archive member");
        summary.record(written);
    }

    let bytes = writer.finish().map_err(ArchiveError::Encode)?.into_inner();
    Ok(PackedArchive { bytes, summary })
}

// The source handle lives only for this call, so it is closed before the next
// member is started whether or not the copy succeeded.
fn append_file<W: Write + Seek>(
    writer: &mut ZipWriter<W>,
    path: &Path,
    name: &str,
) -> Result<u64, ArchiveError> {
    let source_error = |source: io::Error| ArchiveError::Source {
        path: path.display().to_string(),
        source,
    };

    let mut file = File::open(path).map_err(source_error)?;
    let metadata = file.metadata().map_err(source_error)?;
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(permission_bits(&metadata));

    writer
        .start_file(name, options)
        .map_err(ArchiveError::Encode)?;
    io::copy(&mut file, writer).map_err(source_error)
}

/// Unpack `bytes` beneath `destination`, overwriting same-named files.
///
/// Nothing is rolled back on failure: members written before the failing one
/// stay on disk.
pub fn extract(bytes: &[u8], destination: &Path) -> Result<ArchiveSummary, ArchiveError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut summary = ArchiveSummary::default();

    fs::create_dir_all(destination).map_err(|err| ArchiveError::write(destination, err))?;
    let root = fs::canonicalize(destination).map_err(|err| ArchiveError::write(destination, err))?;

    for index in 0..archive.len() {
        let mut member = archive.by_index(index)?;
        let name = member.name().to_string();
        let target = member_destination(destination, &name)?;

        if member.is_dir() {
            create_contained_dir(&root, &target, &name)?;
            continue;
        }

        let mut contents = Vec::new();
        member
            .read_to_end(&mut contents)
            .map_err(|source| ArchiveError::Corrupt {
                name: name.clone(),
                source,
            })?;

        if let Some(parent) = target.parent() {
            create_contained_dir(&root, parent, &name)?;
        }
        let is_link = fs::symlink_metadata(&target)
            .is_ok_and(|metadata| metadata.file_type().is_symlink());
        if is_link {
            return Err(ArchiveError::unsafe_member(&name));
        }
        fs::write(&target, &contents).map_err(|err| ArchiveError::write(&target, err))?;
        if let Some(mode) = member.unix_mode() {
            apply_permissions(&target, mode)?;
        }

        debug!(member = %name, bytes = contents.len(), "Extracted archive member");
        summary.record(contents.len() as u64);
    }

    Ok(summary)
}

fn member_destination(destination: &Path, name: &str) -> Result<PathBuf, ArchiveError> {
    let relative = Path::new(name);
    let escapes = relative.components().any(|component| {
        matches!(
            component,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if name.is_empty() || escapes {
        return Err(ArchiveError::unsafe_member(name));
    }
    Ok(destination.join(relative))
}

/// Create `dir` only if it resolves inside the canonical `root`.
///
/// The nearest existing ancestor is checked before anything is created, so a
/// symlink planted in the destination cannot redirect directory creation.
fn create_contained_dir(root: &Path, dir: &Path, name: &str) -> Result<(), ArchiveError> {
    let mut existing = dir;
    while fs::symlink_metadata(existing).is_err() {
        existing = existing
            .parent()
            .ok_or_else(|| ArchiveError::unsafe_member(name))?;
    }
    let resolved = fs::canonicalize(existing).map_err(|_| ArchiveError::unsafe_member(name))?;
    if !resolved.starts_with(root) {
        return Err(ArchiveError::unsafe_member(name));
    }

    fs::create_dir_all(dir).map_err(|err| ArchiveError::write(dir, err))?;
    let resolved = fs::canonicalize(dir).map_err(|err| ArchiveError::write(dir, err))?;
    if !resolved.starts_with(root) {
        return Err(ArchiveError::unsafe_member(name));
    }
    Ok(())
}

#[cfg(unix)]
fn permission_bits(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permission_bits(metadata: &fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

#[cfg(unix)]
fn apply_permissions(path: &Path, mode: u32) -> Result<(), ArchiveError> {
    use std::os::unix::fs::PermissionsExt;
    let bits = mode & 0o7777;
    // Archivers that record no permissions leave the bits zeroed.
    if bits == 0 {
        return Ok(());
    }
    fs::set_permissions(path, fs::Permissions::from_mode(bits))
        .map_err(|err| ArchiveError::write(path, err))
}

#[cfg(not(unix))]
fn apply_permissions(path: &Path, mode: u32) -> Result<(), ArchiveError> {
    if mode & 0o222 != 0 {
        return Ok(());
    }
    let mut permissions = fs::metadata(path)
        .map_err(|err| ArchiveError::write(path, err))?
        .permissions();
    permissions.set_readonly(true);
    fs::set_permissions(path, permissions).map_err(|err| ArchiveError::write(path, err))
}
