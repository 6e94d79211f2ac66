use std::error::Error as StdError;

use etex_manifest::ManifestError;
use thiserror::Error;

use crate::{
    application::collect::CollectError,
    config::LoadError,
    infra::{archive::ArchiveError, error::InfraError, transport::TransportError},
};

/// Coarse classification of a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The manifest is not a valid project description.
    Parse,
    /// A declared input directory is missing or unreadable.
    Collection,
    /// Reading project files or writing output failed.
    Io,
    /// The round trip to the server failed.
    Transport,
    /// The server's response is not a usable archive.
    Format,
    Configuration,
    Telemetry,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Collect(#[from] CollectError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Manifest(ManifestError::Parse(_)) => ErrorKind::Parse,
            AppError::Manifest(ManifestError::Read { .. }) => ErrorKind::Io,
            AppError::Collect(_) => ErrorKind::Collection,
            AppError::Archive(err) if err.is_format() => ErrorKind::Format,
            AppError::Archive(_) => ErrorKind::Io,
            AppError::Transport(_) => ErrorKind::Transport,
            AppError::Config(_) => ErrorKind::Configuration,
            AppError::Infra(InfraError::Telemetry(_)) => ErrorKind::Telemetry,
        }
    }

    /// The error followed by each of its sources, outermost first.
    pub fn messages(&self) -> Vec<String> {
        let mut messages = vec![self.to_string()];
        let mut current = StdError::source(self);
        while let Some(inner) = current {
            let message = inner.to_string();
            // Wrappers often repeat their source's text in their own message.
            if !messages.last().is_some_and(|last| last.ends_with(&message)) {
                messages.push(message);
            }
            current = inner.source();
        }
        messages
    }
}
