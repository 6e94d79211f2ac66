//! Remote build client for etex document projects.
//!
//! A run packs the project described by a manifest into a zip archive, posts
//! it to an etex server and unpacks the archive the server returns into the
//! manifest's output directory.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;

pub use application::{
    error::{AppError, ErrorKind},
    round_trip::{RoundTripReport, build_archive, run_round_trip},
};
pub use etex_manifest::Manifest;
