//! The full client run: pack the project, submit it, unpack the response.
//!
//! Each stage finishes before the next one starts and the first error ends
//! the run. Nothing is extracted unless the server answered with success.

use std::path::{Path, PathBuf};

use etex_manifest::Manifest;
use tracing::info;

use crate::{
    application::{collect::files_to_archive, error::AppError},
    config::ServerSettings,
    domain::project::ProjectLayout,
    infra::{
        archive::{self, ArchiveSummary, PackedArchive},
        transport::RenderClient,
    },
};

/// Outcome of one successful round trip.
#[derive(Debug, Clone)]
pub struct RoundTripReport {
    pub sent: ArchiveSummary,
    pub request_bytes: usize,
    pub response_bytes: usize,
    pub extracted: ArchiveSummary,
    pub output_dir: PathBuf,
}

/// Collect the project's file set and pack it into a request archive.
pub fn build_archive(layout: &ProjectLayout, manifest: &Manifest) -> Result<PackedArchive, AppError> {
    let files = files_to_archive(layout, manifest)?;
    Ok(archive::pack(layout, &files)?)
}

pub async fn run_round_trip(
    server: &ServerSettings,
    manifest_path: &Path,
) -> Result<RoundTripReport, AppError> {
    let layout = ProjectLayout::for_manifest(manifest_path);
    let manifest = Manifest::load(layout.manifest_path())?;

    let packed = build_archive(&layout, &manifest)?;
    let request_bytes = packed.bytes.len();
    info!(
        target = "etex::round_trip",
        members = packed.summary.members,
        uncompressed = packed.summary.bytes,
        compressed = request_bytes,
        "Packed project"
    );

    let client = RenderClient::new(&server.host, server.port)?;
    let response = client
        .submit(&layout.manifest_name(), &manifest.output_path, packed.bytes)
        .await?;
    info!(
        target = "etex::round_trip",
        endpoint = %client.endpoint(),
        bytes = response.len(),
        "Received build output"
    );

    let output_dir = layout.output_dir(&manifest);
    let extracted = archive::extract(&response, &output_dir)?;
    info!(
        target = "etex::round_trip",
        members = extracted.members,
        output = %output_dir.display(),
        "Extracted build output"
    );

    Ok(RoundTripReport {
        sent: packed.summary,
        request_bytes,
        response_bytes: response.len(),
        extracted,
        output_dir,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::{Cursor, Read, Write};

    use httpmock::MockServer;
    use tempfile::TempDir;
    use zip::{ZipArchive, ZipWriter, write::SimpleFileOptions};

    use super::*;
    use crate::application::error::ErrorKind;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, contents).expect("write");
    }

    fn project() -> TempDir {
        let dir = TempDir::new().expect("tempdir");
        write(
            dir.path(),
            "doc.yaml",
            "files_path: md_sources\nfigures_path: images\nstyles_path: styles\noutput_path: text\n",
        );
        write(dir.path(), "md_sources/0_front.md", "# Front");
        write(dir.path(), "images/logo.svg", "<svg/>");
        write(dir.path(), "styles/common.css", "body {}");
        dir
    }

    fn response_archive(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, contents) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .expect("start file");
            writer.write_all(contents.as_bytes()).expect("write entry");
        }
        writer.finish().expect("finish").into_inner()
    }

    fn server_settings(server: &MockServer) -> ServerSettings {
        ServerSettings {
            host: server.host(),
            port: server.port(),
        }
    }

    #[test]
    fn build_archive_names_members_relative_to_manifest() {
        let project = project();
        let layout = ProjectLayout::for_manifest(project.path().join("doc.yaml"));
        let manifest = Manifest::load(layout.manifest_path()).expect("manifest");

        let packed = build_archive(&layout, &manifest).expect("archive");
        let mut archive = ZipArchive::new(Cursor::new(packed.bytes)).expect("zip");
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).expect("member").name().to_string())
            .collect();

        assert_eq!(
            names,
            vec![
                "doc.yaml",
                "md_sources/0_front.md",
                "images/logo.svg",
                "styles/common.css"
            ]
        );
        let mut body = String::new();
        archive
            .by_name("images/logo.svg")
            .expect("logo")
            .read_to_string(&mut body)
            .expect("read");
        assert_eq!(body, "<svg/>");
        assert_eq!(packed.summary.members, 4);
    }

    #[tokio::test]
    async fn round_trip_extracts_response_under_output_path() {
        let project = project();
        let server = MockServer::start();
        let output = response_archive(&[
            ("foo.txt", "Hello, world!"),
            ("bar/baz.txt", "Goodbye, world!"),
        ]);
        let output_len = output.len();
        let mock = server.mock(|when, then| {
            when.method("POST")
                .path("/")
                .query_param("makefile_name", "doc.yaml")
                .query_param("output_path", "text");
            then.status(200)
                .header("content-type", "application/zip")
                .body(output);
        });

        let report = run_round_trip(&server_settings(&server), &project.path().join("doc.yaml"))
            .await
            .expect("round trip");

        mock.assert();
        let text = project.path().join("text");
        assert_eq!(report.output_dir, text);
        assert_eq!(report.sent.members, 4);
        assert_eq!(report.extracted.members, 2);
        assert!(report.request_bytes > 0);
        assert_eq!(report.response_bytes, output_len);
        assert_eq!(
            fs::read_to_string(text.join("foo.txt")).expect("foo"),
            "Hello, world!"
        );
        assert_eq!(
            fs::read_to_string(text.join("bar").join("baz.txt")).expect("baz"),
            "Goodbye, world!"
        );
    }

    #[tokio::test]
    async fn failed_submission_writes_nothing() {
        let project = project();
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("POST").path("/");
            then.status(503).body("busy");
        });

        let err = run_round_trip(&server_settings(&server), &project.path().join("doc.yaml"))
            .await
            .expect_err("server failure");

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(!project.path().join("text").exists());
    }

    #[tokio::test]
    async fn malformed_response_is_a_format_error() {
        let project = project();
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method("POST").path("/");
            then.status(200).body("definitely not a zip");
        });

        let err = run_round_trip(&server_settings(&server), &project.path().join("doc.yaml"))
            .await
            .expect_err("bad archive");

        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[tokio::test]
    async fn malformed_manifest_fails_before_any_request() {
        let dir = TempDir::new().expect("tempdir");
        write(dir.path(), "doc.yaml", "- not\n- a mapping\n");
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("POST");
            then.status(200);
        });

        let err = run_round_trip(&server_settings(&server), &dir.path().join("doc.yaml"))
            .await
            .expect_err("bad manifest");

        assert_eq!(err.kind(), ErrorKind::Parse);
        mock.assert_hits(0);
    }

    #[tokio::test]
    async fn missing_sources_fail_before_any_request() {
        let dir = TempDir::new().expect("tempdir");
        write(dir.path(), "doc.yaml", "files_path: md_sources\noutput_path: text\n");
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("POST");
            then.status(200);
        });

        let err = run_round_trip(&server_settings(&server), &dir.path().join("doc.yaml"))
            .await
            .expect_err("missing sources");

        assert_eq!(err.kind(), ErrorKind::Collection);
        mock.assert_hits(0);
    }
}
