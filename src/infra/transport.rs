//! HTTP transport to the remote renderer.
//!
//! One request, one response: the archive is posted as the body and the
//! response body is handed back untouched. There is no timeout and no retry.

use etex_manifest::{ARCHIVE_CONTENT_TYPE, MAKEFILE_NAME_PARAM, OUTPUT_PATH_PARAM};
use reqwest::{Client, StatusCode, Url, header::CONTENT_TYPE};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid server endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server error: status {status} body {body}")]
    Status { status: StatusCode, body: String },
}

#[derive(Clone, Debug)]
pub struct RenderClient {
    client: Client,
    endpoint: Url,
}

impl RenderClient {
    pub fn new(host: &str, port: u16) -> Result<Self, TransportError> {
        let endpoint = Url::parse(&format!("http://{host}:{port}/"))?;
        let client = Client::builder().user_agent(Self::user_agent()).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn user_agent() -> &'static str {
        concat!("etex-client/", env!("CARGO_PKG_VERSION"))
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn request_url(&self, makefile_name: &str, output_path: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.set_query(None);
        url.query_pairs_mut()
            .append_pair(MAKEFILE_NAME_PARAM, makefile_name)
            .append_pair(OUTPUT_PATH_PARAM, output_path);
        url
    }

    /// Post `archive` and return the full response body once it has arrived.
    pub async fn submit(
        &self,
        makefile_name: &str,
        output_path: &str,
        archive: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError> {
        let url = self.request_url(makefile_name, output_path);
        debug!(url = %url, bytes = archive.len(), "Submitting archive");

        let resp = self
            .client
            .post(url)
            .header(CONTENT_TYPE, ARCHIVE_CONTENT_TYPE)
            .body(archive)
            .send()
            .await?;

        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            return Err(TransportError::Status { status, body });
        }
        Ok(bytes.to_vec())
    }
}

/// Single round trip against `http://{host}:{port}/`.
pub async fn submit(
    host: &str,
    port: u16,
    makefile_name: &str,
    output_path: &str,
    archive: Vec<u8>,
) -> Result<Vec<u8>, TransportError> {
    RenderClient::new(host, port)?
        .submit(makefile_name, output_path, archive)
        .await
}
