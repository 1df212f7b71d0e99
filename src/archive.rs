use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::error::MirrorError;

/// Transport seam for the two archive endpoints: the JVO portal (HTML
/// listing pages, thumbnail payloads) and the ALMA data portal (raw
/// files). Tests substitute in-memory implementations.
pub trait ArchiveClient: Send + Sync {
    fn fetch_page(&self, url: &str) -> Result<String, MirrorError>;
    fn fetch_binary(&self, url: &str, destination: &Path) -> Result<(), MirrorError>;
}

#[derive(Clone)]
pub struct ArchiveHttpClient {
    client: Client,
}

impl ArchiveHttpClient {
    pub fn new() -> Result<Self, MirrorError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("jvo-mirror/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| MirrorError::ArchiveHttp(err.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| MirrorError::ArchiveHttp(err.to_string()))?;

        Ok(Self { client })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, MirrorError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "archive request failed".to_string());
        Err(MirrorError::ArchiveStatus { status, message })
    }

    fn send_with_retries<F>(
        &self,
        mut make_req: F,
    ) -> Result<reqwest::blocking::Response, MirrorError>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            let response = make_req().send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(MirrorError::ArchiveHttp(err.to_string()));
                }
            }
        }
    }
}

impl ArchiveClient for ArchiveHttpClient {
    fn fetch_page(&self, url: &str) -> Result<String, MirrorError> {
        let response = self.send_with_retries(|| self.client.get(url))?;
        let response = Self::handle_status(response)?;
        response
            .text()
            .map_err(|err| MirrorError::ArchiveHttp(err.to_string()))
    }

    fn fetch_binary(&self, url: &str, destination: &Path) -> Result<(), MirrorError> {
        let response = self.send_with_retries(|| self.client.get(url))?;
        let mut response = Self::handle_status(response)?;

        // Stream into a temp file and rename, so an interrupted
        // retrieval never leaves a partial file that a later run would
        // mistake for a completed download.
        let parent = destination
            .parent()
            .ok_or_else(|| MirrorError::Filesystem("invalid destination path".to_string()))?;
        fs::create_dir_all(parent).map_err(|err| MirrorError::Filesystem(err.to_string()))?;
        let mut temp = tempfile::Builder::new()
            .prefix("jvo-mirror")
            .tempfile_in(parent)
            .map_err(|err| MirrorError::Filesystem(err.to_string()))?;
        std::io::copy(&mut response, &mut temp)
            .map_err(|err| MirrorError::ArchiveHttp(err.to_string()))?;
        temp.persist(destination)
            .map_err(|err| MirrorError::Filesystem(err.to_string()))?;
        Ok(())
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
