//! libcurl-backed `RemoteClient`.
//!
//! Each call builds a fresh easy handle, sends the credential header, follows
//! redirects, and buffers the body in memory (assets are single audio files).

use std::str;
use std::time::Duration;

use super::RemoteClient;
use crate::catalog::RawCatalog;
use crate::config::{ArchiveConfig, CredentialHeader};
use crate::retry::{classify_http_status, ErrorKind, FetchError};

#[derive(Debug, Clone)]
pub struct CurlClient {
    catalog_url: String,
    credential_header: CredentialHeader,
    connect_timeout: Duration,
    timeout: Duration,
}

impl CurlClient {
    pub fn new(catalog_url: impl Into<String>, credential_header: CredentialHeader) -> Self {
        Self {
            catalog_url: catalog_url.into(),
            credential_header,
            connect_timeout: Duration::from_secs(30),
            timeout: Duration::from_secs(3600),
        }
    }

    pub fn from_config(cfg: &ArchiveConfig) -> Self {
        Self::new(cfg.catalog_url.clone(), cfg.credential_header)
    }

    /// Override the whole-transfer timeout (default one hour).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// GET `url` with the credential header; returns the body on 2xx.
    fn get(&self, url: &str, credential: &str) -> Result<Vec<u8>, FetchError> {
        let mut body: Vec<u8> = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(url).map_err(FetchError::from_curl)?;
        easy.follow_location(true).map_err(FetchError::from_curl)?;
        easy.max_redirections(10).map_err(FetchError::from_curl)?;
        easy.connect_timeout(self.connect_timeout)
            .map_err(FetchError::from_curl)?;
        // Abort if throughput drops below 1 KiB/s for 60s.
        easy.low_speed_limit(1024).map_err(FetchError::from_curl)?;
        easy.low_speed_time(Duration::from_secs(60))
            .map_err(FetchError::from_curl)?;
        easy.timeout(self.timeout).map_err(FetchError::from_curl)?;

        let mut list = curl::easy::List::new();
        list.append(&self.credential_header.header_line(credential))
            .map_err(FetchError::from_curl)?;
        list.append("Accept: */*").map_err(FetchError::from_curl)?;
        easy.http_headers(list).map_err(FetchError::from_curl)?;

        {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| {
                    body.extend_from_slice(data);
                    Ok(data.len())
                })
                .map_err(FetchError::from_curl)?;
            transfer.perform().map_err(FetchError::from_curl)?;
        }

        let code = easy.response_code().map_err(FetchError::from_curl)?;
        if !(200..300).contains(&code) {
            return Err(match classify_http_status(code) {
                ErrorKind::Auth => FetchError::Auth(code),
                _ => FetchError::Remote(code),
            });
        }
        Ok(body)
    }
}

impl RemoteClient for CurlClient {
    fn fetch_catalog(&self, credential: &str) -> Result<RawCatalog, FetchError> {
        let body = self.get(&self.catalog_url, credential)?;
        serde_json::from_slice(&body).map_err(|e| {
            let preview = str::from_utf8(&body[..body.len().min(64)]).unwrap_or("<binary>");
            FetchError::Malformed(format!("catalog is not valid JSON ({}): {}", e, preview))
        })
    }

    fn fetch_asset(&self, url: &str, credential: &str) -> Result<Vec<u8>, FetchError> {
        self.get(url, credential)
    }
}
