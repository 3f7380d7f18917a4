// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Blocking HTTP client for the PIM backend.
//!
//! Every call runs on a worker thread; nothing here touches UI state.

pub mod error;
pub mod sse;
pub mod types;

use std::collections::BTreeMap;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response, multipart};
use serde::Serialize;
use url::Url;

use crate::config::{ApiConfig, api_url};
use crate::models::field::{FieldDefinition, parse_fields_payload};
use crate::models::progress::{StreamHandle, StreamJob};
use crate::models::record::{Record, parse_products_payload};

pub use error::ApiError;
use sse::SseReader;
use types::{
    Ack, AuthToken, BulkDelete, BulkEdit, FieldPayload, FieldUpdatePayload, ProductRef,
    ProductUpdate, SearchQuery, interpret_ack, interpret_json, new_product_body,
};

/// Signals produced while reading a progress stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamSignal {
    Opened,
    Data(String),
}

/// Why a stream stopped without an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamEnd {
    Cancelled,
    Eof,
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    base: String,
    http: Client,
    /// Long-lived bodies; each request picks its own read timeout.
    streaming: Client,
    read_timeout: Duration,
    stream_poll: Duration,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let connect = Duration::from_secs(config.connect_timeout_secs.max(1));
        let read_timeout = Duration::from_secs(config.timeout_secs.max(1));
        let http = Client::builder()
            .connect_timeout(connect)
            .timeout(read_timeout)
            .build()?;
        let streaming = Client::builder()
            .connect_timeout(connect)
            .timeout(None::<Duration>)
            .build()?;
        Ok(Self {
            base: crate::config::normalize_base(&config.base_url),
            http,
            streaming,
            read_timeout,
            stream_poll: Duration::from_secs(config.stream_poll_secs.max(1)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        api_url(&self.base, path)
    }

    fn send(&self, path: &str, request: RequestBuilder) -> Result<(u16, String), ApiError> {
        let response = request.send().inspect_err(|err| {
            log::warn!("request to {path} failed: {err}");
        })?;
        let status = response.status().as_u16();
        let body = response.text()?;
        log::debug!("{path} -> HTTP {status} ({} bytes)", body.len());
        Ok((status, body))
    }

    fn get(&self, path: &str) -> Result<(u16, String), ApiError> {
        self.send(path, self.http.get(self.url(path)))
    }

    fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Ack, ApiError> {
        let (status, text) = self.send(path, self.http.post(self.url(path)).json(body))?;
        interpret_ack(status, &text)
    }

    pub fn list_fields(&self) -> Result<Vec<FieldDefinition>, ApiError> {
        let (status, body) = self.get("/fields")?;
        let _: serde_json::Value = interpret_json(status, &body)?;
        parse_fields_payload(&body).map_err(|err| ApiError::InvalidResponse(err.to_string()))
    }

    pub fn add_field(&self, field: &FieldDefinition) -> Result<Ack, ApiError> {
        self.post_json("/add_field", &FieldPayload::from(field))
    }

    pub fn update_field(&self, index: usize, field: &FieldDefinition) -> Result<Ack, ApiError> {
        let body = FieldUpdatePayload {
            index,
            field: FieldPayload::from(field),
        };
        self.post_json("/update_field", &body)
    }

    pub fn delete_field(&self, index: usize) -> Result<Ack, ApiError> {
        self.post_json("/delete_field", &serde_json::json!({ "index": index }))
    }

    pub fn list_products(&self) -> Result<Vec<Record>, ApiError> {
        let (status, body) = self.get("/products")?;
        let _: serde_json::Value = interpret_json(status, &body)?;
        parse_products_payload(&body).map_err(|err| ApiError::InvalidResponse(err.to_string()))
    }

    pub fn add_product(
        &self,
        primary_title: &str,
        values: &BTreeMap<String, String>,
    ) -> Result<Ack, ApiError> {
        self.post_json("/add_product", &new_product_body(primary_title, values))
    }

    pub fn update_product(&self, update: &ProductUpdate) -> Result<Ack, ApiError> {
        self.post_json("/update_product", &update.to_json())
    }

    pub fn delete_product(&self, target: &ProductRef) -> Result<Ack, ApiError> {
        self.post_json("/delete_product", &target.to_json())
    }

    pub fn bulk_delete(&self, indices: Vec<usize>) -> Result<Ack, ApiError> {
        self.post_json("/bulk_delete_products", &BulkDelete { indices })
    }

    pub fn bulk_edit(&self, edit: &BulkEdit) -> Result<Ack, ApiError> {
        self.post_json("/bulk_edit_products", edit)
    }

    pub fn search(&self, query: &SearchQuery) -> Result<Vec<Record>, ApiError> {
        let path = "/search_products";
        let (status, body) = self.send(path, self.http.post(self.url(path)).json(query))?;
        let _: serde_json::Value = interpret_json(status, &body)?;
        parse_products_payload(&body).map_err(|err| ApiError::InvalidResponse(err.to_string()))
    }

    /// Upload a CSV file as multipart field `file`.
    pub fn upload_csv(&self, path: &Path) -> Result<Ack, ApiError> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.csv".to_string());
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime.as_ref())?;
        let form = multipart::Form::new().part("file", part);
        let endpoint = "/upload_csv";
        let (status, body) =
            self.send(endpoint, self.http.post(self.url(endpoint)).multipart(form))?;
        interpret_ack(status, &body)
    }

    /// Stream the CSV export into `dest`. Returns the number of bytes written.
    ///
    /// `dest` is only replaced once the whole body has arrived.
    pub fn download_csv(&self, dest: &Path) -> Result<u64, ApiError> {
        let mut response = self
            .streaming
            .get(self.url("/download"))
            .timeout(self.read_timeout)
            .send()?;
        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ApiError::Status {
                status,
                message: types::error_message(&body),
            });
        }
        let written = save_atomically(&mut response, dest)?;
        log::debug!("downloaded {written} bytes to {}", dest.display());
        Ok(written)
    }

    pub fn set_use_shopify(&self, on: bool) -> Result<(), ApiError> {
        let path = "/set_use_shopify";
        let request = self
            .http
            .post(self.url(path))
            .json(&serde_json::json!({ "use_shopify": on }));
        let (status, body) = self.send(path, request)?;
        let _: serde_json::Value = interpret_json(status, &body)?;
        Ok(())
    }

    /// Refresh products, then categories, from Shopify.
    pub fn refresh_from_shopify(&self) -> Result<(), ApiError> {
        for path in ["/refresh_from_shopify", "/refresh_categories_from_shopify"] {
            let (status, body) = self.send(path, self.http.post(self.url(path)))?;
            let _: serde_json::Value = interpret_json(status, &body)?;
        }
        Ok(())
    }

    pub fn login(&self, username: &str, password: &str) -> Result<AuthToken, ApiError> {
        self.auth("/login", username, password)
    }

    pub fn register(&self, username: &str, password: &str) -> Result<AuthToken, ApiError> {
        self.auth("/register", username, password)
    }

    fn auth(&self, path: &str, username: &str, password: &str) -> Result<AuthToken, ApiError> {
        let request = self
            .http
            .post(self.url(path))
            .form(&[("username", username), ("password", password)]);
        let (status, body) = self.send(path, request)?;
        interpret_json(status, &body)
    }

    /// Open the progress stream for `job` and feed its events to `on_signal`.
    ///
    /// Returns when the stream ends, the handle is cancelled, or reading fails.
    /// Reads time out every `stream_poll_secs` so a cancel is noticed even when
    /// the server sends nothing.
    pub fn stream_job(
        &self,
        job: StreamJob,
        input: &str,
        handle: &StreamHandle,
        mut on_signal: impl FnMut(StreamSignal),
    ) -> Result<StreamEnd, ApiError> {
        let mut url = Url::parse(&self.url(job.endpoint()))?;
        url.query_pairs_mut().append_pair(job.query_key(), input.trim());

        let response: Response = self
            .streaming
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .timeout(self.stream_poll)
            .send()?;
        if !response.status().is_success() {
            return Err(ApiError::Stream(format!("HTTP {}", response.status())));
        }
        if handle.is_cancelled() {
            return Ok(StreamEnd::Cancelled);
        }
        on_signal(StreamSignal::Opened);

        let mut events = SseReader::new(BufReader::new(response));
        loop {
            let next = events.next();
            if handle.is_cancelled() {
                return Ok(StreamEnd::Cancelled);
            }
            match next {
                None => return Ok(StreamEnd::Eof),
                Some(Ok(event)) => on_signal(StreamSignal::Data(event.data)),
                Some(Err(err)) if is_read_timeout(&err) => {
                    log::trace!("job stream quiet; still waiting");
                }
                Some(Err(err)) => return Err(ApiError::Stream(err.to_string())),
            }
        }
    }
}

/// Copy `source` into a temporary file next to `dest`, then move it into place.
fn save_atomically(source: &mut impl Read, dest: &Path) -> Result<u64, ApiError> {
    let dir = match dest.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut staged = tempfile::NamedTempFile::new_in(dir)?;
    let written = io::copy(source, &mut staged)?;
    staged.persist(dest).map_err(|err| err.error)?;
    Ok(written)
}

/// Blocking reqwest reports a per-read timeout as an `Other` error wrapping its own.
fn is_read_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
        || err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
            .is_some_and(reqwest::Error::is_timeout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_normalizes_base() {
        let config = ApiConfig {
            base_url: " http://localhost:3000/api/ ".into(),
            ..Default::default()
        };
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000/api");
        assert_eq!(client.url("/fields"), "http://localhost:3000/api/fields");
    }

    /// Fails after handing over some bytes.
    struct Broken {
        sent: bool,
    }

    impl Read for Broken {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.sent {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
            }
            self.sent = true;
            buf[..4].copy_from_slice(b"sku,");
            Ok(4)
        }
    }

    #[test]
    fn interrupted_download_leaves_existing_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("products.csv");
        std::fs::write(&dest, "old export").unwrap();

        let err = save_atomically(&mut Broken { sent: false }, &dest).unwrap_err();
        assert!(matches!(err, ApiError::Io(_)));
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "old export");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        let written = save_atomically(&mut "sku,title\nA1,Shirt\n".as_bytes(), &dest).unwrap();
        assert_eq!(written, 19);
        assert_eq!(
            std::fs::read_to_string(&dest).unwrap(),
            "sku,title\nA1,Shirt\n"
        );
    }

    #[test]
    fn timeouts_are_told_apart_from_failures() {
        assert!(is_read_timeout(&io::Error::new(io::ErrorKind::TimedOut, "quiet")));
        assert!(!is_read_timeout(&io::Error::new(
            io::ErrorKind::ConnectionReset,
            "reset"
        )));
        assert!(!is_read_timeout(&io::Error::other("decode")));
    }
}
