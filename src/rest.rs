// BgpSim: BGP Network Simulator written in Rust
// Copyright (C) 2022-2023 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Module for managing the REST session with the UHD API server.

use std::{path::Path, time::Duration};

use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::{io::AsyncWriteExt, time::timeout};

use crate::config::CONFIG;

/// Name of the header carrying the API key on every authenticated request.
const API_KEY_HEADER: &str = "X-Api-Key";

/// This is the main REST session with the UHD API server.
///
/// All paths passed to this client are absolute paths below the server root (the same form in
/// which the appliance reports `href`s, e.g. `/api/v1/sessions/1/ixnetwork/topology/2`). The
/// client owns the TLS setup and the API key; everything above it (sessions, ports, topologies,
/// quick tests) only deals in hrefs.
///
/// **Warning** The appliance ships with a self-signed certificate. Unless
/// `server.verify_tls` is set in the configuration, certificate validation is disabled.
#[derive(Debug, Clone)]
pub struct RestClient {
    /// The underlying HTTP client.
    client: Client,
    /// Base URL of the API server, without a trailing slash.
    base_url: String,
    /// Hostname used for log messages.
    host: String,
    /// The API key obtained by [`RestClient::authenticate`].
    api_key: Option<String>,
}

impl RestClient {
    /// Create a new REST session with the API server and check that it is reachable. This does
    /// not yet authenticate; call [`RestClient::authenticate`] afterwards.
    pub async fn connect(host: impl Into<String>, port: u16) -> Result<Self, RestError> {
        let host = host.into();
        let base_url = format!("https://{host}:{port}");

        log::trace!("[{host}] connecting...");

        let client = Client::builder()
            .danger_accept_invalid_certs(!CONFIG.server.verify_tls)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(RestError::Setup)?;

        let this = Self {
            client,
            base_url,
            host,
            api_key: None,
        };

        // wait for 10 seconds until the connection is established. Any HTTP status counts as
        // reachable, including 401 (we are not yet authenticated).
        match timeout(
            Duration::from_secs(10),
            this.client.get(this.url("/api/v1/sessions")).send(),
        )
        .await
        {
            Ok(Ok(_)) => {
                log::trace!("[{}] connection established!", this.name());
                Ok(this)
            }
            Ok(Err(e)) => {
                log::error!("[{}] Error while connecting to the target: {e}", this.name());
                Err(RestError::Setup(e))
            }
            Err(_) => {
                log::error!("[{}] connection timeout!", this.name());
                Err(RestError::Timeout)
            }
        }
    }

    /// Get the hostname for the session.
    pub fn name(&self) -> &str {
        &self.host
    }

    /// Authenticate with the API server and store the received API key for all subsequent
    /// requests.
    pub async fn authenticate(
        &mut self,
        username: impl AsRef<str>,
        password: impl AsRef<str>,
    ) -> Result<(), RestError> {
        log::trace!("[{}] authenticating as {}", self.name(), username.as_ref());
        let response = self
            .client
            .post(self.url("/api/v1/auth/session"))
            .json(&json!({
                "username": username.as_ref(),
                "password": password.as_ref(),
            }))
            .send()
            .await?;
        let body: Value = check_response(self.name(), response, || "authenticate".to_string())
            .await?
            .json()
            .await?;
        let key = body
            .get("apiKey")
            .and_then(Value::as_str)
            .ok_or(RestError::UnexpectedPayload("auth response without apiKey"))?;
        self.api_key = Some(key.to_string());
        Ok(())
    }

    /// Perform a GET request and deserialize the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: impl AsRef<str>) -> Result<T, RestError> {
        let path = path.as_ref();
        log::trace!("[{}] GET {}", self.name(), path);
        let response = self.request(reqwest::Method::GET, path).send().await?;
        Ok(check_response(self.name(), response, || format!("GET {path}"))
            .await?
            .json()
            .await?)
    }

    /// Perform a GET request and return the raw JSON value.
    pub async fn get_value(&self, path: impl AsRef<str>) -> Result<Value, RestError> {
        self.get(path).await
    }

    /// Perform a POST request with a JSON body. Returns the response body, or `Value::Null` for
    /// responses without content.
    pub async fn post(&self, path: impl AsRef<str>, body: &Value) -> Result<Value, RestError> {
        let path = path.as_ref();
        log::trace!("[{}] POST {} {}", self.name(), path, body);
        let response = self
            .request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await?;
        let response = check_response(self.name(), response, || format!("POST {path}")).await?;
        Ok(read_json_or_null(response).await?)
    }

    /// Perform a PATCH request, used to update attributes of an existing appliance object.
    pub async fn patch(&self, path: impl AsRef<str>, body: &Value) -> Result<(), RestError> {
        let path = path.as_ref();
        log::trace!("[{}] PATCH {} {}", self.name(), path, body);
        let response = self
            .request(reqwest::Method::PATCH, path)
            .json(body)
            .send()
            .await?;
        check_response(self.name(), response, || format!("PATCH {path}")).await?;
        Ok(())
    }

    /// Perform a DELETE request.
    pub async fn delete(&self, path: impl AsRef<str>) -> Result<(), RestError> {
        let path = path.as_ref();
        log::trace!("[{}] DELETE {}", self.name(), path);
        let response = self.request(reqwest::Method::DELETE, path).send().await?;
        check_response(self.name(), response, || format!("DELETE {path}")).await?;
        Ok(())
    }

    /// Execute an appliance operation (a POST on an `operations/...` endpoint). Operations may
    /// complete synchronously, or return `IN_PROGRESS` together with a poll URL; in the latter
    /// case this function polls once per second until the operation reaches a terminal state,
    /// bounded by `timing.operation_timeout`.
    pub async fn execute(&self, path: impl AsRef<str>, body: &Value) -> Result<Value, RestError> {
        let path = path.as_ref();
        let response = self.post(path, body).await?;

        match response.get("state").and_then(Value::as_str) {
            Some("IN_PROGRESS") | Some("down") => {
                let url = response
                    .get("url")
                    .and_then(Value::as_str)
                    .ok_or(RestError::UnexpectedPayload("async operation without url"))?;
                self.wait_for_operation(path, url).await
            }
            Some("ERROR") | Some("EXCEPTION") => {
                Err(RestError::Operation(path.to_string(), operation_message(&response)))
            }
            _ => Ok(response),
        }
    }

    /// Poll an asynchronous operation until it reaches a terminal state.
    async fn wait_for_operation(&self, op: &str, url: &str) -> Result<Value, RestError> {
        for _ in 0..CONFIG.timing.operation_timeout {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let progress: Value = self.get(url).await?;
            match progress.get("state").and_then(Value::as_str) {
                Some("IN_PROGRESS") | Some("down") => continue,
                Some("SUCCESS") | Some("COMPLETED") => {
                    log::trace!("[{}] operation {} completed", self.name(), op);
                    return Ok(progress);
                }
                _ => {
                    let message = operation_message(&progress);
                    log::error!("[{}] operation {} failed: {}", self.name(), op, message);
                    return Err(RestError::Operation(op.to_string(), message));
                }
            }
        }
        log::error!("[{}] operation {} timed out", self.name(), op);
        Err(RestError::OperationTimeout(op.to_string()))
    }

    /// Download a file from the API server file service to a local path. The download is staged
    /// through a temporary file, so an interrupted transfer never leaves a partial file at the
    /// destination.
    pub async fn download_file(
        &self,
        remote: impl AsRef<str>,
        local: impl AsRef<Path>,
    ) -> Result<(), RestError> {
        let remote = remote.as_ref();
        log::trace!(
            "[{}] download {} -> {:?}",
            self.name(),
            remote,
            local.as_ref()
        );

        let path = format!("/api/v1/files?absolute={}", urlencode(remote));
        let response = self.request(reqwest::Method::GET, &path).send().await?;
        let response =
            check_response(self.name(), response, || format!("GET {path}")).await?;
        let bytes = response.bytes().await?;

        let tempdir = tempfile::tempdir()?;
        let mut filepath = tempdir.path().to_path_buf();
        filepath.push("download");
        let mut file = tokio::fs::File::create(&filepath).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;

        // drop the file before moving it in place
        let _ = file;
        tokio::fs::copy(&filepath, local.as_ref()).await?;

        Ok(())
    }

    /// Upload a file to the API server file service under the given remote name.
    pub async fn upload_file(
        &self,
        remote: impl AsRef<str>,
        content: impl Into<Vec<u8>>,
    ) -> Result<(), RestError> {
        let remote = remote.as_ref();
        log::trace!("[{}] upload {}", self.name(), remote);

        let path = format!("/api/v1/files?filename={}", urlencode(remote));
        let response = self
            .request(reqwest::Method::POST, &path)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(content.into())
            .send()
            .await?;
        check_response(self.name(), response, || format!("POST {path}")).await?;
        Ok(())
    }

    /// Build a request with the API key header attached.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, self.url(path));
        if let Some(key) = &self.api_key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder
    }

    /// Join an absolute appliance path onto the base URL.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Check the response for a successful status code. On failure, log the body (the appliance
/// reports its error message as JSON text) and return a [`RestError::Api`].
async fn check_response<F, S>(
    host: &str,
    response: Response,
    cmd: F,
) -> Result<Response, RestError>
where
    F: FnOnce() -> S,
    S: std::fmt::Display,
{
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let cmd = cmd().to_string();
        let body = response.text().await.unwrap_or_default();
        log::error!(
            "[{}] {} returned status {}{}",
            host,
            cmd,
            status.as_u16(),
            if body.is_empty() {
                String::new()
            } else {
                format!("\nBODY:\n{body}")
            }
        );
        Err(RestError::Api(cmd, status, extract_message(&body)))
    }
}

/// Read the response body as JSON, mapping empty bodies (204, or empty 200) to `Value::Null`.
async fn read_json_or_null(response: Response) -> Result<Value, RestError> {
    if response.status() == StatusCode::NO_CONTENT {
        return Ok(Value::Null);
    }
    let text = response.text().await?;
    if text.trim().is_empty() {
        Ok(Value::Null)
    } else {
        Ok(serde_json::from_str(&text)?)
    }
}

/// Extract the human-readable error message from an appliance error body, falling back to the
/// raw body text.
fn extract_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(|v| {
            v.get("errors")
                .and_then(Value::as_array)
                .and_then(|errors| errors.first())
                .and_then(|e| e.get("detail"))
                .or_else(|| v.get("error"))
                .or_else(|| v.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

/// Extract the failure message of an operation result, falling back to the whole payload.
fn operation_message(progress: &Value) -> String {
    progress
        .get("result")
        .or_else(|| progress.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| progress.to_string())
}

/// Percent-encode the characters that may appear in appliance file paths.
fn urlencode(s: &str) -> String {
    s.chars()
        .flat_map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '~' | '/' => {
                vec![c.to_string()]
            }
            c => c
                .to_string()
                .into_bytes()
                .into_iter()
                .map(|b| format!("%{b:02X}"))
                .collect(),
        })
        .collect()
}

/// Extract the canonical href of an appliance object: the first `links` entry, falling back to
/// an explicit `href` attribute.
pub(crate) fn href_of(obj: &Value) -> Option<String> {
    obj.get("links")
        .and_then(Value::as_array)
        .and_then(|links| links.first())
        .and_then(|link| link.get("href"))
        .or_else(|| obj.get("href"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Error kind returned by [`RestClient`].
#[derive(Debug, Error)]
pub enum RestError {
    /// Error while establishing the main connection
    #[error("Error while establishing the connection: {0}")]
    Setup(reqwest::Error),
    /// Timeout while establishing the session
    #[error("Timeout while establishing the session.")]
    Timeout,
    /// Error while interacting with the API server
    #[error("REST client error: {0}")]
    Client(#[from] reqwest::Error),
    /// The API server returned a non-success status code.
    #[error("{0} returned status {1}: {2}")]
    Api(String, StatusCode, String),
    /// An appliance operation reported a failure.
    #[error("Operation {0} failed: {1}")]
    Operation(String, String),
    /// An appliance operation did not reach a terminal state in time.
    #[error("Operation {0} did not complete in time")]
    OperationTimeout(String),
    /// The response payload is missing an expected attribute.
    #[error("Unexpected payload: {0}")]
    UnexpectedPayload(&'static str),
    /// Cannot parse the response as JSON.
    #[error("Cannot parse response: {0}")]
    Json(#[from] serde_json::Error),
    /// I/O error while staging a file transfer.
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
}

impl RestError {
    /// Return the HTTP status code if the error was a [`RestError::Api`]. Otherwise, return
    /// `None`.
    pub fn status(&self) -> Option<StatusCode> {
        if let RestError::Api(_, status, _) = self {
            Some(*status)
        } else {
            None
        }
    }
}
