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

//! Implementation of the configuration session with the UHD API server.

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::rest::{RestClient, RestError};

/// The application type with which a session is created. Regular traffic and protocol work uses
/// [`ApplicationType::Ixnrest`]; running Quick Tests requires [`ApplicationType::Quicktest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ApplicationType {
    #[default]
    #[serde(rename = "ixnrest")]
    Ixnrest,
    #[serde(rename = "quicktest")]
    Quicktest,
}

impl ApplicationType {
    fn as_str(&self) -> &'static str {
        match self {
            ApplicationType::Ixnrest => "ixnrest",
            ApplicationType::Quicktest => "quicktest",
        }
    }
}

/// Metadata of a session on the API server, as reported by the session list.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    /// Numeric session id.
    pub id: u32,
    /// Session name. The appliance leaves this empty for sessions created without one.
    #[serde(default)]
    pub name: String,
    /// The application type of the session.
    #[serde(default)]
    pub application_type: ApplicationType,
    /// Free-text session state (e.g. `ACTIVE`).
    #[serde(default)]
    pub state: String,
    /// The user that owns the session.
    #[serde(default)]
    pub user_name: String,
}

/// An open configuration session on the API server.
///
/// The session is removed by explicitly calling [`UhdSession::remove`]. Dropping a session
/// without removing it leaves it open on the appliance (this is intentional: it is also the
/// debug workflow, and another client can re-attach with [`UhdSession::attach`]).
#[derive(Debug, Clone)]
pub struct UhdSession {
    rest: RestClient,
    info: SessionInfo,
    /// Root href of the configuration tree, `/api/v1/sessions/{id}/ixnetwork`.
    root: String,
}

impl UhdSession {
    /// List all open sessions on the API server.
    pub async fn list(rest: &RestClient) -> Result<Vec<SessionInfo>, SessionError> {
        Ok(rest.get("/api/v1/sessions").await?)
    }

    /// Create a new named session with the given application type and wait until it is active.
    pub async fn create(
        rest: &RestClient,
        name: impl Into<String>,
        application_type: ApplicationType,
    ) -> Result<Self, SessionError> {
        let name = name.into();
        log::debug!("[{}] Creating session {}", rest.name(), name);

        let created = rest
            .post(
                "/api/v1/sessions",
                &json!({
                    "name": name,
                    "applicationType": application_type.as_str(),
                }),
            )
            .await?;

        // the appliance either returns the created session object, or a list containing it.
        let info: SessionInfo = match created {
            Value::Array(mut xs) if !xs.is_empty() => serde_json::from_value(xs.remove(0))?,
            Value::Null => {
                // some server versions return an empty body. Look the session up by name.
                Self::list(rest)
                    .await?
                    .into_iter()
                    .find(|s| s.name == name)
                    .ok_or_else(|| SessionError::NotFound(name.clone()))?
            }
            x => serde_json::from_value(x)?,
        };

        let session = Self::from_info(rest.clone(), info);
        session.start().await?;
        Ok(session)
    }

    /// Attach to an existing session by id, without modifying its configuration.
    pub async fn attach(rest: &RestClient, id: u32) -> Result<Self, SessionError> {
        let info = Self::list(rest)
            .await?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or(SessionError::NoSuchId(id))?;
        log::debug!("[{}] Attached to session {} ({})", rest.name(), id, info.name);
        Ok(Self::from_info(rest.clone(), info))
    }

    /// Remove a session by id without attaching to it first.
    pub async fn remove_by_id(rest: &RestClient, id: u32) -> Result<(), SessionError> {
        log::debug!("[{}] Removing session {}", rest.name(), id);
        rest.delete(format!("/api/v1/sessions/{id}")).await?;
        Ok(())
    }

    fn from_info(rest: RestClient, info: SessionInfo) -> Self {
        let root = format!("/api/v1/sessions/{}/ixnetwork", info.id);
        Self { rest, info, root }
    }

    /// Make sure the session is started on the server side.
    async fn start(&self) -> Result<(), SessionError> {
        if self.info.state.eq_ignore_ascii_case("active") {
            return Ok(());
        }
        self.rest
            .execute(
                format!("/api/v1/sessions/{}/operations/start", self.info.id),
                &json!({}),
            )
            .await?;
        Ok(())
    }

    /// Session metadata.
    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    /// Root href of the configuration tree.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// The REST client this session runs over.
    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    /// Build an href below the configuration root.
    pub fn href(&self, path: impl AsRef<str>) -> String {
        format!("{}/{}", self.root, path.as_ref().trim_start_matches('/'))
    }

    /// Reset the session to an empty configuration.
    pub async fn clear_config(&self) -> Result<(), SessionError> {
        log::debug!("[{}] Clearing configuration", self.rest.name());
        self.rest
            .execute(self.href("operations/newconfig"), &json!({}))
            .await?;
        Ok(())
    }

    /// Upload a local binary configuration file (`.ixncfg`) and load it.
    pub async fn load_config(&self, local: impl AsRef<std::path::Path>) -> Result<(), SessionError> {
        let local = local.as_ref();
        let filename = local
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SessionError::InvalidConfigFile(local.display().to_string()))?
            .to_string();

        log::debug!("[{}] Loading config file {}", self.rest.name(), filename);

        let content = tokio::fs::read(local).await?;
        self.rest.upload_file(&filename, content).await?;
        self.rest
            .execute(
                self.href("operations/loadconfig"),
                &json!({ "filename": filename }),
            )
            .await?;
        Ok(())
    }

    /// Load a local JSON configuration file through the resource manager, replacing the whole
    /// configuration.
    pub async fn load_json_config(
        &self,
        local: impl AsRef<std::path::Path>,
    ) -> Result<(), SessionError> {
        let local = local.as_ref();
        log::debug!("[{}] Loading JSON config file {:?}", self.rest.name(), local);
        let content = tokio::fs::read_to_string(local).await?;
        let config: Value = serde_json::from_str(&content)?;
        self.import_config(&config, true).await
    }

    /// Import a JSON configuration fragment through the resource manager. With `overwrite`, the
    /// fragment replaces the whole configuration; without it, the fragment is merged into the
    /// existing one (objects are addressed by their `xpath`).
    pub async fn import_config(&self, config: &Value, overwrite: bool) -> Result<(), SessionError> {
        self.rest
            .execute(
                self.href("resourceManager/operations/importconfig"),
                &json!({
                    "arg1": self.href("resourceManager"),
                    "arg2": config.to_string(),
                    "arg3": overwrite,
                }),
            )
            .await?;
        Ok(())
    }

    /// Export the full configuration as xpath-keyed JSON.
    pub async fn export_config(&self) -> Result<Value, SessionError> {
        let result = self
            .rest
            .execute(
                self.href("resourceManager/operations/exportconfig"),
                &json!({
                    "arg1": self.href("resourceManager"),
                    "arg2": ["/descendant-or-self::*"],
                    "arg3": true,
                    "arg4": "json",
                }),
            )
            .await?;
        let exported = result
            .get("result")
            .and_then(Value::as_str)
            .ok_or(RestError::UnexpectedPayload("exportconfig without result"))?;
        Ok(serde_json::from_str(exported)?)
    }

    /// Download a file from the appliance to the local filesystem.
    pub async fn download_file(
        &self,
        remote: impl AsRef<str>,
        local: impl AsRef<std::path::Path>,
    ) -> Result<(), SessionError> {
        Ok(self.rest.download_file(remote, local).await?)
    }

    /// Remove the session from the API server.
    pub async fn remove(self) -> Result<(), SessionError> {
        log::debug!("[{}] Removing session {}", self.rest.name(), self.info.id);
        self.rest
            .delete(format!("/api/v1/sessions/{}", self.info.id))
            .await?;
        Ok(())
    }
}

/// Error kind returned when managing sessions.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Error on the REST transport.
    #[error("{0}")]
    Rest(#[from] RestError),
    /// The created session did not appear in the session list.
    #[error("Session {0} was created but does not appear in the session list")]
    NotFound(String),
    /// No session with the requested id exists.
    #[error("No session with id {0}")]
    NoSuchId(u32),
    /// The configuration file path has no usable filename.
    #[error("Invalid configuration file path: {0}")]
    InvalidConfigFile(String),
    /// Cannot parse a session object.
    #[error("Cannot parse session object: {0}")]
    Json(#[from] serde_json::Error),
    /// I/O error while reading a local configuration file.
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
}
