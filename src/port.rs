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

//! Module for managing virtual ports and their mapping to physical test ports.
//!
//! Physical ports are a shared resource: every port is owned by at most one user at a time.
//! Assigning an owned port fails unless the caller explicitly force-takes ownership, in which
//! case the appliance revokes it from the previous owner. This is the lab's locking mechanism;
//! without `force`, a lab run on ports that somebody else is using aborts with
//! [`PortError::Owned`].

use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    config::{PortLocation, CONFIG},
    rest::{href_of, RestError},
    session::UhdSession,
};

/// A virtual port of the current session.
#[derive(Debug, Clone)]
pub struct Vport {
    /// The appliance href of this vport.
    pub href: String,
    /// The xpath of this vport, `/vport[i]` (1-based, in creation order).
    pub xpath: String,
    /// Name of the vport.
    pub name: String,
    /// The physical location this vport is assigned to, if any.
    pub assigned_to: Option<String>,
    /// The last observed connection state.
    pub state: String,
}

/// Create `names.len()` virtual ports through the resource manager, named in order.
pub(crate) async fn import_vports(
    session: &UhdSession,
    names: &[String],
) -> Result<(), PortError> {
    log::debug!("[{}] Adding {} virtual ports", session.rest().name(), names.len());
    let payload: Vec<Value> = names
        .iter()
        .enumerate()
        .map(|(i, name)| json!({ "xpath": format!("/vport[{}]", i + 1), "name": name }))
        .collect();
    session
        .import_config(&Value::Array(payload), false)
        .await
        .map_err(|e| PortError::Import(e.to_string()))?;
    Ok(())
}

/// Fetch all virtual ports of the session, in creation order.
pub async fn find_vports(session: &UhdSession) -> Result<Vec<Vport>, PortError> {
    let objects: Vec<Value> = session.rest().get(session.href("vport")).await?;
    objects
        .into_iter()
        .enumerate()
        .map(|(i, obj)| {
            let href = href_of(&obj).ok_or(RestError::UnexpectedPayload("vport without href"))?;
            Ok(Vport {
                href,
                xpath: format!("/vport[{}]", i + 1),
                name: obj
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                assigned_to: obj
                    .get("assignedTo")
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
                state: obj
                    .get("connectionState")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
        })
        .collect()
}

/// Assign physical port locations to the given vports (in order) and wait for the links to come
/// up. With `force`, ownership is taken over from other users; without it, an owned port is an
/// error.
pub async fn assign_ports(
    session: &UhdSession,
    locations: &[PortLocation],
    vports: &[Vport],
    force: bool,
) -> Result<(), PortError> {
    log::debug!(
        "[{}] Assigning ports: {}",
        session.rest().name(),
        locations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let arg1: Vec<Value> = locations
        .iter()
        .map(|l| {
            json!({
                "arg1": l.chassis,
                "arg2": l.card.map(|c| c.to_string()).unwrap_or_default(),
                "arg3": l.port.to_string(),
            })
        })
        .collect();
    let arg3: Vec<&str> = vports.iter().map(|v| v.href.as_str()).collect();

    session
        .rest()
        .execute(
            session.href("operations/assignports"),
            &json!({
                "arg1": arg1,
                "arg2": [],
                "arg3": arg3,
                "arg4": force,
            }),
        )
        .await?;

    wait_ports_connected(session, force).await
}

/// Poll the connection state of all vports until every link is up, bounded by
/// `timing.port_up_timeout` seconds.
async fn wait_ports_connected(session: &UhdSession, force: bool) -> Result<(), PortError> {
    let mut last_states: Vec<Vport> = Vec::new();
    for _ in 0..CONFIG.timing.port_up_timeout {
        let vports = find_vports(session).await?;

        // an owned port never comes up by waiting; fail fast.
        if !force {
            if let Some(owned) = vports.iter().find(|v| v.state == "assignedInUseByOther") {
                log::error!(
                    "[{}] Port {} is owned by another user!",
                    session.rest().name(),
                    owned.assigned_to.as_deref().unwrap_or(&owned.name),
                );
                return Err(PortError::Owned {
                    port: owned.assigned_to.clone().unwrap_or_else(|| owned.name.clone()),
                });
            }
        }

        if vports.iter().all(|v| v.state == "connectedLinkUp") {
            log::debug!("[{}] All ports are up", session.rest().name());
            return Ok(());
        }

        last_states = vports;
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    let pending = last_states
        .iter()
        .filter(|v| v.state != "connectedLinkUp")
        .map(|v| format!("{} ({})", v.name, v.state))
        .collect::<Vec<_>>()
        .join(", ");
    log::error!(
        "[{}] Ports did not come up within {} seconds: {}",
        session.rest().name(),
        CONFIG.timing.port_up_timeout,
        pending
    );
    Err(PortError::LinkTimeout(pending))
}

/// Release all ports of the session back to the chassis.
pub async fn release_ports(session: &UhdSession, vports: &[Vport]) -> Result<(), PortError> {
    for vport in vports {
        session
            .rest()
            .execute(format!("{}/operations/releaseport", vport.href), &json!({}))
            .await?;
    }
    Ok(())
}

/// Error kind returned when working with ports.
#[derive(Debug, Error)]
pub enum PortError {
    /// Error on the REST transport.
    #[error("{0}")]
    Rest(#[from] RestError),
    /// Cannot import the vport objects.
    #[error("Cannot import virtual ports: {0}")]
    Import(String),
    /// A physical port is owned by another user and `force` was not set.
    #[error("Port {port} is owned by another user (set force_ownership to take it over)")]
    Owned {
        /// The location (or vport name) of the owned port.
        port: String,
    },
    /// The ports did not reach link-up within the configured timeout.
    #[error("Ports did not come up in time: {0}")]
    LinkTimeout(String),
    /// A topology references a vport name that does not exist.
    #[error("Unknown vport name: {0}")]
    UnknownVport(String),
}
