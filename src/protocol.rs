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

//! Module for starting protocols and verifying that their sessions come up.

use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    config::CONFIG,
    rest::{href_of, RestError},
    session::UhdSession,
};

/// The state of one simulated protocol session, validated at the boundary. Labels the appliance
/// reports that are not part of the known vocabulary are logged and kept as
/// [`SessionStatus::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Up,
    Down,
    NotStarted,
    Unknown(String),
}

impl SessionStatus {
    /// Parse a status label reported by the appliance.
    pub fn parse(label: &str) -> Self {
        match label {
            "up" => SessionStatus::Up,
            "down" => SessionStatus::Down,
            "notStarted" => SessionStatus::NotStarted,
            x => {
                log::warn!("[protocol] unrecognized session status: {x}");
                SessionStatus::Unknown(x.to_string())
            }
        }
    }
}

/// A protocol stack object in the live configuration tree.
#[derive(Debug, Clone)]
pub struct ProtocolStack {
    /// The appliance href of the stack.
    pub href: String,
    /// Name of the stack.
    pub name: String,
}

/// Start all protocols of the current configuration and wait for the operation to complete.
pub async fn start_all_protocols(session: &UhdSession) -> Result<(), ProtocolError> {
    log::debug!("[{}] Starting all protocols", session.rest().name());
    session
        .rest()
        .execute(
            session.href("operations/startallprotocols"),
            &json!({ "arg1": "sync" }),
        )
        .await?;
    Ok(())
}

/// Stop all protocols of the current configuration.
pub async fn stop_all_protocols(session: &UhdSession) -> Result<(), ProtocolError> {
    log::debug!("[{}] Stopping all protocols", session.rest().name());
    session
        .rest()
        .execute(
            session.href("operations/stopallprotocols"),
            &json!({ "arg1": "sync" }),
        )
        .await?;
    Ok(())
}

/// Fetch the per-device session status of a protocol stack.
pub async fn session_status(
    session: &UhdSession,
    href: impl AsRef<str>,
) -> Result<Vec<SessionStatus>, ProtocolError> {
    let obj: Value = session.rest().get(href.as_ref()).await?;
    Ok(obj
        .get("sessionStatus")
        .and_then(Value::as_array)
        .map(|xs| {
            xs.iter()
                .filter_map(Value::as_str)
                .map(SessionStatus::parse)
                .collect()
        })
        .unwrap_or_default())
}

/// Poll the given protocol stacks once per second until every session is up, bounded by
/// `timing.protocol_timeout` seconds.
pub async fn wait_sessions_up(
    session: &UhdSession,
    stacks: &[ProtocolStack],
) -> Result<(), ProtocolError> {
    let mut pending = String::new();
    for _ in 0..CONFIG.timing.protocol_timeout {
        let mut all_up = true;
        for stack in stacks {
            let states = session_status(session, &stack.href).await?;
            if states.is_empty() || states.iter().any(|s| *s != SessionStatus::Up) {
                all_up = false;
                pending = stack.name.clone();
                break;
            }
        }
        if all_up {
            log::info!(
                "[{}] {} protocol sessions are up",
                session.rest().name(),
                stacks.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join(",")
            );
            return Ok(());
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    log::error!(
        "[{}] Session up status not reached in {} secs ({} is not up)",
        session.rest().name(),
        CONFIG.timing.protocol_timeout,
        pending
    );
    Err(ProtocolError::SessionsTimeout {
        protocol: pending,
        seconds: CONFIG.timing.protocol_timeout,
    })
}

/// List all BGP peer stacks of the live configuration tree.
pub async fn find_bgp_peers(session: &UhdSession) -> Result<Vec<ProtocolStack>, ProtocolError> {
    let mut result = Vec::new();
    for topology in children(session, session.href("topology")).await? {
        let topo_href = require_href(&topology)?;
        for device_group in children(session, format!("{topo_href}/deviceGroup")).await? {
            let dg_href = require_href(&device_group)?;
            for ethernet in children(session, format!("{dg_href}/ethernet")).await? {
                let eth_href = require_href(&ethernet)?;
                for ipv4 in children(session, format!("{eth_href}/ipv4")).await? {
                    let ip_href = require_href(&ipv4)?;
                    for peer in children(session, format!("{ip_href}/bgpIpv4Peer")).await? {
                        result.push(ProtocolStack {
                            href: require_href(&peer)?,
                            name: name_of(&peer),
                        });
                    }
                }
            }
        }
    }
    Ok(result)
}

/// An IP stack with devices that failed to resolve their gateway's MAC address.
#[derive(Debug, Clone)]
pub struct ArpFailure {
    /// Name of the failing IP stack.
    pub stack: String,
    /// The addresses whose ARP/ND resolution failed.
    pub addresses: Vec<String>,
}

/// Walk all started device groups and collect the IPv4/IPv6 addresses whose gateway MAC
/// resolution failed. An empty result means ARP is fine everywhere.
pub async fn verify_arp(session: &UhdSession) -> Result<Vec<ArpFailure>, ProtocolError> {
    let mut failures = Vec::new();
    for topology in children(session, session.href("topology")).await? {
        let topo_href = require_href(&topology)?;
        for device_group in children(session, format!("{topo_href}/deviceGroup")).await? {
            // only started device groups have meaningful session info
            if device_group.get("status").and_then(Value::as_str) != Some("started") {
                continue;
            }
            let dg_href = require_href(&device_group)?;
            for ethernet in children(session, format!("{dg_href}/ethernet")).await? {
                let eth_href = require_href(&ethernet)?;
                for stack in ["ipv4", "ipv6"] {
                    for ip in children(session, format!("{eth_href}/{stack}")).await? {
                        if let Some(failure) = arp_failure_of(session, &ip).await? {
                            failures.push(failure);
                        }
                    }
                }
            }
        }
    }
    Ok(failures)
}

/// Check the session info of a single IP stack for failed MAC resolution.
async fn arp_failure_of(
    session: &UhdSession,
    ip: &Value,
) -> Result<Option<ArpFailure>, ProtocolError> {
    let failed_indices: Vec<usize> = ip
        .get("sessionInfo")
        .and_then(Value::as_array)
        .map(|xs| {
            xs.iter()
                .enumerate()
                .filter(|(_, info)| info.as_str() == Some("resolveMacFailed"))
                .map(|(i, _)| i)
                .collect()
        })
        .unwrap_or_default();

    if failed_indices.is_empty() {
        return Ok(None);
    }

    // with the indices, look up the affected addresses
    let href = require_href(ip)?;
    let address: Value = session.rest().get(format!("{href}/address")).await?;
    let values: Vec<String> = address
        .get("values")
        .and_then(Value::as_array)
        .map(|xs| {
            xs.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(Some(ArpFailure {
        stack: name_of(ip),
        addresses: failed_indices
            .into_iter()
            .filter_map(|i| values.get(i).cloned())
            .collect(),
    }))
}

/// Fetch a list of child objects. A 404 means the child type does not exist at this level,
/// which is treated as an empty list.
async fn children(
    session: &UhdSession,
    href: impl AsRef<str>,
) -> Result<Vec<Value>, ProtocolError> {
    match session.rest().get(href.as_ref()).await {
        Ok(xs) => Ok(xs),
        Err(e) if e.status() == Some(reqwest::StatusCode::NOT_FOUND) => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

fn require_href(obj: &Value) -> Result<String, ProtocolError> {
    href_of(obj).ok_or_else(|| RestError::UnexpectedPayload("object without href").into())
}

fn name_of(obj: &Value) -> String {
    obj.get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Error kind returned when managing protocols.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Error on the REST transport.
    #[error("{0}")]
    Rest(#[from] RestError),
    /// Not all protocol sessions came up within the configured timeout.
    #[error("Session up status not reached in {seconds} secs ({protocol} is not up)")]
    SessionsTimeout {
        /// The first protocol stack that was not up.
        protocol: String,
        /// The configured timeout.
        seconds: u64,
    },
}
