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

//! This library contains methods for driving a UHD traffic-generator appliance through its
//! REST API: building protocol topologies, assigning test ports, running traffic, reading
//! statistics views, and executing hardware-driven Quick Tests.
//!
//! # Configuration
//!
//! The library reads its configuration from the folder named by the environment variable
//! `UHD_LAB_CONFIG`. The most important aspects are the address and credentials of the API
//! server and the physical port inventory of the lab:
//!
//! ```toml
//! [server]
//! addr = "10.36.79.101"
//! username = "admin"
//! password = "admin"
//!
//! [ports]
//! locations = ["localuhd/1", "localuhd/2"]
//!
//! [results]
//! folder = "/tmp/uhd-lab-results"
//!
//! [timing]
//! protocol_timeout = 60
//! ```
//!
//! # Port Ownership
//!
//! The appliance arbitrates its physical test ports: each port is owned by at most one user.
//! This is the locking mechanism of the lab. By default, assigning an owned port is an error;
//! call [`UhdLab::force_ownership`] to take ports over from other users (revoking their
//! sessions on those ports). Configuration sessions themselves are *not* exclusive: a session
//! left open (see [`UhdLab::keep_alive`]) can be re-attached with [`UhdLab::attach`] or
//! cleaned up through [`session::UhdSession::remove_by_id`].
//!
//! # Experiment Setup
//!
//! The expected physical setup is two (or more) appliance ports connected back-to-back:
//!
//! ```text
//!             ┌──────────────────────────┐
//!             │      UHD appliance       │
//!             │ - API server (REST/TLS)  │
//!             │ - protocol engine (NGPF) │
//!             │ - traffic engine         │
//!             │ - Quick Test runner      │
//!             └───────┬──────────┬───────┘
//!                     │ port 1   │ port 2
//!                     └──────────┘
//!                     back-to-back
//! ```
//!
//! A [`UhdLab`] is first built offline: it collects the topologies and knows the port
//! locations, and it can generate all configuration payloads without talking to the appliance.
//! Calling [`UhdLab::connect`] opens the session, pushes the configuration, and returns an
//! online lab on which protocols, traffic, statistics, and Quick Tests can be driven:
//!
//! ```rust,no_run
//! use uhd_lab::{topology::*, UhdLab, UhdLabError};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), UhdLabError> {
//! let mut lab = UhdLab::new("my-test");
//! lab.add_topology(
//!     Topology::new("Topo1", ["Port_1"]).device_group(
//!         DeviceGroup::new("DG1", 1).ethernet(
//!             Ethernet::new("Eth1").mac(Pattern::increment(
//!                 "00:01:01:01:00:01".parse::<MacAddr>().unwrap(),
//!                 "00:00:00:00:00:01".parse::<MacAddr>().unwrap(),
//!             )),
//!         ),
//!     ),
//! );
//! let lab = lab.connect().await?;
//! lab.start_protocols().await?;
//! let lab = lab.disconnect().await?;
//! # Ok(())
//! # }
//! ```

use serde_json::Value;
use thiserror::Error;

pub mod config;
pub mod port;
pub mod protocol;
pub mod quicktest;
pub mod rest;
pub mod session;
pub mod stats;
pub mod topology;
pub mod traffic;

#[cfg(test)]
mod test;

use config::{PortLocation, CONFIG};
use port::{PortError, Vport};
use protocol::{ArpFailure, ProtocolError, ProtocolStack};
use quicktest::{QuickTestError, QuickTestHandle};
use rest::{href_of, RestClient, RestError};
use session::{ApplicationType, SessionError, UhdSession};
use stats::{StatView, StatsError};
use topology::Topology;
use traffic::{EndpointRef, ResolvedEndpointSet, TrafficError, TrafficItem, TrafficItemHandle};

/// The `UhdLab` is in offline mode. This means that it will not do anything on the appliance,
/// but you can still build topologies and generate the configuration payloads.
pub struct Offline;

/// The `UhdLab` holds an open session on the appliance and is actively managing it.
pub struct Online {
    pub(crate) session: UhdSession,
    pub(crate) vports: Vec<Vport>,
}

/// This structure represents one automation run against the appliance. The type parameter `S`
/// indicates the current state of the lab, either [`Offline`] or [`Online`].
///
/// Calling [`UhdLab::new`] creates an offline instance that only builds configuration payloads
/// locally. Calling [`UhdLab::connect`] authenticates with the API server, creates a fresh
/// named session, pushes the planned configuration, and returns an online instance. The online
/// instance is torn down with [`UhdLab::disconnect`], which removes the session unless
/// [`UhdLab::keep_alive`] was set.
pub struct UhdLab<S = Offline> {
    /// Name of the appliance session.
    session_name: String,
    /// Application type used when creating the session.
    application_type: ApplicationType,
    /// Physical port locations to assign, in vport order.
    locations: Vec<PortLocation>,
    /// Whether to take port ownership from other users.
    force_ownership: bool,
    /// Whether to leave the session open on disconnect (for debugging).
    keep_alive: bool,
    /// The planned topologies.
    topologies: Vec<Topology>,
    state: S,
}

impl UhdLab<Offline> {
    /// Create a new offline lab. The port locations default to the configured inventory.
    pub fn new(session_name: impl Into<String>) -> Self {
        Self {
            session_name: session_name.into(),
            application_type: ApplicationType::Ixnrest,
            locations: CONFIG.ports.locations.clone(),
            force_ownership: false,
            keep_alive: false,
            topologies: Vec::new(),
            state: Offline,
        }
    }

    /// Set the application type used when creating the session. Running Quick Tests requires
    /// [`ApplicationType::Quicktest`].
    pub fn application_type(mut self, application_type: ApplicationType) -> Self {
        self.application_type = application_type;
        self
    }

    /// Use these port locations instead of the configured inventory.
    pub fn with_ports(mut self, locations: impl IntoIterator<Item = PortLocation>) -> Self {
        self.locations = locations.into_iter().collect();
        self
    }

    /// Forcefully take port ownership if the ports are owned by other users.
    pub fn force_ownership(mut self, force: bool) -> Self {
        self.force_ownership = force;
        self
    }

    /// Leave the session open when disconnecting, so it can be inspected and re-attached.
    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Add a topology to the plan.
    pub fn add_topology(&mut self, topology: Topology) -> &mut Self {
        self.topologies.push(topology);
        self
    }

    /// The vport names of the plan, `Port_1` to `Port_n`, one per port location.
    pub fn vport_names(&self) -> Vec<String> {
        (1..=self.locations.len())
            .map(|i| format!("Port_{i}"))
            .collect()
    }

    /// Generate the resource-manager payload creating the planned vports.
    pub fn generate_vport_import(&self) -> Value {
        Value::Array(
            self.vport_names()
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    serde_json::json!({ "xpath": format!("/vport[{}]", i + 1), "name": name })
                })
                .collect(),
        )
    }

    /// Generate the resource-manager payload creating the planned topologies. The vport names
    /// referenced by the topologies are resolved to their xpaths.
    pub fn generate_topology_import(&self) -> Result<Value, UhdLabError> {
        Self::generate_topology_import_for(&self.topologies, self.locations.len())
    }

    /// Connect to the API server, create a fresh session, and push the planned configuration.
    /// With topologies in the plan, this also creates and assigns the vports; without them,
    /// use [`UhdLab::create_ports`] (or [`UhdLab::load_config`] followed by
    /// [`UhdLab::assign_ports`]) on the online lab.
    pub async fn connect(self) -> Result<UhdLab<Online>, UhdLabError> {
        let mut rest = RestClient::connect(&CONFIG.server.addr, CONFIG.server.rest_port).await?;
        rest.authenticate(&CONFIG.server.username, &CONFIG.server.password)
            .await?;

        let session =
            UhdSession::create(&rest, &self.session_name, self.application_type).await?;
        log::info!(
            "[{}] Session ID/Session Name: {} {}",
            rest.name(),
            session.info().id,
            session.info().name
        );
        session.clear_config().await?;

        let mut lab = UhdLab {
            session_name: self.session_name,
            application_type: self.application_type,
            locations: self.locations,
            force_ownership: self.force_ownership,
            keep_alive: self.keep_alive,
            topologies: self.topologies,
            state: Online {
                session,
                vports: Vec::new(),
            },
        };

        if !lab.topologies.is_empty() {
            lab.create_ports().await?;
            let import = UhdLab::<Offline>::generate_topology_import_for(
                &lab.topologies,
                lab.locations.len(),
            )?;
            lab.state.session.import_config(&import, false).await?;
        }

        Ok(lab)
    }

    /// Attach to an existing session by id, without touching its configuration.
    pub async fn attach(session_id: u32) -> Result<UhdLab<Online>, UhdLabError> {
        let mut rest = RestClient::connect(&CONFIG.server.addr, CONFIG.server.rest_port).await?;
        rest.authenticate(&CONFIG.server.username, &CONFIG.server.password)
            .await?;

        let session = UhdSession::attach(&rest, session_id).await?;
        log::info!(
            "[{}] Connected to Session ID {} - Session Name {}",
            rest.name(),
            session.info().id,
            session.info().name
        );

        let vports = port::find_vports(&session).await?;
        Ok(UhdLab {
            session_name: session.info().name.clone(),
            application_type: session.info().application_type,
            locations: CONFIG.ports.locations.clone(),
            force_ownership: false,
            keep_alive: true,
            topologies: Vec::new(),
            state: Online { session, vports },
        })
    }

    /// Resolve vport names to xpaths and emit all topologies. Split out so that
    /// [`UhdLab::connect`] can call it after `self` was moved into the online lab.
    fn generate_topology_import_for(
        topologies: &[Topology],
        num_ports: usize,
    ) -> Result<Value, UhdLabError> {
        let names: Vec<String> = (1..=num_ports).map(|i| format!("Port_{i}")).collect();
        let mut out = Vec::new();
        for (i, topology) in topologies.iter().enumerate() {
            let vport_xpaths = topology
                .vports
                .iter()
                .map(|name| {
                    names
                        .iter()
                        .position(|n| n == name)
                        .map(|idx| format!("/vport[{}]", idx + 1))
                        .ok_or_else(|| PortError::UnknownVport(name.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            topology.emit(i + 1, vport_xpaths, &mut out);
        }
        Ok(Value::Array(out))
    }
}

impl UhdLab<Online> {
    /// The open appliance session.
    pub fn session(&self) -> &UhdSession {
        &self.state.session
    }

    /// The vports of the session, as of the last port operation.
    pub fn vports(&self) -> &[Vport] {
        &self.state.vports
    }

    /// Create one vport per planned port location and assign the physical ports to them.
    pub async fn create_ports(&mut self) -> Result<(), UhdLabError> {
        let names: Vec<String> = (1..=self.locations.len())
            .map(|i| format!("Port_{i}"))
            .collect();
        port::import_vports(&self.state.session, &names).await?;
        self.assign_ports().await
    }

    /// Assign the planned port locations to the existing vports of the session (e.g. the
    /// vports a loaded configuration file brought along) and wait for the links to come up.
    pub async fn assign_ports(&mut self) -> Result<(), UhdLabError> {
        let vports = port::find_vports(&self.state.session).await?;
        if vports.len() < self.locations.len() {
            return Err(UhdLabError::TooFewVports(vports.len(), self.locations.len()));
        }
        port::assign_ports(
            &self.state.session,
            &self.locations,
            &vports[..self.locations.len()],
            self.force_ownership,
        )
        .await?;
        self.state.vports = port::find_vports(&self.state.session).await?;
        Ok(())
    }

    /// Upload and load a saved binary configuration file.
    pub async fn load_config(
        &mut self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), UhdLabError> {
        self.state.session.load_config(path).await?;
        self.state.vports = port::find_vports(&self.state.session).await?;
        Ok(())
    }

    /// Load a local JSON configuration file, replacing the whole configuration.
    pub async fn load_json_config(
        &mut self,
        path: impl AsRef<std::path::Path>,
    ) -> Result<(), UhdLabError> {
        self.state.session.load_json_config(path).await?;
        self.state.vports = port::find_vports(&self.state.session).await?;
        Ok(())
    }

    /// Import a JSON configuration fragment through the resource manager.
    pub async fn import_json(&self, config: &Value, overwrite: bool) -> Result<(), UhdLabError> {
        Ok(self.state.session.import_config(config, overwrite).await?)
    }

    /// Export the full configuration as xpath-keyed JSON.
    pub async fn export_json(&self) -> Result<Value, UhdLabError> {
        Ok(self.state.session.export_config().await?)
    }

    /// Start all protocols and wait for the operation to complete.
    pub async fn start_protocols(&self) -> Result<(), UhdLabError> {
        Ok(protocol::start_all_protocols(&self.state.session).await?)
    }

    /// Stop all protocols.
    pub async fn stop_protocols(&self) -> Result<(), UhdLabError> {
        Ok(protocol::stop_all_protocols(&self.state.session).await?)
    }

    /// Find all BGP peer stacks in the live configuration.
    pub async fn bgp_peers(&self) -> Result<Vec<ProtocolStack>, UhdLabError> {
        Ok(protocol::find_bgp_peers(&self.state.session).await?)
    }

    /// Wait until all sessions of the given protocol stacks are up.
    pub async fn wait_sessions_up(&self, stacks: &[ProtocolStack]) -> Result<(), UhdLabError> {
        Ok(protocol::wait_sessions_up(&self.state.session, stacks).await?)
    }

    /// Collect all addresses that failed gateway MAC resolution. An empty result means ARP
    /// resolved everywhere.
    pub async fn verify_arp(&self) -> Result<Vec<ArpFailure>, UhdLabError> {
        Ok(protocol::verify_arp(&self.state.session).await?)
    }

    /// Open a statistics view by caption.
    pub async fn stat_view(&self, caption: impl Into<String>) -> Result<StatView, UhdLabError> {
        Ok(StatView::open(&self.state.session, caption).await?)
    }

    /// Create a traffic item on the appliance from an offline description.
    pub async fn create_traffic_item(
        &self,
        item: &TrafficItem,
    ) -> Result<TrafficItemHandle, UhdLabError> {
        let mut resolved = Vec::new();
        for set in &item.endpoint_sets {
            let mut sources = Vec::new();
            for s in &set.sources {
                sources.push(self.resolve_endpoint(s).await?);
            }
            let mut destinations = Vec::new();
            for d in &set.destinations {
                destinations.push(self.resolve_endpoint(d).await?);
            }
            resolved.push(ResolvedEndpointSet {
                sources,
                destinations,
            });
        }
        Ok(traffic::create_traffic_item(&self.state.session, item, resolved).await?)
    }

    /// Resolve an endpoint reference to an appliance href.
    async fn resolve_endpoint(&self, endpoint: &EndpointRef) -> Result<String, UhdLabError> {
        match endpoint {
            EndpointRef::Topology(name) => {
                let topologies: Vec<Value> = self
                    .state
                    .session
                    .rest()
                    .get(self.state.session.href("topology"))
                    .await
                    .map_err(TrafficError::Rest)?;
                topologies
                    .iter()
                    .find(|t| t.get("name").and_then(Value::as_str) == Some(name.as_str()))
                    .and_then(href_of)
                    .ok_or_else(|| TrafficError::UnknownEndpoint(name.clone()).into())
            }
            EndpointRef::PortProtocols(name) => self
                .state
                .vports
                .iter()
                .find(|v| v.name == *name)
                .map(|v| format!("{}/protocols", v.href))
                .ok_or_else(|| TrafficError::UnknownEndpoint(name.clone()).into()),
        }
    }

    /// Find all traffic items of the current configuration.
    pub async fn traffic_items(&self) -> Result<Vec<TrafficItemHandle>, UhdLabError> {
        Ok(traffic::find_traffic_items(&self.state.session).await?)
    }

    /// Generate the flows of a traffic item.
    pub async fn generate_traffic(&self, item: &TrafficItemHandle) -> Result<(), UhdLabError> {
        Ok(traffic::generate(&self.state.session, item).await?)
    }

    /// Apply the generated traffic to the hardware.
    pub async fn apply_traffic(&self) -> Result<(), UhdLabError> {
        Ok(traffic::apply(&self.state.session).await?)
    }

    /// Start transmitting and wait until transmission is running.
    pub async fn start_traffic_blocking(&self) -> Result<(), UhdLabError> {
        Ok(traffic::start_blocking(&self.state.session).await?)
    }

    /// Stop transmitting and wait until transmission has stopped.
    pub async fn stop_traffic_blocking(&self) -> Result<(), UhdLabError> {
        Ok(traffic::stop_blocking(&self.state.session).await?)
    }

    /// Start transmitting without waiting.
    pub async fn start_traffic(&self) -> Result<(), UhdLabError> {
        Ok(traffic::start(&self.state.session).await?)
    }

    /// Stop transmitting without waiting.
    pub async fn stop_traffic(&self) -> Result<(), UhdLabError> {
        Ok(traffic::stop(&self.state.session).await?)
    }

    /// Find all Quick Tests of the loaded configuration.
    pub async fn quick_tests(&self) -> Result<Vec<QuickTestHandle>, UhdLabError> {
        Ok(QuickTestHandle::find_all(&self.state.session).await?)
    }

    /// Disconnect from the appliance. Unless [`UhdLab::keep_alive`] was set, this removes the
    /// session from the API server.
    pub async fn disconnect(self) -> Result<UhdLab<Offline>, UhdLabError> {
        if self.keep_alive {
            log::debug!(
                "[{}] Leaving session {} open",
                self.state.session.rest().name(),
                self.state.session.info().id
            );
        } else {
            self.state.session.remove().await?;
        }
        Ok(UhdLab {
            session_name: self.session_name,
            application_type: self.application_type,
            locations: self.locations,
            force_ownership: self.force_ownership,
            keep_alive: self.keep_alive,
            topologies: self.topologies,
            state: Offline,
        })
    }
}

/// Error type thrown while managing the lab.
#[derive(Debug, Error)]
pub enum UhdLabError {
    /// Error on the REST transport.
    #[error("{0}")]
    Rest(#[from] RestError),
    /// Error while managing the appliance session.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
    /// Error while managing ports.
    #[error("Port error: {0}")]
    Port(#[from] PortError),
    /// Error while managing protocols.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    /// Error while configuring or running traffic.
    #[error("Traffic error: {0}")]
    Traffic(#[from] TrafficError),
    /// Error while reading statistics.
    #[error("Statistics error: {0}")]
    Stats(#[from] StatsError),
    /// Error while running a Quick Test.
    #[error("Quick Test error: {0}")]
    QuickTest(#[from] QuickTestError),
    /// The session has fewer vports than there are port locations to assign.
    #[error("Cannot assign {1} port locations to {0} vports")]
    TooFewVports(usize, usize),
    /// I/O Error
    #[error("I/O Error: {0}")]
    Io(#[from] std::io::Error),
}
