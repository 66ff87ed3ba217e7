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

//! Module for describing protocol topologies.
//!
//! A [`Topology`] is built offline as a plain value and only turned into the xpath-keyed JSON
//! fragment the appliance understands when the lab connects (see
//! [`crate::UhdLab::generate_topology_import`]). The builders mirror the appliance object tree:
//! a topology spans one or more virtual ports and contains device groups; a device group
//! multiplies a protocol stack of ethernet, IPv4, and the protocols on top (BGP peers, VXLAN
//! tunnels), and may carry network groups advertising route pools.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use hex::FromHex;
use ipnet::Ipv4Net;
use itertools::Itertools;
use serde_json::{json, Value};
use thiserror::Error;

pub mod bgp;
pub mod vxlan;

pub use bgp::{BgpPeer, BgpPeerType};
pub use vxlan::Vxlan;

/// An NGPF multivalue: the per-device value distribution of a single attribute.
///
/// Each attribute of a multiplied device group (MAC addresses, IP addresses, VLAN ids, ...) is
/// not a scalar but a pattern that expands to one value per simulated device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern<T> {
    /// Every device uses the same value.
    Single(T),
    /// The first device uses `start`, every further device adds `step`.
    Increment { start: T, step: T },
    /// Explicit list of values, one per device.
    ValueList(Vec<T>),
}

impl<T> Pattern<T> {
    /// Every device uses the same value.
    pub fn single(value: impl Into<T>) -> Self {
        Self::Single(value.into())
    }

    /// The first device uses `start`, every further device adds `step`.
    pub fn increment(start: impl Into<T>, step: impl Into<T>) -> Self {
        Self::Increment {
            start: start.into(),
            step: step.into(),
        }
    }

    /// Explicit list of values, one per device.
    pub fn values(values: impl IntoIterator<Item = T>) -> Self {
        Self::ValueList(values.into_iter().collect())
    }
}

impl<T: fmt::Display> Pattern<T> {
    /// Emit the multivalue as xpath-keyed JSON objects onto `out`. The `attr` is the attribute
    /// name below the owning object's xpath.
    pub(crate) fn emit(&self, owner: &str, attr: &str, out: &mut Vec<Value>) {
        match self {
            Pattern::Single(value) => out.push(json!({
                "xpath": format!("{owner}/{attr}/singleValue"),
                "value": value.to_string(),
            })),
            Pattern::Increment { start, step } => out.push(json!({
                "xpath": format!("{owner}/{attr}/counter"),
                "direction": "increment",
                "start": start.to_string(),
                "step": step.to_string(),
            })),
            Pattern::ValueList(values) => out.push(json!({
                "xpath": format!("{owner}/{attr}/valueList"),
                "values": values.iter().map(|v| v.to_string()).collect::<Vec<_>>(),
            })),
        }
    }
}

/// An ethernet MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddr(pub [u8; 6]);

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().map(|b| format!("{b:02x}")).join(":"))
    }
}

impl FromStr for MacAddr {
    type Err = InvalidMacAddr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s.split(':').collect();
        let bytes: [u8; 6] =
            FromHex::from_hex(&digits).map_err(|_| InvalidMacAddr(s.to_string()))?;
        Ok(MacAddr(bytes))
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddr(bytes)
    }
}

/// The MAC address string cannot be parsed.
#[derive(Debug, Clone, Error)]
#[error("Invalid MAC address: {0}")]
pub struct InvalidMacAddr(pub String);

/// A protocol topology spanning one or more virtual ports.
#[derive(Debug, Clone)]
pub struct Topology {
    /// Name of the topology.
    pub name: String,
    /// Names of the virtual ports this topology runs on.
    pub vports: Vec<String>,
    /// The device groups of this topology.
    pub device_groups: Vec<DeviceGroup>,
}

impl Topology {
    /// Create a new topology on the given virtual ports (by vport name).
    pub fn new(
        name: impl Into<String>,
        vports: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            vports: vports.into_iter().map(Into::into).collect(),
            device_groups: Vec::new(),
        }
    }

    /// Add a device group.
    pub fn device_group(mut self, device_group: DeviceGroup) -> Self {
        self.device_groups.push(device_group);
        self
    }

    /// Emit this topology (with 1-based index `idx`) as xpath-keyed JSON objects. The
    /// `vport_xpaths` are the resolved xpaths of the vports named in [`Topology::vports`].
    pub(crate) fn emit(&self, idx: usize, vport_xpaths: Vec<String>, out: &mut Vec<Value>) {
        let xpath = format!("/topology[{idx}]");
        out.push(json!({
            "xpath": xpath,
            "name": self.name,
            "vports": vport_xpaths,
        }));
        for (i, dg) in self.device_groups.iter().enumerate() {
            dg.emit(&xpath, i + 1, out);
        }
    }
}

/// A group of simulated devices, all sharing the same protocol stack.
#[derive(Debug, Clone)]
pub struct DeviceGroup {
    /// Name of the device group.
    pub name: String,
    /// How many devices this group simulates.
    pub multiplier: u32,
    /// Ethernet stacks of this device group.
    pub ethernets: Vec<Ethernet>,
    /// Network groups advertising routes behind this device group.
    pub network_groups: Vec<NetworkGroup>,
    /// Nested device groups (e.g. devices behind a VXLAN tunnel).
    pub device_groups: Vec<DeviceGroup>,
}

impl DeviceGroup {
    /// Create a new device group simulating `multiplier` devices.
    pub fn new(name: impl Into<String>, multiplier: u32) -> Self {
        Self {
            name: name.into(),
            multiplier,
            ethernets: Vec::new(),
            network_groups: Vec::new(),
            device_groups: Vec::new(),
        }
    }

    /// Add an ethernet stack.
    pub fn ethernet(mut self, ethernet: Ethernet) -> Self {
        self.ethernets.push(ethernet);
        self
    }

    /// Add a network group.
    pub fn network_group(mut self, network_group: NetworkGroup) -> Self {
        self.network_groups.push(network_group);
        self
    }

    /// Add a nested device group.
    pub fn device_group(mut self, device_group: DeviceGroup) -> Self {
        self.device_groups.push(device_group);
        self
    }

    pub(crate) fn emit(&self, parent: &str, idx: usize, out: &mut Vec<Value>) {
        let xpath = format!("{parent}/deviceGroup[{idx}]");
        out.push(json!({
            "xpath": xpath,
            "name": self.name,
            "multiplier": self.multiplier,
        }));
        for (i, eth) in self.ethernets.iter().enumerate() {
            eth.emit(&xpath, i + 1, out);
        }
        for (i, ng) in self.network_groups.iter().enumerate() {
            ng.emit(&xpath, i + 1, out);
        }
        for (i, dg) in self.device_groups.iter().enumerate() {
            dg.emit(&xpath, i + 1, out);
        }
    }
}

/// An ethernet protocol stack.
#[derive(Debug, Clone)]
pub struct Ethernet {
    /// Name of the ethernet stack.
    pub name: String,
    /// MAC address distribution.
    pub mac: Pattern<MacAddr>,
    /// VLAN id distribution. `None` leaves VLAN tagging disabled.
    pub vlan_id: Option<Pattern<u16>>,
    /// IPv4 stacks on top of this ethernet.
    pub ipv4: Vec<Ipv4Stack>,
}

impl Ethernet {
    /// Create a new ethernet stack. The MAC pattern defaults to a single all-zero address;
    /// set it with [`Ethernet::mac`].
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mac: Pattern::Single(MacAddr([0; 6])),
            vlan_id: None,
            ipv4: Vec::new(),
        }
    }

    /// Set the MAC address distribution.
    pub fn mac(mut self, mac: Pattern<MacAddr>) -> Self {
        self.mac = mac;
        self
    }

    /// Enable VLAN tagging with the given VLAN id distribution.
    pub fn vlan(mut self, vlan_id: Pattern<u16>) -> Self {
        self.vlan_id = Some(vlan_id);
        self
    }

    /// Add an IPv4 stack.
    pub fn ipv4(mut self, ipv4: Ipv4Stack) -> Self {
        self.ipv4.push(ipv4);
        self
    }

    pub(crate) fn emit(&self, parent: &str, idx: usize, out: &mut Vec<Value>) {
        let xpath = format!("{parent}/ethernet[{idx}]");
        out.push(json!({
            "xpath": xpath,
            "name": self.name,
        }));
        self.mac.emit(&xpath, "mac", out);
        Pattern::Single(self.vlan_id.is_some()).emit(&xpath, "enableVlans", out);
        if let Some(vlan_id) = &self.vlan_id {
            vlan_id.emit(&format!("{xpath}/vlan[1]"), "vlanId", out);
        }
        for (i, ip) in self.ipv4.iter().enumerate() {
            ip.emit(&xpath, i + 1, out);
        }
    }
}

/// An IPv4 protocol stack.
#[derive(Debug, Clone)]
pub struct Ipv4Stack {
    /// Name of the IPv4 stack.
    pub name: String,
    /// Address distribution.
    pub address: Pattern<Ipv4Addr>,
    /// Gateway address distribution.
    pub gateway: Pattern<Ipv4Addr>,
    /// Prefix length distribution.
    pub prefix: Pattern<u8>,
    /// Whether the devices resolve their gateway's MAC address.
    pub resolve_gateway: Option<bool>,
    /// BGP peers on top of this stack.
    pub bgp_peers: Vec<BgpPeer>,
    /// VXLAN tunnels on top of this stack.
    pub vxlans: Vec<Vxlan>,
}

impl Ipv4Stack {
    /// Create a new IPv4 stack with address and gateway `0.0.0.0/24`; set the real values
    /// with the builder methods.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: Pattern::Single(Ipv4Addr::UNSPECIFIED),
            gateway: Pattern::Single(Ipv4Addr::UNSPECIFIED),
            prefix: Pattern::Single(24),
            resolve_gateway: None,
            bgp_peers: Vec::new(),
            vxlans: Vec::new(),
        }
    }

    /// Set the address distribution.
    pub fn address(mut self, address: Pattern<Ipv4Addr>) -> Self {
        self.address = address;
        self
    }

    /// Set the gateway distribution.
    pub fn gateway(mut self, gateway: Pattern<Ipv4Addr>) -> Self {
        self.gateway = gateway;
        self
    }

    /// Set the prefix length distribution.
    pub fn prefix(mut self, prefix: Pattern<u8>) -> Self {
        self.prefix = prefix;
        self
    }

    /// Set whether the devices resolve their gateway's MAC address.
    pub fn resolve_gateway(mut self, resolve: bool) -> Self {
        self.resolve_gateway = Some(resolve);
        self
    }

    /// Add a BGP peer.
    pub fn bgp_peer(mut self, peer: BgpPeer) -> Self {
        self.bgp_peers.push(peer);
        self
    }

    /// Add a VXLAN tunnel.
    pub fn vxlan(mut self, vxlan: Vxlan) -> Self {
        self.vxlans.push(vxlan);
        self
    }

    pub(crate) fn emit(&self, parent: &str, idx: usize, out: &mut Vec<Value>) {
        let xpath = format!("{parent}/ipv4[{idx}]");
        out.push(json!({
            "xpath": xpath,
            "name": self.name,
        }));
        self.address.emit(&xpath, "address", out);
        self.gateway.emit(&xpath, "gatewayIp", out);
        self.prefix.emit(&xpath, "prefix", out);
        if let Some(resolve) = self.resolve_gateway {
            Pattern::Single(resolve).emit(&xpath, "resolveGateway", out);
        }
        for (i, peer) in self.bgp_peers.iter().enumerate() {
            peer.emit(&xpath, i + 1, out);
        }
        for (i, vxlan) in self.vxlans.iter().enumerate() {
            vxlan.emit(&xpath, i + 1, out);
        }
    }
}

/// A network group: routes advertised from behind a device group.
#[derive(Debug, Clone)]
pub struct NetworkGroup {
    /// Name of the network group.
    pub name: String,
    /// How many copies of the route pools this group advertises.
    pub multiplier: u32,
    /// IPv4 prefix pools of this group.
    pub pools: Vec<Ipv4PrefixPool>,
}

impl NetworkGroup {
    /// Create a new network group.
    pub fn new(name: impl Into<String>, multiplier: u32) -> Self {
        Self {
            name: name.into(),
            multiplier,
            pools: Vec::new(),
        }
    }

    /// Add an IPv4 prefix pool.
    pub fn ipv4_prefix_pool(mut self, pool: Ipv4PrefixPool) -> Self {
        self.pools.push(pool);
        self
    }

    pub(crate) fn emit(&self, parent: &str, idx: usize, out: &mut Vec<Value>) {
        let xpath = format!("{parent}/networkGroup[{idx}]");
        out.push(json!({
            "xpath": xpath,
            "name": self.name,
            "multiplier": self.multiplier,
        }));
        for (i, pool) in self.pools.iter().enumerate() {
            pool.emit(&xpath, i + 1, out);
        }
    }
}

/// A pool of IPv4 prefixes advertised by a network group.
#[derive(Debug, Clone)]
pub struct Ipv4PrefixPool {
    /// Number of addresses per pool entry.
    pub number_of_addresses: u32,
    /// Network address distribution.
    pub network_address: Pattern<Ipv4Addr>,
    /// Prefix length distribution.
    pub prefix_length: Pattern<u8>,
}

impl Ipv4PrefixPool {
    /// Create a new prefix pool.
    pub fn new(number_of_addresses: u32) -> Self {
        Self {
            number_of_addresses,
            network_address: Pattern::Single(Ipv4Addr::UNSPECIFIED),
            prefix_length: Pattern::Single(24),
        }
    }

    /// Set the network address distribution.
    pub fn network_address(mut self, network_address: Pattern<Ipv4Addr>) -> Self {
        self.network_address = network_address;
        self
    }

    /// Set network address and prefix length from a single network.
    pub fn network(mut self, net: Ipv4Net) -> Self {
        self.network_address = Pattern::Single(net.network());
        self.prefix_length = Pattern::Single(net.prefix_len());
        self
    }

    /// Set the prefix length distribution.
    pub fn prefix_length(mut self, prefix_length: Pattern<u8>) -> Self {
        self.prefix_length = prefix_length;
        self
    }

    pub(crate) fn emit(&self, parent: &str, idx: usize, out: &mut Vec<Value>) {
        let xpath = format!("{parent}/ipv4PrefixPools[{idx}]");
        out.push(json!({
            "xpath": xpath,
            "numberOfAddresses": self.number_of_addresses,
        }));
        self.network_address.emit(&xpath, "networkAddress", out);
        self.prefix_length.emit(&xpath, "prefixLength", out);
    }
}
