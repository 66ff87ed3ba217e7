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

//! BGP peers on top of an IPv4 stack.

use std::net::Ipv4Addr;

use serde_json::{json, Value};

use super::Pattern;

/// Whether a BGP peer speaks iBGP or eBGP with the device under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BgpPeerType {
    /// iBGP: the peer is in the same AS as the DUT.
    #[default]
    Internal,
    /// eBGP: the peer is in a different AS than the DUT.
    External,
}

impl BgpPeerType {
    fn as_str(&self) -> &'static str {
        match self {
            BgpPeerType::Internal => "internal",
            BgpPeerType::External => "external",
        }
    }
}

/// A simulated BGP speaker peering with the device under test.
#[derive(Debug, Clone)]
pub struct BgpPeer {
    /// Name of the BGP peer.
    pub name: String,
    /// Address distribution of the DUT side of the session.
    pub dut_ip: Pattern<Ipv4Addr>,
    /// Session type (iBGP or eBGP).
    pub peer_type: BgpPeerType,
    /// 2-byte local AS number distribution.
    pub local_as: Pattern<u32>,
}

impl BgpPeer {
    /// Create a new BGP peer. The DUT address defaults to `0.0.0.0`; set it with
    /// [`BgpPeer::dut_ip`].
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dut_ip: Pattern::Single(Ipv4Addr::UNSPECIFIED),
            peer_type: BgpPeerType::default(),
            local_as: Pattern::Single(65001),
        }
    }

    /// Set the address distribution of the DUT side of the session.
    pub fn dut_ip(mut self, dut_ip: Pattern<Ipv4Addr>) -> Self {
        self.dut_ip = dut_ip;
        self
    }

    /// Set the session type.
    pub fn peer_type(mut self, peer_type: BgpPeerType) -> Self {
        self.peer_type = peer_type;
        self
    }

    /// Set the 2-byte local AS number distribution.
    pub fn local_as(mut self, local_as: Pattern<u32>) -> Self {
        self.local_as = local_as;
        self
    }

    pub(crate) fn emit(&self, parent: &str, idx: usize, out: &mut Vec<Value>) {
        let xpath = format!("{parent}/bgpIpv4Peer[{idx}]");
        out.push(json!({
            "xpath": xpath,
            "name": self.name,
        }));
        self.dut_ip.emit(&xpath, "dutIp", out);
        Pattern::Single(self.peer_type.as_str()).emit(&xpath, "type", out);
        self.local_as.emit(&xpath, "localAs2Bytes", out);
    }
}
