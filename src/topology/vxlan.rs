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

//! VXLAN tunnel endpoints on top of an IPv4 stack.
//!
//! The devices carried inside the tunnel are modeled as a nested
//! [`DeviceGroup`](super::DeviceGroup) next to the outer stack, exactly like the appliance
//! models them.

use std::net::Ipv4Addr;

use serde_json::{json, Value};

use super::Pattern;

/// A simulated VXLAN tunnel endpoint (VTEP).
#[derive(Debug, Clone)]
pub struct Vxlan {
    /// Name of the VXLAN stack.
    pub name: String,
    /// VXLAN network identifier distribution.
    pub vni: Pattern<u32>,
    /// IPv4 multicast group distribution used for BUM traffic.
    pub multicast_group: Pattern<Ipv4Addr>,
}

impl Vxlan {
    /// Create a new VXLAN stack with VNI 1 and multicast group `225.0.0.1`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vni: Pattern::Single(1),
            multicast_group: Pattern::Single(Ipv4Addr::new(225, 0, 0, 1)),
        }
    }

    /// Set the VNI distribution.
    pub fn vni(mut self, vni: Pattern<u32>) -> Self {
        self.vni = vni;
        self
    }

    /// Set the multicast group distribution.
    pub fn multicast_group(mut self, multicast_group: Pattern<Ipv4Addr>) -> Self {
        self.multicast_group = multicast_group;
        self
    }

    pub(crate) fn emit(&self, parent: &str, idx: usize, out: &mut Vec<Value>) {
        let xpath = format!("{parent}/vxlan[{idx}]");
        out.push(json!({
            "xpath": xpath,
            "name": self.name,
        }));
        self.vni.emit(&xpath, "vni", out);
        self.multicast_group.emit(&xpath, "ipv4Multicast", out);
    }
}
