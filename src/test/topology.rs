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

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::topology::{
    BgpPeer, DeviceGroup, Ethernet, Ipv4PrefixPool, Ipv4Stack, MacAddr, NetworkGroup, Pattern,
    Topology, Vxlan,
};
use crate::{port::PortError, UhdLab, UhdLabError};

fn mac(s: &str) -> MacAddr {
    s.parse().unwrap()
}

fn ip(s: &str) -> std::net::Ipv4Addr {
    s.parse().unwrap()
}

/// The two-port BGP demo topology (one side).
fn bgp_topology() -> Topology {
    Topology::new("Topo1", ["Port_1"]).device_group(
        DeviceGroup::new("DG1", 1)
            .ethernet(
                Ethernet::new("Eth1")
                    .mac(Pattern::increment(
                        mac("00:01:01:01:00:01"),
                        mac("00:00:00:00:00:01"),
                    ))
                    .vlan(Pattern::single(103u16))
                    .ipv4(
                        Ipv4Stack::new("Ipv4")
                            .address(Pattern::increment(ip("1.1.1.1"), ip("0.0.0.1")))
                            .gateway(Pattern::increment(ip("1.1.1.2"), ip("0.0.0.0")))
                            .prefix(Pattern::single(24u8))
                            .bgp_peer(
                                BgpPeer::new("Bgp1")
                                    .dut_ip(Pattern::increment(ip("1.1.1.2"), ip("0.0.0.0")))
                                    .local_as(Pattern::single(101u32)),
                            ),
                    ),
            )
            .network_group(
                NetworkGroup::new("BGP-Routes1", 100).ipv4_prefix_pool(
                    Ipv4PrefixPool::new(1)
                        .network_address(Pattern::increment(ip("10.10.0.1"), ip("0.0.0.1")))
                        .prefix_length(Pattern::single(32u8)),
                ),
            ),
    )
}

/// The VXLAN demo topology (one side), including the nested device group behind the tunnel.
fn vxlan_topology() -> Topology {
    Topology::new("Topo2", ["Port_2"]).device_group(
        DeviceGroup::new("DG2", 1)
            .ethernet(
                Ethernet::new("Eth2")
                    .mac(Pattern::single(mac("00:01:01:02:00:01")))
                    .ipv4(
                        Ipv4Stack::new("VxLAN-IPv4")
                            .address(Pattern::single(ip("100.1.1.1")))
                            .gateway(Pattern::single(ip("100.1.3.1")))
                            .prefix(Pattern::single(16u8))
                            .resolve_gateway(true)
                            .vxlan(
                                Vxlan::new("VxLAN-1")
                                    .vni(Pattern::increment(1008u32, 2u32))
                                    .multicast_group(Pattern::increment(
                                        ip("225.8.0.1"),
                                        ip("0.0.0.1"),
                                    )),
                            ),
                    ),
            )
            .device_group(
                DeviceGroup::new("VxLAN-DG", 1).ethernet(
                    Ethernet::new("VxLAN-Ethernet")
                        .mac(Pattern::single(mac("00:01:11:00:00:01")))
                        .vlan(Pattern::single(101u16)),
                ),
            ),
    )
}

#[test]
fn vport_import() {
    let lab = UhdLab::new("test");
    assert_eq!(
        lab.generate_vport_import(),
        json!([
            { "xpath": "/vport[1]", "name": "Port_1" },
            { "xpath": "/vport[2]", "name": "Port_2" },
        ])
    );
}

#[test]
fn bgp_topology_import() {
    let mut lab = UhdLab::new("test");
    lab.add_topology(bgp_topology());
    let import = lab.generate_topology_import().unwrap();
    let expected: Value =
        serde_json::from_str(include_str!("files/bgp_topology.json")).unwrap();
    assert_eq!(import, expected);
}

#[test]
fn vxlan_topology_import() {
    let mut lab = UhdLab::new("test");
    lab.add_topology(vxlan_topology());
    let import = lab.generate_topology_import().unwrap();
    let expected: Value =
        serde_json::from_str(include_str!("files/vxlan_topology.json")).unwrap();
    assert_eq!(import, expected);
}

#[test]
fn unknown_vport_is_rejected() {
    let mut lab = UhdLab::new("test");
    lab.add_topology(Topology::new("Topo1", ["Port_9"]));
    match lab.generate_topology_import() {
        Err(UhdLabError::Port(PortError::UnknownVport(name))) => assert_eq!(name, "Port_9"),
        x => panic!("expected UnknownVport, got {:?}", x.map(|_| ())),
    }
}

#[test]
fn mac_addr_roundtrip() {
    let mac: MacAddr = "00:0c:29:3a:8A:3a".parse().unwrap();
    assert_eq!(mac, MacAddr([0x00, 0x0c, 0x29, 0x3a, 0x8a, 0x3a]));
    assert_eq!(mac.to_string(), "00:0c:29:3a:8a:3a");
    assert!("00:0c:29:3a:8a".parse::<MacAddr>().is_err());
    assert!("hello".parse::<MacAddr>().is_err());
}

#[test]
fn prefix_pool_from_network() {
    let pool = Ipv4PrefixPool::new(1).network("10.10.0.0/16".parse().unwrap());
    let mut out = Vec::new();
    pool.emit("/topology[1]/deviceGroup[1]/networkGroup[1]", 1, &mut out);
    assert_eq!(
        out,
        vec![
            json!({
                "xpath": "/topology[1]/deviceGroup[1]/networkGroup[1]/ipv4PrefixPools[1]",
                "numberOfAddresses": 1,
            }),
            json!({
                "xpath": "/topology[1]/deviceGroup[1]/networkGroup[1]/ipv4PrefixPools[1]/networkAddress/singleValue",
                "value": "10.10.0.0",
            }),
            json!({
                "xpath": "/topology[1]/deviceGroup[1]/networkGroup[1]/ipv4PrefixPools[1]/prefixLength/singleValue",
                "value": "16",
            }),
        ]
    );
}

#[test]
fn value_list_pattern() {
    let mut out = Vec::new();
    Pattern::<u16>::values([1, 2, 3]).emit("/x[1]", "attr", &mut out);
    assert_eq!(
        out,
        vec![json!({ "xpath": "/x[1]/attr/valueList", "values": ["1", "2", "3"] })]
    );
}
