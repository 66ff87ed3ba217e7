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

//! Configure two back-to-back VXLAN topology groups (VTEPs with a device group behind each
//! tunnel), verify protocols, and run a fixed burst of IPv4 traffic between them.

use std::net::Ipv4Addr;

use uhd_lab::topology::{DeviceGroup, Ethernet, Ipv4Stack, MacAddr, Pattern, Topology, Vxlan};
use uhd_lab::traffic::{
    EndpointRef, EndpointSet, FrameRate, TrafficItem, TrafficType, TransmissionControl,
};
use uhd_lab::{UhdLab, UhdLabError};

mod utils;

fn mac(s: &str) -> MacAddr {
    s.parse().unwrap()
}

fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

/// One side of the back-to-back VXLAN setup: the outer IPv4 stack carries the tunnel, and a
/// nested device group simulates the hosts behind the VTEP.
#[allow(clippy::too_many_arguments)]
fn vxlan_side(
    idx: usize,
    vport: &str,
    mac_start: &str,
    addr: &str,
    gateway: &str,
    vni_step: u32,
    inner_mac: &str,
    inner_addr: &str,
    inner_gateway: &str,
) -> Topology {
    Topology::new(format!("Topo{idx}"), [vport]).device_group(
        DeviceGroup::new(format!("DG{idx}"), 1)
            .ethernet(
                Ethernet::new(format!("Eth{idx}"))
                    .mac(Pattern::increment(mac(mac_start), mac("00:00:00:00:00:01")))
                    .vlan(Pattern::single(103u16))
                    .ipv4(
                        Ipv4Stack::new(format!("Ipv4-{idx}"))
                            .address(Pattern::increment(ip(addr), ip("0.0.0.1")))
                            .gateway(Pattern::increment(ip(gateway), ip("0.0.0.1")))
                            .prefix(Pattern::single(16u8))
                            .vxlan(
                                Vxlan::new(format!("VxLAN-{idx}"))
                                    .vni(Pattern::increment(1008u32, vni_step))
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
                        .mac(Pattern::increment(mac(inner_mac), mac("00:00:00:00:00:01")))
                        .vlan(Pattern::single(101u16))
                        .ipv4(
                            Ipv4Stack::new(format!("VxLAN-IPv4-{idx}"))
                                .address(Pattern::single(ip(inner_addr)))
                                .gateway(Pattern::single(ip(inner_gateway)))
                                .prefix(Pattern::single(16u8))
                                .resolve_gateway(true),
                        ),
                ),
            ),
    )
}

#[tokio::main]
async fn main() -> Result<(), UhdLabError> {
    pretty_env_logger::init();

    let mut lab = UhdLab::new("vxlan-ngpf").force_ownership(true);

    lab.add_topology(vxlan_side(
        1,
        "Port_1",
        "00:01:01:01:00:01",
        "100.1.1.1",
        "100.1.3.1",
        2,
        "00:01:11:00:00:01",
        "10.1.1.1",
        "10.1.3.1",
    ));
    lab.add_topology(vxlan_side(
        2,
        "Port_2",
        "00:01:01:02:00:01",
        "100.1.3.1",
        "100.1.1.1",
        1,
        "00:01:22:00:00:01",
        "10.1.3.1",
        "10.1.1.1",
    ));

    let lab = lab.connect().await?;

    lab.start_protocols().await?;
    utils::verify_protocols(&lab).await?;

    let item = lab
        .create_traffic_item(
            &TrafficItem::new("VxLAN traffic", TrafficType::Ipv4)
                .endpoint_set(EndpointSet::new(
                    EndpointRef::Topology("Topo1".to_string()),
                    EndpointRef::Topology("Topo2".to_string()),
                ))
                .frame_rate(FrameRate::PercentLineRate(50.0))
                .frame_size(128)
                .transmission(TransmissionControl::FixedFrameCount(10000))
                .tracking(["flowGroup0"]),
        )
        .await?;

    lab.generate_traffic(&item).await?;
    lab.apply_traffic().await?;
    lab.start_traffic().await?;

    let flow_statistics = lab.stat_view("Flow Statistics").await?;
    utils::print_stat(&flow_statistics).await?;

    let _ = lab.disconnect().await?;
    Ok(())
}
