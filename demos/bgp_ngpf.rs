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

//! Configure two back-to-back topology groups running iBGP with advertised routes, verify that
//! all sessions come up, run IPv4 traffic between them, and print the flow statistics.

use std::net::Ipv4Addr;

use uhd_lab::topology::{
    BgpPeer, DeviceGroup, Ethernet, Ipv4PrefixPool, Ipv4Stack, MacAddr, NetworkGroup, Pattern,
    Topology,
};
use uhd_lab::traffic::{EndpointRef, EndpointSet, FrameRate, TrafficItem, TrafficType};
use uhd_lab::{UhdLab, UhdLabError};

mod utils;

fn mac(s: &str) -> MacAddr {
    s.parse().unwrap()
}

fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

/// One side of the back-to-back BGP setup.
fn bgp_side(
    idx: usize,
    vport: &str,
    mac_start: &str,
    addr: &str,
    gateway: &str,
    routes: &str,
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
                            .gateway(Pattern::increment(ip(gateway), ip("0.0.0.0")))
                            .bgp_peer(
                                BgpPeer::new(format!("Bgp{idx}"))
                                    .dut_ip(Pattern::increment(ip(gateway), ip("0.0.0.0")))
                                    .local_as(Pattern::single(101u32)),
                            ),
                    ),
            )
            .network_group(
                NetworkGroup::new(format!("BGP-Routes{idx}"), 100).ipv4_prefix_pool(
                    Ipv4PrefixPool::new(1)
                        .network_address(Pattern::increment(ip(routes), ip("0.0.0.1")))
                        .prefix_length(Pattern::single(32u8)),
                ),
            ),
    )
}

#[tokio::main]
async fn main() -> Result<(), UhdLabError> {
    pretty_env_logger::init();

    // leave the session open for debugging; remove it with the manage-sessions demo.
    let mut lab = UhdLab::new("bgp-ngpf").force_ownership(true).keep_alive(true);

    lab.add_topology(bgp_side(
        1,
        "Port_1",
        "00:01:01:01:00:01",
        "1.1.1.1",
        "1.1.1.2",
        "10.10.0.1",
    ));
    lab.add_topology(bgp_side(
        2,
        "Port_2",
        "00:01:01:02:00:01",
        "1.1.1.2",
        "1.1.1.1",
        "20.20.0.1",
    ));

    let lab = lab.connect().await?;

    lab.start_protocols().await?;

    // wait until both BGP peers report all sessions up
    let peers = lab.bgp_peers().await?;
    lab.wait_sessions_up(&peers).await?;
    utils::verify_protocols(&lab).await?;

    let item = lab
        .create_traffic_item(
            &TrafficItem::new("BGP Traffic", TrafficType::Ipv4)
                .endpoint_set(EndpointSet::new(
                    EndpointRef::Topology("Topo1".to_string()),
                    EndpointRef::Topology("Topo2".to_string()),
                ))
                .frame_rate(FrameRate::PercentLineRate(50.0))
                .frame_size(128)
                .tracking(["flowGroup0"]),
        )
        .await?;

    lab.generate_traffic(&item).await?;
    lab.apply_traffic().await?;
    lab.start_traffic_blocking().await?;

    let flow_statistics = lab.stat_view("Flow Statistics").await?;
    utils::print_stat(&flow_statistics).await?;

    let _ = lab.disconnect().await?;
    Ok(())
}
