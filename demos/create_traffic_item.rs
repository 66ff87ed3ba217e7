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

//! Build a raw traffic item with a hand-made packet header stack: Ethernet, VLAN, IPv4 with
//! DSCP, UDP, TCP and ICMP. Headers the appliance does not offer as protocol templates are
//! skipped with a log message.

use serde_json::json;
use uhd_lab::traffic::{
    self, EndpointRef, EndpointSet, FieldValue, FrameRate, TrafficItem, TrafficType,
    TransmissionControl,
};
use uhd_lab::{UhdLab, UhdLabError};

#[tokio::main]
async fn main() -> Result<(), UhdLabError> {
    pretty_env_logger::init();

    // leave the session open for debugging; remove it with the manage-sessions demo.
    let lab = UhdLab::new("create-traffic-item")
        .force_ownership(true)
        .keep_alive(true);
    let mut lab = lab.connect().await?;
    lab.create_ports().await?;

    let item = lab
        .create_traffic_item(
            &TrafficItem::new("Raw packet", TrafficType::Raw)
                .endpoint_set(EndpointSet::new(
                    EndpointRef::PortProtocols("Port_1".to_string()),
                    EndpointRef::PortProtocols("Port_2".to_string()),
                ))
                .frame_rate(FrameRate::PercentLineRate(50.0))
                .frame_size(128)
                .transmission(TransmissionControl::FixedFrameCount(10000))
                .tracking(["udpUdpSrcPrt0", "udpUdpDstPrt0"]),
        )
        .await?;

    let session = lab.session();

    // the Ethernet header exists by default; only its fields need to be set.
    let ethernet = traffic::find_stack(session, &item, "Ethernet II").await?;
    traffic::set_field(
        session,
        &ethernet,
        "Destination MAC Address",
        FieldValue::Increment {
            start: json!("00:0c:29:3a:8a:3a"),
            step: json!("00:00:00:00:00:00"),
            count: 1,
        },
    )
    .await?;
    traffic::set_field(
        session,
        &ethernet,
        "Source MAC Address",
        FieldValue::Increment {
            start: json!("00:0c:29:86:ba:0e"),
            step: json!("00:00:00:00:00:00"),
            count: 1,
        },
    )
    .await?;

    if let Some(vlan) = traffic::append_header(session, &item, "VLAN", "Ethernet II").await? {
        traffic::set_field(session, &vlan, "VLAN Priority", FieldValue::Single(json!(3)))
            .await?;
    }

    if let Some(ipv4) = traffic::append_header(session, &item, "IPv4", "VLAN").await? {
        traffic::set_field(
            session,
            &ipv4,
            "Source Address",
            FieldValue::Increment {
                start: json!("1.1.1.1"),
                step: json!("0.0.0.1"),
                count: 1,
            },
        )
        .await?;
        traffic::set_field(
            session,
            &ipv4,
            "Destination Address",
            FieldValue::List(vec![
                json!("1.1.1.2"),
                json!("1.1.1.3"),
                json!("1.1.1.4"),
                json!("1.1.1.5"),
            ]),
        )
        .await?;
        // TOS/precedence and the DSCP default PHB are either-or field choices
        traffic::set_field(
            session,
            &ipv4,
            "Precedence",
            FieldValue::Choice("011 Flash".to_string()),
        )
        .await?;
    }

    if let Some(udp) = traffic::append_header(session, &item, "UDP", "IPv4").await? {
        traffic::set_field(session, &udp, "UDP-Source-Port", FieldValue::Single(json!(1000)))
            .await?;
        traffic::set_field(session, &udp, "UDP-Dest-Port", FieldValue::Single(json!(1001)))
            .await?;
    }

    if let Some(tcp) = traffic::append_header(session, &item, "TCP", "IPv4").await? {
        traffic::set_field(
            session,
            &tcp,
            "TCP-Source-Port",
            FieldValue::List(vec![json!("1002"), json!("1005"), json!("1007")]),
        )
        .await?;
        traffic::set_field(session, &tcp, "TCP-Dest-Port", FieldValue::Single(json!(1003)))
            .await?;
    }

    // ICMP has no fields to edit; appending it is enough.
    let _ = traffic::append_header(session, &item, "ICMP Msg Type: 9", "IPv4").await?;

    let _ = lab.disconnect().await?;
    Ok(())
}
