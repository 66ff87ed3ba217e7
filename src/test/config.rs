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

use crate::config::{PortLocation, CONFIG};

#[test]
fn test_config_is_loaded() {
    assert_eq!(CONFIG.server.addr, "10.36.79.101");
    assert_eq!(CONFIG.server.rest_port, 443);
    assert_eq!(CONFIG.server.username, "admin");
    assert!(!CONFIG.server.verify_tls);
    assert_eq!(
        CONFIG.ports.locations,
        vec![
            PortLocation::new("localuhd/1").unwrap(),
            PortLocation::new("localuhd/2").unwrap(),
        ]
    );
    assert_eq!(CONFIG.timing.protocol_timeout, 60);
    assert_eq!(CONFIG.timing.progress_interval, 10);
    assert!(CONFIG.results.include_timestamp);
}

#[test]
fn port_locations() {
    let loc = PortLocation::new("localuhd/1").unwrap();
    assert_eq!(loc.chassis, "localuhd");
    assert_eq!(loc.card, None);
    assert_eq!(loc.port, 1);
    assert_eq!(loc.to_string(), "localuhd/1");

    let loc: PortLocation = "10.36.79.53/2/15".parse().unwrap();
    assert_eq!(loc.chassis, "10.36.79.53");
    assert_eq!(loc.card, Some(2));
    assert_eq!(loc.port, 15);
    assert_eq!(loc.to_string(), "10.36.79.53/2/15");

    assert!(PortLocation::new("localuhd").is_err());
    assert!(PortLocation::new("localuhd/a").is_err());
    assert!(PortLocation::new("chassis/1/2/3").is_err());
}
