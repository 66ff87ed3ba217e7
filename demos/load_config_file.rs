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

//! Load a saved binary configuration file, re-wire its topologies onto the lab's ports, start
//! protocols, run the traffic items of the configuration, and print their statistics.

use serde_json::json;
use uhd_lab::{UhdLab, UhdLabError};

mod utils;

const CONFIG_FILE: &str = "ospf.ixncfg";

#[tokio::main]
async fn main() -> Result<(), UhdLabError> {
    pretty_env_logger::init();

    let lab = UhdLab::new("load-config-file").force_ownership(true);
    let mut lab = lab.connect().await?;

    lab.load_config(CONFIG_FILE).await?;
    lab.assign_ports().await?;

    // spread the loaded topologies over the assigned vports: odd vports on the first
    // topology, even vports on the second.
    let vport_xpaths: Vec<String> = (1..=lab.vports().len())
        .map(|i| format!("/vport[{i}]"))
        .collect();
    let rewire = json!([
        { "xpath": "/topology[1]", "vports": vport_xpaths.iter().step_by(2).collect::<Vec<_>>() },
        { "xpath": "/topology[2]", "vports": vport_xpaths.iter().skip(1).step_by(2).collect::<Vec<_>>() },
    ]);
    lab.import_json(&rewire, false).await?;

    lab.start_protocols().await?;
    utils::verify_protocols(&lab).await?;

    // run the traffic items that came with the configuration file
    let item = lab
        .traffic_items()
        .await?
        .into_iter()
        .next()
        .expect("the configuration file contains no traffic item");

    lab.generate_traffic(&item).await?;
    lab.apply_traffic().await?;
    lab.start_traffic_blocking().await?;

    let traffic_stats = lab.stat_view("Traffic Item Statistics").await?;
    utils::print_stat(&traffic_stats).await?;

    let rows = traffic_stats.rows().await?;
    log::info!(
        "Traffic Item Stats: TxFrames: {}  RxFrames: {}",
        rows.single("Tx Frames")?,
        rows.single("Rx Frames")?,
    );

    lab.stop_traffic_blocking().await?;

    let _ = lab.disconnect().await?;
    Ok(())
}
