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

//! Load a JSON configuration file, patch it through an xpath-targeted import, start protocols,
//! and run the loaded traffic.

use serde_json::json;
use uhd_lab::{UhdLab, UhdLabError};

mod utils;

const JSON_CONFIG_FILE: &str = "bgp_ngpf_8.50.json";

#[tokio::main]
async fn main() -> Result<(), UhdLabError> {
    pretty_env_logger::init();

    let lab = UhdLab::new("load-json-config-file").force_ownership(true);
    let mut lab = lab.connect().await?;

    lab.load_json_config(JSON_CONFIG_FILE).await?;
    lab.assign_ports().await?;

    // example of modifying a loaded config using an xpath-targeted import
    lab.import_json(
        &json!([{ "xpath": "/traffic/trafficItem[1]", "name": "Modified Traffic" }]),
        false,
    )
    .await?;

    lab.start_protocols().await?;
    utils::verify_protocols(&lab).await?;

    let item = lab
        .traffic_items()
        .await?
        .into_iter()
        .next()
        .expect("the configuration file contains no traffic item");

    lab.generate_traffic(&item).await?;
    lab.apply_traffic().await?;
    lab.start_traffic_blocking().await?;

    let flow_statistics = lab.stat_view("Flow Statistics").await?;
    utils::print_stat(&flow_statistics).await?;

    lab.stop_traffic_blocking().await?;

    let _ = lab.disconnect().await?;
    Ok(())
}
