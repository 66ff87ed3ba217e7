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

//! Connect to an existing session without touching its configuration.

use uhd_lab::{UhdLab, UhdLabError};

const SESSION_ID: u32 = 1;

#[tokio::main]
async fn main() -> Result<(), UhdLabError> {
    pretty_env_logger::init();

    let lab = UhdLab::attach(SESSION_ID).await?;
    println!(
        "Connected to Session ID {} - Session Name {}",
        lab.session().info().id,
        lab.session().info().name
    );
    println!("Assigned vports:");
    for vport in lab.vports() {
        println!(
            "\t{} -> {} ({})",
            vport.name,
            vport.assigned_to.as_deref().unwrap_or("<unassigned>"),
            vport.state
        );
    }

    Ok(())
}
