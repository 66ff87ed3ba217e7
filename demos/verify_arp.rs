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

//! Attach to an existing session and verify IPv4/IPv6 gateway MAC resolution on all started
//! device groups, printing every address that failed ARP.

use uhd_lab::{UhdLab, UhdLabError};

const SESSION_ID: u32 = 17;

#[tokio::main]
async fn main() -> Result<(), UhdLabError> {
    pretty_env_logger::init();

    let lab = UhdLab::attach(SESSION_ID).await?;

    let failures = lab.verify_arp().await?;
    if failures.is_empty() {
        println!("ARP resolved on all started device groups");
    } else {
        println!("ARP failures:");
        for failure in failures {
            println!("\t{}: {}", failure.stack, failure.addresses.join(", "));
        }
    }

    Ok(())
}
