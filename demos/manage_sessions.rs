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

//! List all open sessions on the API server, and remove the ones left behind by earlier runs
//! (given by id on the command line).

use uhd_lab::config::CONFIG;
use uhd_lab::rest::RestClient;
use uhd_lab::session::UhdSession;
use uhd_lab::UhdLabError;

#[tokio::main]
async fn main() -> Result<(), UhdLabError> {
    pretty_env_logger::init();

    let mut rest = RestClient::connect(&CONFIG.server.addr, CONFIG.server.rest_port).await?;
    rest.authenticate(&CONFIG.server.username, &CONFIG.server.password)
        .await?;

    println!("Open sessions:");
    for session in UhdSession::list(&rest).await? {
        println!(
            "\t{} {} ({}, user {})",
            session.id, session.name, session.state, session.user_name
        );
    }

    // remove the session ids passed as arguments
    for arg in std::env::args().skip(1) {
        let id: u32 = arg.parse().expect("session ids are numeric");
        UhdSession::remove_by_id(&rest, id).await?;
        println!("Removed session {id}");
    }

    Ok(())
}
