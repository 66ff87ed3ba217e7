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

use uhd_lab::stats::StatView;
use uhd_lab::UhdLabError;

/// Print a statistics view as a table.
#[allow(dead_code)]
pub async fn print_stat(view: &StatView) -> Result<(), UhdLabError> {
    let rows = view.rows().await?;
    println!("{}", view.caption());
    println!("{}", rows.fmt_table());
    Ok(())
}

/// Verify that all protocol sessions are started and up, and print the summary view.
#[allow(dead_code)]
pub async fn verify_protocols(lab: &uhd_lab::UhdLab<uhd_lab::Online>) -> Result<(), UhdLabError> {
    let summary = lab.stat_view("Protocols Summary").await?;
    summary
        .check_condition("Sessions Not Started", uhd_lab::stats::Comparator::Equal, 0)
        .await?;
    summary
        .check_condition("Sessions Down", uhd_lab::stats::Comparator::Equal, 0)
        .await?;
    print_stat(&summary).await
}
