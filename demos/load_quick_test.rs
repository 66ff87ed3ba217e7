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

//! Load a saved Quick Test configuration and run every RFC test in it, one after another. Each
//! test is monitored until it finishes; a failing test is logged and the run continues with
//! the next one. The CSV result files (and the PDF report, where supported) are copied to the
//! configured result folder with a timestamp, so reruns do not overwrite earlier results.

use uhd_lab::config::CONFIG;
use uhd_lab::quicktest::timestamp_now;
use uhd_lab::session::ApplicationType;
use uhd_lab::{UhdLab, UhdLabError};

mod utils;

const CONFIG_FILE: &str = "ngpfQuickTest2ports_8.50.ixncfg";

#[tokio::main]
async fn main() -> Result<(), UhdLabError> {
    pretty_env_logger::init();

    let lab = UhdLab::new("load-quick-test")
        .application_type(ApplicationType::Quicktest)
        .force_ownership(true);
    let mut lab = lab.connect().await?;

    lab.load_config(CONFIG_FILE).await?;
    lab.assign_ports().await?;

    lab.start_protocols().await?;
    utils::verify_protocols(&lab).await?;

    let results_folder = std::path::Path::new(&CONFIG.results.folder);
    tokio::fs::create_dir_all(results_folder).await?;

    for quick_test in lab.quick_tests().await? {
        log::info!("Executing Quick Test: {}", quick_test.test_id());

        quick_test.apply().await?;
        quick_test.start().await?;

        let mut monitor = quick_test.monitor();
        if let Err(e) = monitor.run().await {
            // a failed test aborts only this test; continue with the next one
            log::error!("Quick Test {} failed: {e}", quick_test.test_id());
            continue;
        }

        // timestamp the result files so earlier runs are preserved
        let timestamp = CONFIG.results.include_timestamp.then(timestamp_now);
        let files = quick_test
            .retrieve_csv_results(results_folder, timestamp.as_deref())
            .await?;
        log::info!(
            "Copied {} result files for {}",
            files.len(),
            quick_test.test_id()
        );

        // a PDF report is not supported for all RFC tests
        match quick_test
            .retrieve_report(results_folder, timestamp.as_deref())
            .await
        {
            Ok(path) => log::info!("Copied PDF report to {path:?}"),
            Err(e) => log::warn!("PDF for {} is not supported: {e}", quick_test.test_id()),
        }
    }

    let _ = lab.disconnect().await?;
    Ok(())
}
