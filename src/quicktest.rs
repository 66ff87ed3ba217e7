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

//! Module for running Quick Tests and monitoring their progress.
//!
//! A Quick Test is a long-running, hardware-driven RFC benchmark (RFC 2544 throughput, frame
//! loss, back-to-back) executed entirely on the appliance. The client can only observe it
//! through a narrow read-only status surface: the current action label, an is-running flag,
//! and a free-text progress string. [`QuickTestMonitor`] turns that surface into a terminal
//! verdict by driving a small state machine:
//!
//! ```text
//!  Initializing ──> Applying ──> Running ──> Completed
//!       │               │           │
//!       └── stuck       ├── stuck   ├── no trial stats
//!                       └── ended   └── never started
//!                           early
//! ```
//!
//! Every phase has a bounded retry budget; exhausting a budget is a fatal error returned as a
//! [`QuickTestError`]. The monitor never unwinds for control flow: callers iterate over
//! multiple tests and simply continue with the next one on failure.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    config::CONFIG,
    rest::{href_of, RestError},
    session::UhdSession,
};

/// The CSV result files a finished Quick Test leaves in its result folder.
const CSV_RESULT_FILES: [&str; 4] = [
    "AggregateResults.csv",
    "iteration.csv",
    "results.csv",
    "logFile.txt",
];

lazy_static! {
    /// Progress strings of a running trial look like `Trial 1/3 Frame size 128...`.
    static ref TRIAL_RE: Regex = Regex::new(r"^Trial.*").unwrap();
}

/// The action a Quick Test is currently performing, validated at the boundary.
///
/// The appliance reports this as a free-text label. All labels relevant to monitoring are
/// closed variants; anything else is kept as [`CurrentAction::Other`] and logged once at parse
/// time, so a new appliance vocabulary shows up in the logs instead of silently looping (the
/// phase budgets still bound the wait).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrentAction {
    /// No action was reported yet. This is the canonical form of both the missing-value
    /// sentinel and the literal string `"None"` the appliance mixes freely.
    NotStarted,
    InitializingTest,
    ApplyFlowGroups,
    SetupStatisticsCollection,
    TransmittingFrames,
    TransmittingComplete,
    WaitingForStats,
    CollectingStats,
    TestEnded,
    /// Any label outside the known vocabulary.
    Other(String),
}

impl CurrentAction {
    /// Parse an action label. `None`, the empty string, and the literal `"None"` all map to
    /// [`CurrentAction::NotStarted`].
    pub fn parse(label: Option<&str>) -> Self {
        match label {
            None | Some("") | Some("None") => CurrentAction::NotStarted,
            Some("InitializingTest") => CurrentAction::InitializingTest,
            Some("ApplyFlowGroups") => CurrentAction::ApplyFlowGroups,
            Some("SetupStatisticsCollection") => CurrentAction::SetupStatisticsCollection,
            Some("TransmittingFrames") => CurrentAction::TransmittingFrames,
            Some("TransmittingComplete") => CurrentAction::TransmittingComplete,
            Some("WaitingForStats") => CurrentAction::WaitingForStats,
            Some("CollectingStats") => CurrentAction::CollectingStats,
            Some("TestEnded") => CurrentAction::TestEnded,
            Some(x) => {
                log::warn!("[quicktest] unrecognized current action: {x}");
                CurrentAction::Other(x.to_string())
            }
        }
    }

    /// Whether this action means the test has left the apply phase and is actually running.
    pub fn is_running_action(&self) -> bool {
        matches!(
            self,
            CurrentAction::TransmittingFrames
                | CurrentAction::TransmittingComplete
                | CurrentAction::WaitingForStats
                | CurrentAction::CollectingStats
                | CurrentAction::TestEnded
        )
    }
}

impl fmt::Display for CurrentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurrentAction::NotStarted => write!(f, "None"),
            CurrentAction::InitializingTest => write!(f, "InitializingTest"),
            CurrentAction::ApplyFlowGroups => write!(f, "ApplyFlowGroups"),
            CurrentAction::SetupStatisticsCollection => write!(f, "SetupStatisticsCollection"),
            CurrentAction::TransmittingFrames => write!(f, "TransmittingFrames"),
            CurrentAction::TransmittingComplete => write!(f, "TransmittingComplete"),
            CurrentAction::WaitingForStats => write!(f, "WaitingForStats"),
            CurrentAction::CollectingStats => write!(f, "CollectingStats"),
            CurrentAction::TestEnded => write!(f, "TestEnded"),
            CurrentAction::Other(x) => write!(f, "{x}"),
        }
    }
}

/// The read-only status surface of a remote Quick Test.
///
/// [`QuickTestHandle`] implements this against the live appliance; tests implement it with a
/// scripted mock. All methods may fail transiently (the API server drops connections under
/// load); the monitor retries them with a bounded budget.
#[async_trait]
pub trait QuickTestSource: Send + Sync {
    /// The labels of all current actions, oldest first. The monitor looks at the last one.
    async fn current_actions(&self) -> Result<Vec<String>, RestError>;
    /// Whether the test is currently running.
    async fn is_running(&self) -> Result<bool, RestError>;
    /// The free-text progress line (e.g. `Trial 1/3 ...`).
    async fn progress(&self) -> Result<String, RestError>;
    /// The free-text result status, used for diagnostics in error messages.
    async fn status(&self) -> Result<String, RestError>;
}

/// Retry budgets and intervals of the [`QuickTestMonitor`].
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Polls to wait for the first current action (initialization phase).
    pub init_retries: usize,
    /// Polls to wait for the test to leave the apply phase.
    pub apply_retries: usize,
    /// Polls to wait for the test to start running at all.
    pub startup_retries: usize,
    /// Consecutive polls without trial progress before the running phase counts as stalled.
    pub progress_retries: usize,
    /// Transient connection failures tolerated over the whole monitoring run.
    pub connect_retries: usize,
    /// Base interval between two polls.
    pub poll_interval: Duration,
    /// Interval between two progress queries once trials are running.
    pub progress_interval: Duration,
    /// Backoff after a transient connection failure.
    pub connect_backoff: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            init_retries: 30,
            apply_retries: 120,
            startup_retries: 40,
            progress_retries: 40,
            connect_retries: 10,
            poll_interval: Duration::from_secs(1),
            progress_interval: Duration::from_secs(10),
            connect_backoff: Duration::from_secs(3),
        }
    }
}

/// Local, ephemeral counters of one monitoring run.
#[derive(Debug, Default)]
struct PollState {
    /// Polls spent waiting for the test to start running.
    startup: usize,
    /// Consecutive polls without trial progress while the test was running.
    progress_stall: usize,
    /// Transient connection failures so far.
    connection_failures: usize,
    /// Whether trial progress was observed at least once.
    trial_seen: bool,
}

/// Monitors one remote Quick Test until it finishes, per the state machine described in the
/// [module documentation](self).
///
/// A monitor is created per test and runs on a single control task; all waits are awaited
/// sleeps. Once [`QuickTestMonitor::run`] returned success, further calls return success
/// immediately without polling again.
pub struct QuickTestMonitor<'a, S: QuickTestSource + ?Sized> {
    source: &'a S,
    settings: MonitorSettings,
    state: PollState,
    completed: bool,
}

impl<'a, S: QuickTestSource + ?Sized> QuickTestMonitor<'a, S> {
    /// Create a monitor with default settings.
    pub fn new(source: &'a S) -> Self {
        Self::with_settings(source, MonitorSettings::default())
    }

    /// Create a monitor with explicit settings.
    pub fn with_settings(source: &'a S, settings: MonitorSettings) -> Self {
        Self {
            source,
            settings,
            state: PollState::default(),
            completed: false,
        }
    }

    /// Observe the test until it finishes. Returns `Ok(())` once the test was seen running and
    /// subsequently stopped; any exhausted retry budget is a fatal error.
    pub async fn run(&mut self) -> Result<(), QuickTestError> {
        if self.completed {
            log::debug!("[quicktest] test already observed complete");
            return Ok(());
        }
        self.state = PollState::default();

        self.wait_initialized().await?;
        self.wait_applied().await?;
        self.wait_finished().await?;

        self.completed = true;
        Ok(())
    }

    /// Initialization phase: wait until the test reports its first action.
    async fn wait_initialized(&mut self) -> Result<(), QuickTestError> {
        for timer in 1..=self.settings.init_retries {
            let action = self.fetch_action().await?;
            log::debug!("[quicktest] initialization: current action {action}");

            match action {
                CurrentAction::TestEnded => {
                    return Err(QuickTestError::EndedPrematurely(self.status_for_error().await))
                }
                CurrentAction::NotStarted => {
                    if timer == self.settings.init_retries {
                        return Err(QuickTestError::InitializationStuck(
                            self.settings.init_retries,
                        ));
                    }
                    log::info!(
                        "[quicktest] no current action yet, waiting {timer}/{} seconds",
                        self.settings.init_retries
                    );
                    tokio::time::sleep(self.settings.poll_interval).await;
                }
                _ => return Ok(()),
            }
        }
        Err(QuickTestError::InitializationStuck(self.settings.init_retries))
    }

    /// Apply phase: wait until the current action is one of the running actions. Seeing
    /// `TestEnded` here means the test ended before it ever ran.
    async fn wait_applied(&mut self) -> Result<(), QuickTestError> {
        let mut last_action = CurrentAction::NotStarted;
        for counter in 1..=self.settings.apply_retries {
            let action = self.fetch_action().await?;
            log::info!(
                "[quicktest] applying: current action {action}, expecting TransmittingFrames ({counter}/{})",
                self.settings.apply_retries
            );

            if action == CurrentAction::TestEnded {
                return Err(QuickTestError::EndedPrematurely(self.status_for_error().await));
            }
            if action.is_running_action() {
                log::info!("[quicktest] done applying configuration, frames are transmitting");
                return Ok(());
            }

            last_action = action;
            if counter < self.settings.apply_retries {
                tokio::time::sleep(self.settings.poll_interval).await;
            }
        }
        if last_action == CurrentAction::ApplyFlowGroups {
            log::error!(
                "[quicktest] stuck on ApplyFlowGroups. The session must be force-quit on the appliance."
            );
        }
        Err(QuickTestError::ApplyStuck {
            last_action,
            polls: self.settings.apply_retries,
        })
    }

    /// Running phase: poll the is-running flag. While running, trial progress must show up
    /// within the stall budget; once trials were seen, poll at the longer progress interval
    /// until the test stops. A test that never starts running is fatal after the startup
    /// budget.
    async fn wait_finished(&mut self) -> Result<(), QuickTestError> {
        loop {
            let (is_running, progress) = self.fetch_running_progress().await?;
            log::info!("[quicktest] running: {is_running}, progress: {progress}");

            if is_running {
                if TRIAL_RE.is_match(&progress) {
                    // the test is running fine. Keep polling until it stops.
                    self.state.trial_seen = true;
                    self.state.progress_stall = 0;
                    tokio::time::sleep(self.settings.progress_interval).await;
                } else {
                    if self.state.progress_stall == self.settings.progress_retries {
                        return Err(QuickTestError::RunningStalled(
                            self.settings.progress_retries,
                        ));
                    }
                    log::info!(
                        "[quicktest] waiting for trial runs {}/{} seconds",
                        self.state.progress_stall,
                        self.settings.progress_retries
                    );
                    self.state.progress_stall += 1;
                    tokio::time::sleep(self.settings.poll_interval).await;
                }
            } else {
                if self.state.trial_seen {
                    // only a stop after traffic ran counts as completion.
                    log::info!("[quicktest] test ran and is complete");
                    return Ok(());
                }
                if self.state.startup == self.settings.startup_retries {
                    return Err(QuickTestError::StartupStalled(self.status_for_error().await));
                }
                log::info!(
                    "[quicktest] test did not run yet, waiting {}/{} seconds",
                    self.state.startup,
                    self.settings.startup_retries
                );
                self.state.startup += 1;
                tokio::time::sleep(self.settings.poll_interval).await;
            }
        }
    }

    /// Fetch the most recent current action, retrying transient failures.
    async fn fetch_action(&mut self) -> Result<CurrentAction, QuickTestError> {
        loop {
            match self.source.current_actions().await {
                Ok(actions) => {
                    return Ok(CurrentAction::parse(actions.last().map(String::as_str)))
                }
                Err(e) => self.transient_failure(e).await?,
            }
        }
    }

    /// Fetch the is-running flag and the progress line, retrying transient failures.
    async fn fetch_running_progress(&mut self) -> Result<(bool, String), QuickTestError> {
        loop {
            let result = async {
                let is_running = self.source.is_running().await?;
                let progress = self.source.progress().await?;
                Ok::<_, RestError>((is_running, progress))
            }
            .await;
            match result {
                Ok(x) => return Ok(x),
                Err(e) => self.transient_failure(e).await?,
            }
        }
    }

    /// Account one transient failure. Returns an error once the budget is exhausted,
    /// otherwise sleeps for the backoff interval.
    async fn transient_failure(&mut self, error: RestError) -> Result<(), QuickTestError> {
        log::debug!(
            "[quicktest] failed to query the API server {}/{} times: {error}",
            self.state.connection_failures,
            self.settings.connect_retries
        );
        if self.state.connection_failures == self.settings.connect_retries {
            return Err(QuickTestError::ConnectionLost {
                attempts: self.settings.connect_retries,
                source: error,
            });
        }
        self.state.connection_failures += 1;
        tokio::time::sleep(self.settings.connect_backoff).await;
        Ok(())
    }

    /// Best-effort status string for error messages.
    async fn status_for_error(&self) -> String {
        self.source
            .status()
            .await
            .unwrap_or_else(|_| "<status unavailable>".to_string())
    }
}

/// The RFC benchmark type of a Quick Test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RfcTest {
    Rfc2544Throughput,
    Rfc2544FrameLoss,
    Rfc2544Back2Back,
}

impl RfcTest {
    /// All known RFC test types.
    pub const ALL: [RfcTest; 3] = [
        RfcTest::Rfc2544Throughput,
        RfcTest::Rfc2544FrameLoss,
        RfcTest::Rfc2544Back2Back,
    ];

    /// The node name of this test type in the configuration tree.
    fn node(&self) -> &'static str {
        match self {
            RfcTest::Rfc2544Throughput => "rfc2544throughput",
            RfcTest::Rfc2544FrameLoss => "rfc2544frameLoss",
            RfcTest::Rfc2544Back2Back => "rfc2544back2back",
        }
    }
}

impl fmt::Display for RfcTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.node())
    }
}

/// A Quick Test present in the loaded configuration.
#[derive(Debug, Clone)]
pub struct QuickTestHandle {
    session: UhdSession,
    /// The appliance href of the test.
    pub href: String,
    /// Name of the test.
    pub name: String,
    /// The RFC benchmark type.
    pub rfc: RfcTest,
}

impl QuickTestHandle {
    /// Find all Quick Tests of all known RFC types in the current configuration.
    pub async fn find_all(session: &UhdSession) -> Result<Vec<Self>, QuickTestError> {
        let mut result = Vec::new();
        for rfc in RfcTest::ALL {
            let path = session.href(format!("quickTest/{}", rfc.node()));
            let tests: Vec<Value> = match session.rest().get(&path).await {
                Ok(tests) => tests,
                Err(e) if e.status() == Some(reqwest::StatusCode::NOT_FOUND) => continue,
                Err(e) => return Err(e.into()),
            };
            for test in tests {
                result.push(Self {
                    session: session.clone(),
                    href: href_of(&test)
                        .ok_or(RestError::UnexpectedPayload("quickTest without href"))?,
                    name: test
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    rfc,
                });
            }
        }
        Ok(result)
    }

    /// The identifier used to prefix result files: `{rfc}_{name}`.
    pub fn test_id(&self) -> String {
        format!("{}_{}", self.rfc, self.name)
    }

    /// Apply the test configuration to the hardware.
    pub async fn apply(&self) -> Result<(), QuickTestError> {
        log::debug!("[quicktest] apply {}", self.test_id());
        self.session
            .rest()
            .execute(
                format!("{}/operations/apply", self.href),
                &json!({ "arg1": self.href }),
            )
            .await?;
        Ok(())
    }

    /// Start the test.
    pub async fn start(&self) -> Result<(), QuickTestError> {
        log::debug!("[quicktest] start {}", self.test_id());
        self.session
            .rest()
            .execute(
                format!("{}/operations/start", self.href),
                &json!({ "arg1": self.href }),
            )
            .await?;
        Ok(())
    }

    /// Stop the test.
    pub async fn stop(&self) -> Result<(), QuickTestError> {
        log::debug!("[quicktest] stop {}", self.test_id());
        self.session
            .rest()
            .execute(
                format!("{}/operations/stop", self.href),
                &json!({ "arg1": self.href }),
            )
            .await?;
        Ok(())
    }

    /// Remove the test from the configuration.
    pub async fn remove(self) -> Result<(), QuickTestError> {
        self.session.rest().delete(&self.href).await?;
        Ok(())
    }

    /// Create a monitor for this test, with the progress interval taken from the
    /// configuration.
    pub fn monitor(&self) -> QuickTestMonitor<'_, Self> {
        QuickTestMonitor::with_settings(
            self,
            MonitorSettings {
                progress_interval: Duration::from_secs(CONFIG.timing.progress_interval),
                ..Default::default()
            },
        )
    }

    /// The folder on the appliance where this test stores its result files.
    pub async fn results_path(&self) -> Result<String, QuickTestError> {
        let results: Value = self
            .session
            .rest()
            .get(format!("{}/results", self.href))
            .await?;
        Ok(results
            .get("resultPath")
            .and_then(Value::as_str)
            .ok_or(RestError::UnexpectedPayload("results without resultPath"))?
            .to_string())
    }

    /// Generate the PDF report of a finished test and return its path on the appliance. Not
    /// all RFC tests support this; the caller is expected to warn and continue on error.
    pub async fn generate_report(&self) -> Result<String, QuickTestError> {
        let result = self
            .session
            .rest()
            .execute(
                format!("{}/operations/generatereport", self.href),
                &json!({ "arg1": self.href }),
            )
            .await?;
        Ok(result
            .get("result")
            .and_then(Value::as_str)
            .ok_or(RestError::UnexpectedPayload("generatereport without result"))?
            .to_string())
    }

    /// Download the CSV result files of a finished test into `dest`. Every file is fetched
    /// exactly once; individual files that the appliance does not provide are logged and
    /// skipped. Returns the local paths of the downloaded files.
    pub async fn retrieve_csv_results(
        &self,
        dest: impl AsRef<Path>,
        timestamp: Option<&str>,
    ) -> Result<Vec<PathBuf>, QuickTestError> {
        let results_path = self.results_path().await?;
        log::info!("[quicktest] result files at {results_path}");

        let mut downloaded = Vec::new();
        for file in CSV_RESULT_FILES {
            let remote = format!("{results_path}/{file}");
            let local = dest
                .as_ref()
                .join(result_filename(&self.test_id(), file, timestamp));
            log::info!("[quicktest] copying {remote} -> {local:?}");
            match self.session.rest().download_file(&remote, &local).await {
                Ok(()) => downloaded.push(local),
                Err(e) => log::warn!("[quicktest] cannot copy {remote}: {e}"),
            }
        }
        Ok(downloaded)
    }

    /// Download the PDF report into `dest`, naming it like the CSV results.
    pub async fn retrieve_report(
        &self,
        dest: impl AsRef<Path>,
        timestamp: Option<&str>,
    ) -> Result<PathBuf, QuickTestError> {
        let remote = self.generate_report().await?;
        let filename = remote
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(remote.as_str())
            .to_string();
        let local = dest
            .as_ref()
            .join(result_filename(&self.test_id(), &filename, timestamp));
        log::info!("[quicktest] copying PDF report {remote} -> {local:?}");
        self.session.rest().download_file(&remote, &local).await?;
        Ok(local)
    }
}

#[async_trait]
impl QuickTestSource for QuickTestHandle {
    async fn current_actions(&self) -> Result<Vec<String>, RestError> {
        let results: Value = self
            .session
            .rest()
            .get(format!("{}/results", self.href))
            .await?;
        Ok(results
            .get("currentActions")
            .and_then(Value::as_array)
            .map(|actions| {
                actions
                    .iter()
                    .filter_map(|a| a.get("arg2").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn is_running(&self) -> Result<bool, RestError> {
        let results: Value = self
            .session
            .rest()
            .get(format!("{}/results", self.href))
            .await?;
        Ok(results
            .get("isRunning")
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    async fn progress(&self) -> Result<String, RestError> {
        let results: Value = self
            .session
            .rest()
            .get(format!("{}/results", self.href))
            .await?;
        Ok(results
            .get("progress")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    async fn status(&self) -> Result<String, RestError> {
        let results: Value = self
            .session
            .rest()
            .get(format!("{}/results", self.href))
            .await?;
        Ok(results
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

/// Build the local filename for a result file: strip any path, replace spaces with
/// underscores, and insert the test id (and optionally a timestamp) in front of the original
/// name, keeping the extension. The original stem is kept so that the four CSV files of one
/// run cannot collide.
pub fn result_filename(test: &str, filename: &str, timestamp: Option<&str>) -> String {
    let filename = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let filename = filename.replace(' ', "_");
    let (stem, ext) = filename.split_once('.').unwrap_or((filename.as_str(), ""));

    let mut name = format!("{test}_{stem}");
    if let Some(ts) = timestamp {
        name.push('_');
        name.push_str(ts);
    }
    if !ext.is_empty() {
        name.push('.');
        name.push_str(ext);
    }
    name
}

/// The current local time as `HHMMSS`, for timestamping result files.
pub fn timestamp_now() -> String {
    lazy_static! {
        static ref FORMAT: Vec<time::format_description::FormatItem<'static>> =
            time::format_description::parse("[hour][minute][second]").unwrap();
    }
    time::OffsetDateTime::now_local()
        .unwrap_or_else(|_| time::OffsetDateTime::now_utc())
        .format(&*FORMAT)
        .unwrap_or_default()
}

/// Error kind returned while running and monitoring Quick Tests.
#[derive(Debug, Error)]
pub enum QuickTestError {
    /// The status queries kept failing; the monitor gave up.
    #[error("Giving up querying the API server after {attempts} attempts: {source}")]
    ConnectionLost {
        attempts: usize,
        #[source]
        source: RestError,
    },
    /// The test never reported a current action.
    #[error("Quick Test is stuck during initialization: no action after {0} polls")]
    InitializationStuck(usize),
    /// The test never left the apply phase.
    #[error("Quick Test is stuck applying the configuration on {last_action} after {polls} polls")]
    ApplyStuck {
        last_action: CurrentAction,
        polls: usize,
    },
    /// The test ended before it ever ran.
    #[error("Quick Test ended before it ever ran: {0}")]
    EndedPrematurely(String),
    /// The test is running but never showed trial progress.
    #[error("Quick Test is running, but no trial statistics appeared within {0} polls")]
    RunningStalled(usize),
    /// The test never started running.
    #[error("Quick Test failed to start: {0}")]
    StartupStalled(String),
    /// Error on the REST transport outside the monitored status queries.
    #[error("{0}")]
    Rest(#[from] RestError),
}
