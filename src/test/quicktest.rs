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

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use crate::quicktest::{
    result_filename, CurrentAction, MonitorSettings, QuickTestError, QuickTestMonitor,
    QuickTestSource,
};
use crate::rest::RestError;

/// One scripted reply: either a value, or a transient connection failure.
#[derive(Clone)]
enum Reply<T> {
    Value(T),
    Fail,
}

/// A scripted Quick Test. Replies are consumed in order; the last reply repeats forever.
#[derive(Default)]
struct MockTest {
    actions: Mutex<VecDeque<Reply<Vec<String>>>>,
    running: Mutex<VecDeque<Reply<(bool, String)>>>,
    last_progress: Mutex<String>,
    status: String,
}

impl MockTest {
    fn new(
        actions: impl IntoIterator<Item = Reply<Vec<String>>>,
        running: impl IntoIterator<Item = Reply<(bool, String)>>,
        status: &str,
    ) -> Self {
        Self {
            actions: Mutex::new(actions.into_iter().collect()),
            running: Mutex::new(running.into_iter().collect()),
            last_progress: Mutex::new(String::new()),
            status: status.to_string(),
        }
    }

    fn next<T: Clone>(queue: &Mutex<VecDeque<Reply<T>>>) -> Reply<T> {
        let mut queue = queue.lock().unwrap();
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().expect("mock queue is empty")
        }
    }
}

#[async_trait]
impl QuickTestSource for MockTest {
    async fn current_actions(&self) -> Result<Vec<String>, RestError> {
        match Self::next(&self.actions) {
            Reply::Value(actions) => Ok(actions),
            Reply::Fail => Err(RestError::Timeout),
        }
    }

    async fn is_running(&self) -> Result<bool, RestError> {
        match Self::next(&self.running) {
            Reply::Value((is_running, progress)) => {
                *self.last_progress.lock().unwrap() = progress;
                Ok(is_running)
            }
            Reply::Fail => Err(RestError::Timeout),
        }
    }

    async fn progress(&self) -> Result<String, RestError> {
        Ok(self.last_progress.lock().unwrap().clone())
    }

    async fn status(&self) -> Result<String, RestError> {
        Ok(self.status.clone())
    }
}

fn act(labels: &[&str]) -> Reply<Vec<String>> {
    Reply::Value(labels.iter().map(|l| l.to_string()).collect())
}

fn run(is_running: bool, progress: &str) -> Reply<(bool, String)> {
    Reply::Value((is_running, progress.to_string()))
}

/// Settings with all intervals zeroed, so tests run instantly while keeping the documented
/// retry budgets.
fn fast() -> MonitorSettings {
    MonitorSettings {
        poll_interval: Duration::ZERO,
        progress_interval: Duration::ZERO,
        connect_backoff: Duration::ZERO,
        ..Default::default()
    }
}

#[tokio::test]
async fn completes_after_observed_run() {
    // unset -> known applying action -> running action -> trials -> stopped
    let mock = MockTest::new(
        [
            act(&[]),
            act(&[]),
            act(&["ApplyFlowGroups"]),
            act(&["TransmittingFrames"]),
        ],
        [
            run(true, "Trial 1/3 Frame size 128"),
            run(true, "Trial 2/3 Frame size 128"),
            run(false, ""),
        ],
        "",
    );
    let mut monitor = QuickTestMonitor::with_settings(&mock, fast());
    monitor.run().await.unwrap();
}

#[tokio::test]
async fn second_run_is_idempotent() {
    let mock = MockTest::new(
        [act(&["TransmittingFrames"])],
        [run(true, "Trial 1/1"), run(false, "")],
        "",
    );
    let mut monitor = QuickTestMonitor::with_settings(&mock, fast());
    monitor.run().await.unwrap();

    // a second call must return success without polling again. Poison the queues so that any
    // further query would fail.
    mock.actions.lock().unwrap().clear();
    mock.actions.lock().unwrap().push_back(Reply::Fail);
    mock.running.lock().unwrap().clear();
    mock.running.lock().unwrap().push_back(Reply::Fail);

    monitor.run().await.unwrap();
}

#[tokio::test]
async fn initialization_stuck() {
    let mock = MockTest::new([act(&[])], [run(false, "")], "");
    let mut monitor = QuickTestMonitor::with_settings(&mock, fast());
    match monitor.run().await {
        Err(QuickTestError::InitializationStuck(30)) => {}
        x => panic!("expected InitializationStuck, got {x:?}"),
    }
}

#[tokio::test]
async fn ended_during_initialization() {
    let mock = MockTest::new([act(&["TestEnded"])], [run(false, "")], "FailedOnSetup");
    let mut monitor = QuickTestMonitor::with_settings(&mock, fast());
    match monitor.run().await {
        Err(QuickTestError::EndedPrematurely(status)) => assert_eq!(status, "FailedOnSetup"),
        x => panic!("expected EndedPrematurely, got {x:?}"),
    }
}

#[tokio::test]
async fn apply_phase_stuck() {
    let mock = MockTest::new([act(&["InitializingTest"])], [run(false, "")], "");
    let mut monitor = QuickTestMonitor::with_settings(&mock, fast());
    match monitor.run().await {
        Err(QuickTestError::ApplyStuck { last_action, polls }) => {
            assert_eq!(last_action, CurrentAction::InitializingTest);
            assert_eq!(polls, 120);
        }
        x => panic!("expected ApplyStuck, got {x:?}"),
    }
}

#[tokio::test]
async fn ended_prematurely_in_apply_phase() {
    // TestEnded aborts the apply phase immediately, without exhausting the retry budget.
    let mock = MockTest::new(
        [
            act(&["InitializingTest"]),
            act(&["ApplyFlowGroups"]),
            act(&["TestEnded"]),
        ],
        [run(false, "")],
        "FailedOnApply",
    );
    let mut monitor = QuickTestMonitor::with_settings(&mock, fast());
    match monitor.run().await {
        Err(QuickTestError::EndedPrematurely(status)) => assert_eq!(status, "FailedOnApply"),
        x => panic!("expected EndedPrematurely, got {x:?}"),
    }
}

#[tokio::test]
async fn running_without_trial_stats_stalls() {
    let mock = MockTest::new(
        [act(&["TransmittingFrames"])],
        [run(true, "Preparing iteration")],
        "",
    );
    let mut monitor = QuickTestMonitor::with_settings(&mock, fast());
    match monitor.run().await {
        Err(QuickTestError::RunningStalled(40)) => {}
        x => panic!("expected RunningStalled, got {x:?}"),
    }
}

#[tokio::test]
async fn never_starts_running() {
    let mock = MockTest::new(
        [act(&["TransmittingFrames"])],
        [run(false, "")],
        "Failed to start",
    );
    let mut monitor = QuickTestMonitor::with_settings(&mock, fast());
    match monitor.run().await {
        Err(QuickTestError::StartupStalled(status)) => assert_eq!(status, "Failed to start"),
        x => panic!("expected StartupStalled, got {x:?}"),
    }
}

#[tokio::test]
async fn late_trial_stats_still_succeed() {
    // a few polls without trial progress are fine, as long as they show up within the budget.
    let mock = MockTest::new(
        [act(&["TransmittingFrames"])],
        [
            run(true, "Preparing iteration"),
            run(true, "Preparing iteration"),
            run(true, "Trial 1/3 Frame size 64"),
            run(false, ""),
        ],
        "",
    );
    let mut monitor = QuickTestMonitor::with_settings(&mock, fast());
    monitor.run().await.unwrap();
}

#[tokio::test]
async fn transient_failures_are_retried() {
    // ten transient failures are tolerated; the eleventh would be fatal.
    let mut actions = vec![Reply::Fail; 10];
    actions.push(act(&["TransmittingFrames"]));
    let mock = MockTest::new(actions, [run(true, "Trial 1/1"), run(false, "")], "");
    let mut monitor = QuickTestMonitor::with_settings(&mock, fast());
    monitor.run().await.unwrap();
}

#[tokio::test]
async fn persistent_failures_are_fatal() {
    let mock = MockTest::new([Reply::Fail], [run(false, "")], "");
    let mut monitor = QuickTestMonitor::with_settings(&mock, fast());
    match monitor.run().await {
        Err(QuickTestError::ConnectionLost { attempts, .. }) => assert_eq!(attempts, 10),
        x => panic!("expected ConnectionLost, got {x:?}"),
    }
}

#[test]
fn current_action_sentinels_are_normalized() {
    // the appliance mixes a missing value and the literal string "None"; both parse to the
    // same canonical variant.
    assert_eq!(CurrentAction::parse(None), CurrentAction::NotStarted);
    assert_eq!(CurrentAction::parse(Some("")), CurrentAction::NotStarted);
    assert_eq!(CurrentAction::parse(Some("None")), CurrentAction::NotStarted);
}

#[test]
fn current_action_vocabulary() {
    assert_eq!(
        CurrentAction::parse(Some("CollectingStats")),
        CurrentAction::CollectingStats
    );
    assert_eq!(
        CurrentAction::parse(Some("SomethingNew")),
        CurrentAction::Other("SomethingNew".to_string())
    );
    assert!(CurrentAction::TransmittingFrames.is_running_action());
    assert!(CurrentAction::TestEnded.is_running_action());
    assert!(!CurrentAction::ApplyFlowGroups.is_running_action());
    assert!(!CurrentAction::NotStarted.is_running_action());
}

#[test]
fn result_filenames() {
    assert_eq!(
        result_filename("rfc2544throughput_Tput", "AggregateResults.csv", Some("103000")),
        "rfc2544throughput_Tput_AggregateResults_103000.csv"
    );
    assert_eq!(
        result_filename("t", "/root/data/result/Run0005/results.csv", None),
        "t_results.csv"
    );
    assert_eq!(
        result_filename("t", "C:\\Results\\Test Report.pdf", Some("120000")),
        "t_Test_Report_120000.pdf"
    );
    assert_eq!(result_filename("t", "logFile", Some("1")), "t_logFile_1");
}
