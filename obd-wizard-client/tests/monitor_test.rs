//! Install monitor polling behaviour, on a paused clock

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::time::Duration;

use common::{MockDeployer, network_error, task};
use obd_wizard_client::{InstallEvent, InstallMonitor, InstallOutcome};
use obd_wizard_core::types::{InstallLog, InstallStatus};
use tokio::time::Instant;

async fn drain(
    mut handle: obd_wizard_client::InstallHandle,
) -> (Vec<InstallEvent>, InstallOutcome) {
    let mut events = Vec::new();
    while let Some(event) = handle.next_event().await {
        events.push(event);
    }
    let outcome = handle.join().await.expect("monitor task panicked");
    (events, outcome)
}

fn log(text: &str, offset: u64) -> InstallLog {
    InstallLog {
        log: text.to_string(),
        offset,
    }
}

#[tokio::test(start_paused = true)]
async fn polls_every_second_until_terminal() {
    let api = MockDeployer::new();
    api.push_status(Ok(task(InstallStatus::Running, 1, 4))).await;
    api.push_status(Ok(task(InstallStatus::Running, 2, 4))).await;
    api.push_status(Ok(task(InstallStatus::Successful, 4, 4))).await;

    let start = Instant::now();
    let handle = InstallMonitor::new(api.clone(), "demo").spawn();
    let (events, outcome) = drain(handle).await;

    assert_eq!(outcome.status, Some(InstallStatus::Successful));
    assert!(!outcome.cancelled);
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.last_task.unwrap().finished, 4);

    let calls = api.status_calls().await;
    assert_eq!(calls.len(), 3);
    for pair in calls.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(gap >= Duration::from_millis(1000) && gap < Duration::from_millis(1100));
    }

    // terminal status at t=2s, finish delay 2s
    assert!(start.elapsed() >= Duration::from_secs(4));
    assert_eq!(
        events.last(),
        Some(&InstallEvent::Finished(InstallStatus::Successful))
    );
}

#[tokio::test(start_paused = true)]
async fn emits_progress_ratio() {
    let api = MockDeployer::new();
    api.push_status(Ok(task(InstallStatus::Running, 1, 3))).await;
    api.push_status(Ok(task(InstallStatus::Successful, 3, 3))).await;

    let (events, _) = drain(InstallMonitor::new(api, "demo").spawn()).await;
    let progress: Vec<f64> = events
        .iter()
        .filter_map(|e| match e {
            InstallEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert_eq!(progress.len(), 2);
    assert!((progress[0] - 0.33).abs() < f64::EPSILON);
    assert!((progress[1] - 1.0).abs() < f64::EPSILON);
}

#[tokio::test(start_paused = true)]
async fn failed_polls_are_recorded_and_retried() {
    let api = MockDeployer::new();
    api.push_status(Err(network_error())).await;
    api.push_status(Err(network_error())).await;
    api.push_status(Ok(task(InstallStatus::Successful, 1, 1))).await;

    let (events, outcome) = drain(InstallMonitor::new(api.clone(), "demo").spawn()).await;

    assert_eq!(outcome.errors.len(), 2);
    assert_eq!(
        outcome.errors[0].message,
        "Network error: connection refused"
    );
    let error_events = events
        .iter()
        .filter(|e| matches!(e, InstallEvent::Error(_)))
        .count();
    assert_eq!(error_events, 2);
    assert_eq!(api.status_calls().await.len(), 3);
    assert_eq!(outcome.status, Some(InstallStatus::Successful));
}

#[tokio::test(start_paused = true)]
async fn failed_install_is_terminal() {
    let api = MockDeployer::new();
    api.push_status(Ok(task(InstallStatus::Failed, 2, 5))).await;

    let (events, outcome) = drain(InstallMonitor::new(api, "demo").spawn()).await;
    assert_eq!(outcome.status, Some(InstallStatus::Failed));
    assert!(events.contains(&InstallEvent::Finished(InstallStatus::Failed)));
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_polling() {
    let api = MockDeployer::new();
    api.push_status(Ok(task(InstallStatus::Running, 0, 10))).await;

    let handle = InstallMonitor::new(api.clone(), "demo").spawn();
    tokio::time::sleep(Duration::from_millis(3500)).await;
    handle.cancel();
    let (events, outcome) = drain(handle).await;

    assert!(outcome.cancelled);
    assert_eq!(outcome.status, None);
    assert_eq!(api.status_calls().await.len(), 4);
    assert!(!events.iter().any(|e| matches!(e, InstallEvent::Finished(_))));

    // nothing polls after cancellation
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(api.status_calls().await.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn cancel_during_finish_delay_skips_finished() {
    let api = MockDeployer::new();
    api.push_status(Ok(task(InstallStatus::Successful, 1, 1))).await;

    let monitor = InstallMonitor::new(api, "demo");
    let token = monitor.cancel_token();
    let handle = monitor.spawn();
    tokio::time::sleep(Duration::from_millis(500)).await;
    token.cancel();
    let (events, outcome) = drain(handle).await;

    assert!(outcome.cancelled);
    assert_eq!(
        outcome.last_task.map(|t| t.status),
        Some(InstallStatus::Successful)
    );
    assert!(!events.iter().any(|e| matches!(e, InstallEvent::Finished(_))));
}

#[tokio::test(start_paused = true)]
async fn log_follows_offset_while_running() {
    let api = MockDeployer::new();
    api.push_status(Ok(task(InstallStatus::Running, 1, 4))).await;
    api.push_status(Ok(task(InstallStatus::Running, 2, 4))).await;
    api.push_status(Ok(task(InstallStatus::Running, 3, 4))).await;
    api.push_status(Ok(task(InstallStatus::Successful, 4, 4))).await;
    api.push_log(Ok(log("start\n", 6))).await;
    api.push_log(Ok(log("", 6))).await;
    api.push_log(Ok(log("bootstrap\n", 16))).await;

    let (events, _) = drain(InstallMonitor::new(api.clone(), "demo").spawn()).await;

    let offsets = api.log_offsets().await;
    assert_eq!(&offsets[..3], &[0, 6, 6]);
    // status turns terminal at t=3s; no log poll after that
    assert!(offsets.len() <= 4);

    let logs: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            InstallEvent::Log(chunk) => Some(chunk.log.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(&logs[..2], &["start\n", "bootstrap\n"]);
}

#[tokio::test(start_paused = true)]
async fn log_errors_do_not_stop_monitoring() {
    let api = MockDeployer::new();
    api.push_status(Ok(task(InstallStatus::Running, 0, 2))).await;
    api.push_status(Ok(task(InstallStatus::Running, 1, 2))).await;
    api.push_status(Ok(task(InstallStatus::Successful, 2, 2))).await;
    api.push_log(Err(network_error())).await;
    api.push_log(Ok(log("ok\n", 3))).await;

    let (_, outcome) = drain(InstallMonitor::new(api.clone(), "demo").spawn()).await;
    assert_eq!(outcome.status, Some(InstallStatus::Successful));
    assert_eq!(outcome.errors.len(), 1);
    assert!(api.log_offsets().await.len() >= 2);
}
