//! Integration tests for off-thread request dispatch.

mod common;

use std::sync::mpsc;

use common::{GatedTransport, ScriptedTransport, client_over, mosaic, ready_controller};
use photomosaic_app::{AppError, DispatchRuntime, Settlement, WorkflowController};
use photomosaic_transport::TransportError;
use photomosaic_ui::WorkflowState;

#[test]
fn dispatch_runtime_tests_owner_stays_responsive_while_in_flight() {
    let (release, gate) = mpsc::channel();
    let mut runtime = DispatchRuntime::new(ready_controller(), client_over(GatedTransport::new(gate)));

    let token = runtime.submit().expect("request should dispatch");
    assert_eq!(runtime.controller().in_flight(), Some(token));
    assert!(runtime.poll().is_empty());
    assert!(!runtime.controller().view().submit_enabled);

    release.send(Ok(mosaic(3))).expect("worker should be waiting");
    assert_eq!(runtime.wait(), Some(Settlement::Applied(WorkflowState::Success)));
    assert_eq!(runtime.controller().result_bytes(), Some(&[3; 16][..]));
}

#[test]
fn dispatch_runtime_tests_wait_skips_superseded_outcomes() {
    let (release, gate) = mpsc::channel();
    let mut runtime = DispatchRuntime::new(ready_controller(), client_over(GatedTransport::new(gate)));

    let superseded = runtime.submit().expect("first dispatch");
    let latest = runtime.submit().expect("second dispatch");
    assert!(latest > superseded);

    release
        .send(Err(TransportError::Connect("reset".to_string())))
        .expect("first worker should be waiting");
    release.send(Ok(mosaic(5))).expect("second worker should be waiting");

    // Either worker may take either outcome; only the latest token applies.
    let settled = runtime.wait().expect("latest dispatch settles");
    assert!(matches!(settled, Settlement::Applied(_)));
    assert!(runtime.controller().in_flight().is_none());
}

#[test]
fn dispatch_runtime_tests_validation_failure_dispatches_nothing() {
    let transport = ScriptedTransport::new(Vec::new());
    let mut runtime = DispatchRuntime::new(WorkflowController::new(), client_over(transport.clone()));

    assert!(matches!(runtime.submit(), Err(AppError::Validation(_))));
    assert_eq!(runtime.wait(), None);
    assert_eq!(transport.sent_count(), 0);
    assert_eq!(runtime.controller().state(), WorkflowState::Idle);
}

#[test]
fn dispatch_runtime_tests_failure_settles_as_failed() {
    let transport = ScriptedTransport::new(vec![Err(TransportError::Status {
        status: 502,
        detail: None,
    })]);
    let mut runtime = DispatchRuntime::new(ready_controller(), client_over(transport));

    runtime.submit().expect("request should dispatch");
    assert_eq!(runtime.wait(), Some(Settlement::Applied(WorkflowState::Failed)));

    let controller = runtime.into_controller();
    assert!(controller.error().is_some());
    assert!(controller.result_url().is_none());
}
