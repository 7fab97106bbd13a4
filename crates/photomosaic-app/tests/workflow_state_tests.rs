//! Integration tests for the generation workflow state machine.

mod common;

use common::{
    ScriptedTransport, client_over, input_artifact, mosaic, pool_artifacts, ready_controller,
};
use photomosaic_app::{Settlement, WorkflowController};
use photomosaic_capture::Handoff;
use photomosaic_core::{ParameterField, ValidationError};
use photomosaic_transport::TransportError;
use photomosaic_ui::{GENERIC_FAILURE_MESSAGE, WorkflowState};

#[test]
fn workflow_state_tests_starts_idle_with_defaults() {
    let controller = WorkflowController::new();
    let view = controller.view();

    assert_eq!(controller.state(), WorkflowState::Idle);
    assert!(controller.submit_enabled());
    assert_eq!(view.stride_text, "30");
    assert_eq!(view.output_width_text, "1000");
    assert_eq!(view.input_status, "No image selected");
    assert!(view.result_url.is_none());
}

#[test]
fn workflow_state_tests_reports_missing_input_before_missing_pool() {
    let mut controller = WorkflowController::new();
    controller.set_stride_text("0");

    assert_eq!(controller.submit().unwrap_err(), ValidationError::MissingInput);

    controller.select_input(input_artifact());
    assert_eq!(controller.submit().unwrap_err(), ValidationError::MissingPool);
    assert_eq!(controller.error(), Some("Please select pool images."));
    assert_eq!(controller.state(), WorkflowState::Idle);
}

#[test]
fn workflow_state_tests_rejects_unparsable_parameters() {
    let mut controller = ready_controller();
    controller.set_output_width_text("wide");

    let rejected = controller.submit().unwrap_err();
    assert_eq!(
        rejected,
        ValidationError::NotANumber {
            field: ParameterField::OutputWidth,
            raw: "wide".to_string(),
        }
    );
    assert!(controller.in_flight().is_none());
}

#[test]
fn workflow_state_tests_rejects_out_of_range_stride() {
    let mut controller = ready_controller();
    controller.set_stride_text("0");
    assert_eq!(
        controller.submit().unwrap_err(),
        ValidationError::StrideOutOfRange { value: 0 }
    );
}

#[test]
fn workflow_state_tests_success_renders_result_and_reenables_submit() {
    let transport = ScriptedTransport::new(vec![Ok(mosaic(7))]);
    let client = client_over(transport.clone());
    let mut controller = ready_controller();
    controller.set_stride_text("20");
    controller.set_output_width_text("800");

    let state = controller.generate_blocking(&client).expect("request should dispatch");

    assert_eq!(state, WorkflowState::Success);
    assert!(controller.submit_enabled());
    assert!(controller.error().is_none());
    assert_eq!(controller.result_bytes(), Some(&[7; 16][..]));

    let sent = transport.sent(0);
    assert_eq!(sent.parts_named("pool"), 3);
    assert_eq!(sent.text_value("stride"), Some("20"));
    assert_eq!(sent.text_value("output_width"), Some("800"));

    let lines = controller.view().render_lines();
    assert!(lines.iter().any(|line| line.starts_with("Generated Mosaic: blob:")));
    assert!(lines.contains(&"Download Mosaic as mosaic.jpg".to_string()));
}

#[test]
fn workflow_state_tests_failure_shows_generic_message_without_stale_result() {
    let transport = ScriptedTransport::new(vec![
        Ok(mosaic(1)),
        Err(TransportError::Status {
            status: 500,
            detail: Some("boom".to_string()),
        }),
    ]);
    let client = client_over(transport);
    let mut controller = ready_controller();

    assert_eq!(controller.generate_blocking(&client), Ok(WorkflowState::Success));
    assert_eq!(controller.generate_blocking(&client), Ok(WorkflowState::Failed));

    assert_eq!(controller.error(), Some(GENERIC_FAILURE_MESSAGE));
    assert!(controller.result_url().is_none());
    assert_eq!(controller.presenter().live_references(), 0);
}

#[test]
fn workflow_state_tests_revokes_previous_result_when_resubmitting() {
    let mut controller = ready_controller();
    let first = controller.submit().expect("first dispatch");
    controller.settle(first.token, Ok(mosaic(1)));
    assert_eq!(controller.presenter().live_references(), 1);

    let second = controller.submit().expect("second dispatch");
    assert_eq!(controller.state(), WorkflowState::Submitting);
    assert!(controller.result_url().is_none());
    assert_eq!(controller.presenter().live_references(), 0);

    controller.settle(second.token, Ok(mosaic(2)));
    assert_eq!(controller.presenter().live_references(), 1);
}

#[test]
fn workflow_state_tests_retry_after_failure_clears_error() {
    let mut controller = ready_controller();
    let first = controller.submit().expect("first dispatch");
    controller.settle(first.token, Err(TransportError::Connect("refused".to_string())));
    assert_eq!(controller.state(), WorkflowState::Failed);

    controller.submit().expect("retry dispatch");
    assert!(controller.error().is_none());
    assert_eq!(controller.state(), WorkflowState::Submitting);
}

#[test]
fn workflow_state_tests_only_latest_dispatch_settles() {
    let mut controller = ready_controller();
    let first = controller.submit().expect("first dispatch");
    let second = controller.submit().expect("second dispatch");
    assert_ne!(first.token, second.token);

    assert_eq!(
        controller.settle(second.token, Err(TransportError::Connect("reset".to_string()))),
        Settlement::Applied(WorkflowState::Failed)
    );
    assert_eq!(controller.settle(first.token, Ok(mosaic(9))), Settlement::Stale);
    assert_eq!(controller.state(), WorkflowState::Failed);
    assert!(controller.result_url().is_none());
}

#[test]
fn workflow_state_tests_handoff_fills_input_slot() {
    let captured = photomosaic_core::ImageArtifact::new(
        "captured_image.jpg",
        "image/jpeg",
        vec![0xFF, 0xD8, 0xFF],
    );
    let mut controller = WorkflowController::with_handoff(Handoff::new(captured.clone()));

    assert_eq!(controller.input(), Some(&captured));
    assert_eq!(
        controller.view().input_status,
        "Image selected (captured_image.jpg)"
    );

    controller.select_input(input_artifact());
    assert_eq!(controller.input().map(|input| input.file_name()), Some("photo.png"));
}

#[test]
fn workflow_state_tests_pool_replacement_is_wholesale() {
    let mut controller = ready_controller();
    assert!(controller.set_pool(pool_artifacts(5)));
    assert_eq!(controller.pool().map(|pool| pool.len()), Some(5));
    assert_eq!(controller.view().pool_status, "5 pool images");

    controller.remove_input();
    assert_eq!(controller.submit().unwrap_err(), ValidationError::MissingInput);
}
