//! Integration tests for the capture screen hand-off.

use std::fs;

use photomosaic_app::{capture_handoff, save_artifact};
use photomosaic_capture::{
    CameraDevice, CameraInfo, StillFrameCamera, SyntheticCamera, encode_jpeg,
};
use photomosaic_core::{CAPTURED_IMAGE_FILE_NAME, JPEG_MIME_TYPE};
use tempfile::tempdir;

#[test]
fn capture_handoff_tests_not_ready_camera_stays_in_preview() {
    let handoff = capture_handoff(&SyntheticCamera::not_ready()).expect("no decode happens");
    assert!(handoff.is_none());
}

#[test]
fn capture_handoff_tests_still_frame_becomes_captured_jpeg() {
    let dir = tempdir().expect("tempdir should be created");
    let still_path = dir.path().join("desk.jpg");
    let jpeg = encode_jpeg(&[200_u8; 4 * 4 * 3], 4, 4, 90).expect("jpeg should encode");
    fs::write(&still_path, &jpeg).expect("still should be written");

    let camera = StillFrameCamera::open(&still_path).expect("still should open");
    let handoff = capture_handoff(&camera)
        .expect("still should decode")
        .expect("still frame camera is always ready");

    let artifact = handoff.artifact();
    assert_eq!(artifact.file_name(), CAPTURED_IMAGE_FILE_NAME);
    assert_eq!(artifact.mime_type(), JPEG_MIME_TYPE);
    assert_eq!(artifact.bytes(), &jpeg[..]);

    let saved = save_artifact(artifact, &dir.path().join("captures")).expect("save should work");
    assert_eq!(fs::read(saved).expect("capture should be readable"), jpeg);
}

struct GarbledCamera;

impl CameraDevice for GarbledCamera {
    fn describe(&self) -> CameraInfo {
        CameraInfo {
            id: "garbled".to_string(),
            name: "Garbled".to_string(),
            width: 1,
            height: 1,
        }
    }

    fn screenshot(&self) -> Option<String> {
        Some("data:image/jpeg;base64,@@@".to_string())
    }
}

#[test]
fn capture_handoff_tests_undecodable_still_is_silent() {
    let handoff = capture_handoff(&GarbledCamera).expect("bad still is not an app error");
    assert!(handoff.is_none());
}
