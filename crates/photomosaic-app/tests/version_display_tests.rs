//! Integration tests for the version banner.

use photomosaic_app::{APP_VERSION, app_version};

#[test]
fn version_display_tests_reads_workspace_version_file() {
    let version_file = include_str!("../../../VERSION");
    assert_eq!(app_version(), version_file.trim());
    assert_eq!(APP_VERSION.split('.').count(), 3);
}
