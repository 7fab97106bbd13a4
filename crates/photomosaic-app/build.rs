//! Injects the workspace `VERSION` file as `PHOTOMOSAIC_VERSION`.

use std::path::Path;

fn main() {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").expect("manifest dir");
    let workspace_root = Path::new(&manifest_dir)
        .ancestors()
        .nth(2)
        .expect("crate lives in <root>/crates/<name>");
    let version_file = workspace_root.join("VERSION");
    println!("cargo:rerun-if-changed={}", version_file.display());

    let contents = std::fs::read_to_string(&version_file).expect("read VERSION file");
    let version = contents.lines().next().unwrap_or_default().trim();
    let well_formed = !version.is_empty()
        && version
            .split(['.', '-'])
            .all(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_ascii_alphanumeric()));
    assert!(well_formed, "VERSION must look like 1.2.3, got {version:?}");

    println!("cargo:rustc-env=PHOTOMOSAIC_VERSION={version}");
}
