#![warn(missing_docs)]
//! # photomosaic-benchmarks
//!
//! Deterministic workloads for the packaging smoke benchmark.

use photomosaic_core::{ImageArtifact, PoolCollection};

/// Builds an input artifact of `bytes` bytes.
pub fn synthetic_input(bytes: usize) -> ImageArtifact {
    ImageArtifact::new("input.jpg", "image/jpeg", vec![0x5A; bytes])
}

/// Builds a pool of `count` artifacts, each `bytes` long and distinct.
pub fn synthetic_pool(count: usize, bytes: usize) -> PoolCollection {
    PoolCollection::from_selection(
        (0..count)
            .map(|index| {
                ImageArtifact::new(
                    format!("tile-{index:04}.jpg"),
                    "image/jpeg",
                    vec![(index % 251) as u8; bytes],
                )
            })
            .collect(),
    )
}
