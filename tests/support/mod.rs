//! Test support utilities for envsec integration tests.
//!
//! Provides in-memory fakes of the provider seams and an isolated
//! environment for binary tests.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fakes;
pub mod fixtures;
pub mod skip;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fakes::*;
#[allow(unused_imports)]
pub use fixtures::*;

use tempfile::TempDir;

/// Test environment with isolated temp directories.
///
/// Child processes use `.current_dir()` and their own `HOME`, so tests can
/// run in parallel without touching the real config or cache.
pub struct Test {
    /// Temporary project directory
    pub dir: TempDir,
    /// Temporary home (and cache) directory
    pub home: TempDir,
}

impl Test {
    /// Create a new empty test environment.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let home = TempDir::new().expect("failed to create temp home");
        Self { dir, home }
    }

    /// Create a test environment with a project config written.
    pub fn init(org_id: &str, project_id: &str) -> Self {
        let t = Self::new();
        let config = envsec::core::config::Config::new(org_id, project_id);
        config
            .save_to(&t.dir.path().join(".envsec.toml"))
            .expect("failed to write config");
        t
    }
}
