//! Forge - a per-project build orchestrator for C and C++
//!
//! This crate provides the core library functionality for Forge: workspace
//! resolution from `forge.ini` manifests, incremental build planning and
//! compiler, linker and archiver invocation.

pub mod builder;
pub mod core;
pub mod ops;
pub mod util;

/// Test utilities and fakes for Forge unit tests.
///
/// Only available when compiling tests. Provides temporary project trees,
/// a fake toolchain and a command runner that records instead of spawning.
#[cfg(test)]
pub mod test_support;

pub use core::{manifest::Manifest, project::Project, workspace::Workspace};
pub use util::context::GlobalContext;
