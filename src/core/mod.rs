//! Core data structures for Forge.
//!
//! This module contains the foundational types used throughout Forge:
//! - The `forge.ini` manifest
//! - Project file trees and the source tree scanner
//! - Projects and the workspace that owns them

pub mod error;
pub mod manifest;
pub mod node;
pub mod project;
pub mod workspace;

pub use error::{BuildError, ConfigError};
pub use manifest::{Manifest, MANIFEST_NAME};
pub use node::{Node, NodeKind};
pub use project::{AppKind, BuildType, Project, SubsystemKind};
pub use workspace::{ProjectId, Workspace};
