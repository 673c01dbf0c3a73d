//! High-level operations.
//!
//! This module contains the implementation of Forge commands.

pub mod forge_build;
pub mod forge_clean;
pub mod forge_edit;
pub mod forge_new;
pub mod forge_run;

pub use forge_build::{build, open_session, BuildOptions, Session};
pub use forge_clean::{clean, CleanOptions};
pub use forge_edit::{edit, EditOptions};
pub use forge_new::{new_project, NewOptions};
pub use forge_run::{run, RunOptions};
pub use forge_test::test;
