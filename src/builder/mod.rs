//! C/C++ build system.
//!
//! Planning decides which units of a project are stale; the native builder
//! acts on that plan with the detected toolchain.

pub mod backend;
pub mod compile_commands;
pub mod context;
pub mod generated;
pub mod includes;
pub mod native;
pub mod plan;
pub mod staleness;
pub mod toolchain;

pub use backend::{Backend, BuildState, DirectToolchainBackend};
pub use context::BuildContext;
pub use native::NativeBuilder;
pub use plan::ProjectPlan;
pub use toolchain::{detect_toolchain, CommandSpec, GccToolchain, MsvcToolchain, Toolchain};
