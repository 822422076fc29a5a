//! Process-level observability setup shared by the workspace binaries.

pub mod panic_hook;
pub mod tracing;
