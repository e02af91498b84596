//! Mode policy: resolves the capability-exposure mode for each session.

pub mod resolver;

pub use resolver::{validate_toolset_list, ModePolicy};
