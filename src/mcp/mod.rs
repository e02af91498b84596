//! Model Context Protocol server layer.

pub mod handle;
pub mod handler;
pub mod sse;
pub mod tools;
pub mod transport;
