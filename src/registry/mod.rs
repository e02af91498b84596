//! Capability registry and operation catalog.
//!
//! The registry is the static table of toolsets (named bundles of data
//! modules); the catalog resolves a module identifier to the registration
//! function that attaches its tools to a server handle.

pub mod catalog;
pub mod groups;

pub use catalog::{HttpCatalog, ModuleId, OperationCatalog, Registrar};
pub use groups::{CapabilityRegistry, ToolsetDef};
