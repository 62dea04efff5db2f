//! portside-core: shared plumbing for the portside CLI
//!
//! This crate provides the error stack, structured external invocations and
//! per-tool command builders, local dataset path resolution, Windows gitbash
//! path translation, and the remote install script.

pub mod error;
pub mod invoke;
pub mod paths;
pub mod script;
pub mod ssh;
pub mod transfer;
pub mod translate;

pub use error::PortsideError;
pub use invoke::ExternalCommand;
