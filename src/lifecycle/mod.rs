//! Orchestration: builds the shared collaborators, starts every resource
//! actor with its context and shuts them down in dependency order.

pub mod system;

pub use system::{ResourceSystem, SystemError};
