//! # Command System
//!
//! Prefix (`.`) command handling for Discord messages.
//!
//! - **Version**: 3.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Prefix dispatcher with descriptor registry, cooldown and permission gates
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 1.0.0: Initial reorganization with modular command structure

pub mod context;
pub mod dispatcher;
pub mod handler;
pub mod handlers;
pub mod invocation;
pub mod outcome;
pub mod registry;

// Re-export handler infrastructure
pub use context::{CommandContext, Services};
pub use dispatcher::Dispatcher;
pub use handler::{Category, CommandError, CommandSpec, PrefixCommandHandler, Scope};
pub use handlers::default_registry;
pub use invocation::Invocation;
pub use outcome::DispatchOutcome;
pub use registry::CommandRegistry;
