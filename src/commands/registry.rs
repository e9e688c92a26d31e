//! Command handler registry
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Register descriptors alongside handlers, expose help catalog
//! - 1.0.0: Initial implementation for handler dispatch

use log::warn;
use std::collections::HashMap;
use std::sync::Arc;

use super::handler::{CommandSpec, PrefixCommandHandler};

/// A registered command: its descriptor and the handler that runs it
#[derive(Clone)]
pub struct RegisteredCommand {
    pub spec: &'static CommandSpec,
    pub handler: Arc<dyn PrefixCommandHandler>,
}

/// Registry mapping command names to descriptors and handlers
///
/// Multiple command names can map to the same handler if they share logic.
///
/// # Example
///
/// ```ignore
/// let mut registry = CommandRegistry::new();
/// registry.register(Arc::new(UtilityHandler));
///
/// if let Some(command) = registry.get("ping") {
///     command.handler.handle(&ctx, &invocation).await?;
/// }
/// ```
#[derive(Clone)]
pub struct CommandRegistry {
    commands: HashMap<&'static str, RegisteredCommand>,
    /// Registration order, for help output
    order: Vec<&'static CommandSpec>,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a handler for every command it declares
    ///
    /// A later registration of the same name replaces the earlier one.
    pub fn register(&mut self, handler: Arc<dyn PrefixCommandHandler>) {
        for spec in handler.commands() {
            let previous = self.commands.insert(
                spec.name,
                RegisteredCommand {
                    spec,
                    handler: Arc::clone(&handler),
                },
            );
            if previous.is_some() {
                warn!("Command {} registered twice, keeping the latest", spec.name);
                self.order.retain(|existing| existing.name != spec.name);
            }
            self.order.push(spec);
        }
    }

    /// Get the command registered under a lower-cased name
    pub fn get(&self, name: &str) -> Option<&RegisteredCommand> {
        self.commands.get(name)
    }

    /// Check if a command is registered
    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Number of registered command names
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Descriptors in registration order
    pub fn catalog(&self) -> &[&'static CommandSpec] {
        &self.order
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
