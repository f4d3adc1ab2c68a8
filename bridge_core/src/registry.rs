use std::collections::HashMap;

use bridge_runtime::CapabilityFlags;
use tracing::debug;

use crate::handlers::{builtin_handlers, CommandHandler};

/// Name-keyed table of command handlers.
///
/// A handler whose capability is not enabled is never stored, so gated
/// commands are indistinguishable from unknown ones at dispatch time.
pub struct HandlerRegistry {
    handlers: HashMap<&'static str, Box<dyn CommandHandler>>,
    enabled: CapabilityFlags,
}

impl HandlerRegistry {
    pub fn new(enabled: CapabilityFlags) -> Self {
        Self {
            handlers: HashMap::new(),
            enabled,
        }
    }

    /// Every built-in handler permitted by `enabled`.
    pub fn with_defaults(enabled: CapabilityFlags) -> Self {
        let mut registry = Self::new(enabled);
        for handler in builtin_handlers() {
            registry.register(handler);
        }
        registry
    }

    /// Returns false when the handler's capability is disabled. A handler
    /// with an already registered name replaces the previous one.
    pub fn register(&mut self, handler: Box<dyn CommandHandler>) -> bool {
        if !self.enabled.contains(handler.capability()) {
            debug!(
                target: "sim_bridge::dispatch",
                command = handler.name(),
                "handler.gated"
            );
            return false;
        }
        self.handlers.insert(handler.name(), handler);
        true
    }

    /// Lookup by an already lowercased name.
    pub fn get(&self, name: &str) -> Option<&dyn CommandHandler> {
        self.handlers.get(name).map(|handler| handler.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn enabled(&self) -> CapabilityFlags {
        self.enabled
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_defaults(CapabilityFlags::default())
    }
}
