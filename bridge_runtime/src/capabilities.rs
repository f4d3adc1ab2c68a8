//! Capability registry for the command surface.
//!
//! Every command belongs to exactly one capability. Ordinary capabilities
//! are on by default; privileged ones (arbitrary console evaluation,
//! broadcast to all players) must be named explicitly by the deployer.

use std::collections::HashSet;
use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CapabilityFlags: u32 {
        const QUERY = 1 << 0;
        const ACT = 1 << 1;
        const EXECUTE = 1 << 2;
        const BROADCAST = 1 << 3;

        const PRIVILEGED = Self::EXECUTE.bits() | Self::BROADCAST.bits();
    }
}

impl Default for CapabilityFlags {
    fn default() -> Self {
        CapabilityFlags::QUERY | CapabilityFlags::ACT
    }
}

/// Describes one capability exposed through the command surface.
#[derive(Debug)]
pub struct CapabilitySpec {
    /// Identifier used in deployment configuration.
    pub id: &'static str,
    /// Operator facing description.
    pub description: &'static str,
    pub flag: CapabilityFlags,
    /// Commands that become available when the capability is granted.
    pub commands: &'static [&'static str],
}

impl CapabilitySpec {
    pub fn is_privileged(&self) -> bool {
        CapabilityFlags::PRIVILEGED.contains(self.flag)
    }

    pub fn covers_command(&self, name: &str) -> bool {
        self.commands.contains(&name)
    }
}

const CAPABILITY_SPECS: &[CapabilitySpec] = &[
    CapabilitySpec {
        id: "world.query",
        description: "Read-only inspection of the player, inventory, nearby entities, recipes and research.",
        flag: CapabilityFlags::QUERY,
        commands: &[
            "status",
            "inventory",
            "scan",
            "find_resources",
            "recipes",
            "technologies",
            "current_research",
        ],
    },
    CapabilitySpec {
        id: "world.act",
        description: "Movement, mining, entity manipulation, inventory transfer, crafting and research.",
        flag: CapabilityFlags::ACT,
        commands: &[
            "walk",
            "stop",
            "mine",
            "stop_mining",
            "place",
            "rotate",
            "deconstruct",
            "set_recipe",
            "connect_wire",
            "copy_settings",
            "put",
            "take",
            "pickup",
            "craft",
            "research",
        ],
    },
    CapabilitySpec {
        id: "admin.execute",
        description: "Evaluates caller-supplied console input inside the host, bypassing every other validation.",
        flag: CapabilityFlags::EXECUTE,
        commands: &["execute"],
    },
    CapabilitySpec {
        id: "admin.broadcast",
        description: "Prints caller-supplied text to every connected player.",
        flag: CapabilityFlags::BROADCAST,
        commands: &["broadcast"],
    },
];

/// Static registry containing all capability specifications.
pub struct CapabilityRegistry {
    specs: &'static [CapabilitySpec],
}

impl CapabilityRegistry {
    pub fn specs(&self) -> &'static [CapabilitySpec] {
        self.specs
    }

    pub fn get(&self, id: &str) -> Option<&'static CapabilitySpec> {
        self.specs.iter().find(|spec| spec.id == id)
    }

    /// Capability that owns the given command name.
    pub fn for_command(&self, name: &str) -> Option<&'static CapabilitySpec> {
        self.specs.iter().find(|spec| spec.covers_command(name))
    }

    /// Build the enabled flag set from the default capabilities plus the
    /// privileged ids a deployer opted into.
    pub fn resolve(&self, privileged: &[String]) -> Result<CapabilityFlags, CapabilityValidationError> {
        let mut flags = CapabilityFlags::default();
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for entry in privileged {
            let id = entry.trim();
            if id.is_empty() {
                errors.push("capability entries cannot be blank".to_string());
                continue;
            }
            if !seen.insert(id.to_string()) {
                errors.push(format!("duplicate capability '{id}'"));
                continue;
            }
            match self.get(id) {
                Some(spec) => flags.insert(spec.flag),
                None => errors.push(format!("unknown capability '{id}'")),
            }
        }

        if errors.is_empty() {
            Ok(flags)
        } else {
            Err(CapabilityValidationError::new(errors))
        }
    }
}

const REGISTRY: CapabilityRegistry = CapabilityRegistry {
    specs: CAPABILITY_SPECS,
};

pub const fn capability_registry() -> &'static CapabilityRegistry {
    &REGISTRY
}

#[derive(Debug, Clone)]
pub struct CapabilityValidationError {
    errors: Vec<String>,
}

impl CapabilityValidationError {
    pub fn new(errors: Vec<String>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

impl fmt::Display for CapabilityValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.errors.join("; "))
    }
}

impl std::error::Error for CapabilityValidationError {}
