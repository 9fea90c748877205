//! Permission vocabulary: modules, actions, and per-module grants.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A functional area of the back office that permissions are granted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    /// Company profile and membership.
    Company,
    /// Role definitions.
    Roles,
    /// Item catalogue.
    Items,
    /// Stock locations.
    Locations,
    /// Inventory ledger and stock levels.
    Inventory,
    /// Third-party integrations.
    Integrations,
    /// POS and sheet imports.
    Imports,
}

impl Module {
    /// Every module.
    pub const ALL: [Module; 7] = [
        Module::Company,
        Module::Roles,
        Module::Items,
        Module::Locations,
        Module::Inventory,
        Module::Integrations,
        Module::Imports,
    ];

    /// Stable key used in role documents.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Roles => "roles",
            Self::Items => "items",
            Self::Locations => "locations",
            Self::Inventory => "inventory",
            Self::Integrations => "integrations",
            Self::Imports => "imports",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Module {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Module::ALL
            .into_iter()
            .find(|m| m.key() == s)
            .ok_or_else(|| format!("Unknown module '{s}'"))
    }
}

/// An operation checked against a module grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Create records.
    Create,
    /// Read records.
    Read,
    /// Update records.
    Update,
    /// Delete records.
    Delete,
    /// Invite members.
    Invite,
    /// Run an import.
    Import,
    /// Trigger a sync.
    Sync,
}

impl Action {
    /// Whether this is one of the four CRUD actions.
    pub fn is_crud(&self) -> bool {
        matches!(self, Self::Create | Self::Read | Self::Update | Self::Delete)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Invite => "invite",
            Self::Import => "import",
            Self::Sync => "sync",
        };
        f.write_str(s)
    }
}

/// What a role may do within one module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleAccess {
    /// May create records.
    #[serde(default)]
    pub create: bool,
    /// May read records.
    #[serde(default)]
    pub read: bool,
    /// May update records.
    #[serde(default)]
    pub update: bool,
    /// May delete records.
    #[serde(default)]
    pub delete: bool,
    /// Non-CRUD actions granted on the module.
    #[serde(default)]
    pub actions: BTreeSet<Action>,
}

impl ModuleAccess {
    /// Full CRUD plus the given extra actions.
    pub fn full(actions: impl IntoIterator<Item = Action>) -> Self {
        Self {
            create: true,
            read: true,
            update: true,
            delete: true,
            actions: actions.into_iter().collect(),
        }
    }

    /// Read-only access.
    pub fn read_only() -> Self {
        Self {
            read: true,
            ..Self::default()
        }
    }

    /// Whether `action` is granted.
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Create => self.create,
            Action::Read => self.read,
            Action::Update => self.update,
            Action::Delete => self.delete,
            other => self.actions.contains(&other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_key_roundtrip() {
        for module in Module::ALL {
            assert_eq!(module.key().parse::<Module>().unwrap(), module);
        }
        assert!("billing".parse::<Module>().is_err());
    }

    #[test]
    fn test_access_checks_crud_and_actions() {
        let access = ModuleAccess {
            read: true,
            actions: [Action::Import].into_iter().collect(),
            ..ModuleAccess::default()
        };
        assert!(access.allows(Action::Read));
        assert!(!access.allows(Action::Update));
        assert!(access.allows(Action::Import));
        assert!(!access.allows(Action::Sync));
    }
}
