//! Capability gate for bot commands.

use std::collections::{HashMap, HashSet};

use crate::domain::UserId;

pub const TRANSCRIPT: &str = "transcript";
pub const LIST: &str = "list";

/// Who holds a capability.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Grant {
    Everyone,
    Users(HashSet<UserId>),
}

impl Grant {
    /// Parse `*` or a comma separated list of user ids. Malformed ids are skipped.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw == "*" {
            return Grant::Everyone;
        }
        let users = raw
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse::<i64>().ok())
            .map(UserId)
            .collect();
        Grant::Users(users)
    }

    fn allows(&self, user: UserId) -> bool {
        match self {
            Grant::Everyone => true,
            Grant::Users(users) => users.contains(&user),
        }
    }
}

/// Permission table keyed by capability name.
#[derive(Clone, Debug, Default)]
pub struct PermissionTable {
    grants: HashMap<String, Grant>,
}

impl PermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, capability: &str, grant: Grant) -> Self {
        self.insert(capability, grant);
        self
    }

    pub fn insert(&mut self, capability: &str, grant: Grant) {
        self.grants.insert(capability.to_string(), grant);
    }

    pub fn get(&self, capability: &str) -> Option<&Grant> {
        self.grants.get(capability)
    }
}

/// Outcome of one permission lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermissionDecision {
    pub capability: String,
    pub granted: bool,
}

/// Pure lookup against the injected table. A capability without an entry is denied.
#[derive(Clone, Debug)]
pub struct PermissionChecker {
    table: PermissionTable,
}

impl PermissionChecker {
    pub fn new(table: PermissionTable) -> Self {
        Self { table }
    }

    pub fn has_permission(&self, caller: UserId, capability: &str) -> bool {
        self.table
            .get(capability)
            .map(|grant| grant.allows(caller))
            .unwrap_or(false)
    }

    pub fn check(&self, caller: UserId, capability: &str) -> PermissionDecision {
        PermissionDecision {
            capability: capability.to_string(),
            granted: self.has_permission(caller, capability),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_grants_everyone() {
        let checker =
            PermissionChecker::new(PermissionTable::new().with(TRANSCRIPT, Grant::parse("*")));
        assert!(checker.has_permission(UserId(1), TRANSCRIPT));
        assert!(checker.has_permission(UserId(-5), TRANSCRIPT));
    }

    #[test]
    fn user_list_grants_only_listed_users() {
        let table = PermissionTable::new().with(LIST, Grant::parse(" 10, x, 20 ,"));
        let checker = PermissionChecker::new(table);
        assert!(checker.has_permission(UserId(10), LIST));
        assert!(checker.has_permission(UserId(20), LIST));
        assert!(!checker.has_permission(UserId(30), LIST));
    }

    #[test]
    fn missing_capability_is_denied() {
        let checker = PermissionChecker::new(PermissionTable::new());
        let decision = checker.check(UserId(1), TRANSCRIPT);
        assert_eq!(decision.capability, TRANSCRIPT);
        assert!(!decision.granted);
    }

    #[test]
    fn empty_list_grants_nobody() {
        assert_eq!(Grant::parse(""), Grant::Users(HashSet::new()));
    }
}
