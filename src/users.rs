//! Username resolution with per-uid caching.

use std::collections::HashMap;

/// Resolves numeric user ids to account names and back.
pub trait UserLookup {
    fn name_by_uid(&self, uid: u32) -> Option<String>;
    fn uid_by_name(&self, name: &str) -> Option<u32>;
}

/// The system account database, through the password interface.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemUsers;

impl SystemUsers {
    pub fn new() -> Self {
        Self
    }
}

impl UserLookup for SystemUsers {
    fn name_by_uid(&self, uid: u32) -> Option<String> {
        nix::unistd::User::from_uid(nix::unistd::Uid::from_raw(uid))
            .ok()
            .flatten()
            .map(|user| user.name)
    }

    fn uid_by_name(&self, name: &str) -> Option<u32> {
        nix::unistd::User::from_name(name)
            .ok()
            .flatten()
            .map(|user| user.uid.as_raw())
    }
}

/// Fixed-table lookup for tests.
#[derive(Debug, Default, Clone)]
pub struct MockUsers {
    names: HashMap<u32, String>,
}

impl MockUsers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: &[(u32, &str)]) -> Self {
        Self {
            names: entries
                .iter()
                .map(|&(uid, name)| (uid, name.to_string()))
                .collect(),
        }
    }
}

impl UserLookup for MockUsers {
    fn name_by_uid(&self, uid: u32) -> Option<String> {
        self.names.get(&uid).cloned()
    }

    fn uid_by_name(&self, name: &str) -> Option<u32> {
        self.names
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(&uid, _)| uid)
    }
}

/// Caching front end used by the renderer.
///
/// A uid that fails to resolve displays as `#<uid>`; the miss is cached so
/// the database is asked once per uid, not once per process.
pub struct UserTable<U: UserLookup> {
    lookup: U,
    cache: HashMap<u32, Option<String>>,
}

impl<U: UserLookup> UserTable<U> {
    pub fn new(lookup: U) -> Self {
        Self {
            lookup,
            cache: HashMap::new(),
        }
    }

    /// Display name for a uid: the account name, or `#<uid>`.
    pub fn display(&mut self, uid: u32) -> String {
        let Self { lookup, cache } = self;
        match cache.entry(uid).or_insert_with(|| lookup.name_by_uid(uid)) {
            Some(name) => name.clone(),
            None => format!("#{}", uid),
        }
    }

    pub fn uid_for(&self, name: &str) -> Option<u32> {
        self.lookup.uid_by_name(name)
    }
}
