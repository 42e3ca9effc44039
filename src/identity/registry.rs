use std::collections::HashMap;

use super::principal::{Principal, Profile, Role};

/// One registry row: the plaintext password and the principal it unlocks.
#[derive(Debug, Clone)]
pub struct CredentialEntry {
    pub password: String,
    pub principal: Principal,
}

/// Static credential table keyed by lower-cased email.
///
/// This is a development stand-in, not a credential store: passwords are held
/// and compared as plaintext test fixtures, with no hashing, lockout, or rate
/// limiting. Email lookup is case-insensitive; the password comparison is an
/// exact, case-sensitive string match. At most one entry exists per email.
#[derive(Debug, Clone, Default)]
pub struct CredentialRegistry {
    entries: HashMap<String, CredentialEntry>,
}

impl CredentialRegistry {
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Insert or replace the entry for an email. The key is normalized to
    /// lowercase so later lookups are case-insensitive.
    pub fn insert(&mut self, email: &str, password: &str, principal: Principal) {
        self.entries.insert(
            email.trim().to_lowercase(),
            CredentialEntry { password: password.to_string(), principal },
        );
    }

    pub fn lookup(&self, email: &str) -> Option<&CredentialEntry> {
        self.entries.get(&email.trim().to_lowercase())
    }

    /// Check a credential pair. Returns the principal on an exact password
    /// match, `None` for everything else (unknown email included).
    pub fn verify(&self, email: &str, password: &str) -> Option<&Principal> {
        match self.lookup(email) {
            Some(entry) if entry.password == password => Some(&entry.principal),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The four predefined test users, one per role.
    pub fn test_users() -> Self {
        let mut reg = Self::new();
        reg.insert(
            "reader@test.com",
            "reader123",
            Principal {
                id: "1".into(),
                name: "John Reader".into(),
                email: "reader@test.com".into(),
                role: Role::Viewer,
                profile: Profile {
                    avatar: Some("https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=100".into()),
                    ..Default::default()
                },
            },
        );
        reg.insert(
            "journalist@test.com",
            "journalist123",
            Principal {
                id: "2".into(),
                name: "Sarah Mitchell".into(),
                email: "journalist@test.com".into(),
                role: Role::Journalist,
                profile: Profile {
                    avatar: Some("https://images.unsplash.com/photo-1494790108377-be9c29b29330?w=100".into()),
                    organization: Some("Climate Watch Network".into()),
                    license_number: Some("PL-2024-12345".into()),
                    ..Default::default()
                },
            },
        );
        reg.insert(
            "org@test.com",
            "org123",
            Principal {
                id: "3".into(),
                name: "Global News Admin".into(),
                email: "org@test.com".into(),
                role: Role::Organization,
                profile: Profile {
                    avatar: Some("https://images.unsplash.com/photo-1560250097-0b93528c311a?w=100".into()),
                    organization: Some("Global News Network".into()),
                    ..Default::default()
                },
            },
        );
        reg.insert(
            "admin@test.com",
            "admin123",
            Principal {
                id: "4".into(),
                name: "Root Administrator".into(),
                email: "admin@test.com".into(),
                role: Role::Admin,
                profile: Profile {
                    avatar: Some("https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=100".into()),
                    ..Default::default()
                },
            },
        );
        reg
    }
}
