use parking_lot::RwLock;

use crate::tprintln;

use super::principal::{Principal, Role};
use super::registry::CredentialRegistry;

/// Single-session store: at most one principal is "current" at a time.
///
/// The store is an explicit object handed to its consumers (route guards,
/// header rendering, dashboard dispatch) rather than process-global state, so
/// it can be constructed and exercised in isolation. Interior mutability via
/// `RwLock` serializes concurrent `login`/`logout`; the last writer wins.
#[derive(Debug)]
pub struct SessionStore {
    registry: CredentialRegistry,
    current: RwLock<Option<Principal>>,
}

impl SessionStore {
    pub fn new(registry: CredentialRegistry) -> Self {
        Self { registry, current: RwLock::new(None) }
    }

    /// Store backed by the predefined test users.
    pub fn with_test_users() -> Self {
        Self::new(CredentialRegistry::test_users())
    }

    /// Check a credential pair against the registry. On a match the principal
    /// becomes current and `true` is returned; on any mismatch the slot is
    /// left untouched and `false` is returned. Bad credentials are an expected
    /// outcome for callers to message, never an error.
    pub fn login(&self, email: &str, password: &str) -> bool {
        match self.registry.verify(email, password) {
            Some(principal) => {
                let principal = principal.clone();
                tprintln!("session.login user={} role={}", principal.email, principal.role.as_str());
                *self.current.write() = Some(principal);
                true
            }
            None => {
                tprintln!("session.login rejected email={}", email.trim().to_lowercase());
                false
            }
        }
    }

    /// Clear the current principal. Idempotent: logging out while logged out
    /// is a no-op.
    pub fn logout(&self) {
        let mut slot = self.current.write();
        if let Some(p) = slot.take() {
            tprintln!("session.logout user={}", p.email);
        }
    }

    pub fn current_principal(&self) -> Option<Principal> {
        self.current.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.read().is_some()
    }

    /// Role of the current principal, if any. Convenience for conditional
    /// rendering and guard checks.
    pub fn role(&self) -> Option<Role> {
        self.current.read().as_ref().map(|p| p.role)
    }

    /// Number of identities the backing registry can authenticate.
    pub fn registered(&self) -> usize {
        self.registry.len()
    }
}
