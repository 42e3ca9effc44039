//! Central identity and session management for TruthTrack.
//! Keep the public surface thin and split implementation across sub-modules.

mod authorizer;
mod principal;
mod registry;
mod session;

pub use authorizer::{
    check_access, resolve_dashboard, resolve_dashboard_label, Access, AccessPolicy, Dashboard,
    DashboardRoute,
};
pub use principal::{Principal, Profile, Role, UnknownRole};
pub use registry::{CredentialEntry, CredentialRegistry};
pub use session::SessionStore;
