use super::principal::{Principal, Role};

/// What a protected route demands before it will render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy<'a> {
    /// Any signed-in principal may pass.
    RequiresAuth,
    /// Only principals whose role appears in the set may pass.
    RequiresRole(&'a [Role]),
}

/// Outcome of a guarded navigation. A failed check is a redirect,
/// never an error and never a partially rendered view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    RedirectLogin,
    RedirectHome,
}

impl Access {
    pub fn is_granted(&self) -> bool {
        matches!(self, Access::Granted)
    }
}

/// Evaluate `policy` against the current principal, if any.
///
/// A missing principal always lands on the login page. An authenticated
/// principal whose role falls outside the required set is sent there too,
/// matching what the authoring routes do.
pub fn check_access(policy: AccessPolicy<'_>, principal: Option<&Principal>) -> Access {
    let Some(p) = principal else {
        return Access::RedirectLogin;
    };
    match policy {
        AccessPolicy::RequiresAuth => Access::Granted,
        AccessPolicy::RequiresRole(roles) => {
            if roles.contains(&p.role) {
                Access::Granted
            } else {
                Access::RedirectLogin
            }
        }
    }
}

/// One dashboard per role. The viewer role renders the reader dashboard;
/// the remaining roles map to the dashboard of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dashboard {
    Reader,
    Journalist,
    Organization,
    Admin,
}

impl Dashboard {
    /// Dashboard selection is total over the role set. Adding a role without
    /// deciding its dashboard is a compile error, not a blank page.
    pub fn for_role(role: Role) -> Dashboard {
        match role {
            Role::Viewer => Dashboard::Reader,
            Role::Journalist => Dashboard::Journalist,
            Role::Organization => Dashboard::Organization,
            Role::Admin => Dashboard::Admin,
        }
    }

    pub fn view_id(&self) -> &'static str {
        match self {
            Dashboard::Reader => "reader-dashboard",
            Dashboard::Journalist => "journalist-dashboard",
            Dashboard::Organization => "organization-dashboard",
            Dashboard::Admin => "admin-dashboard",
        }
    }
}

/// Where the dashboard route sends the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardRoute {
    View(Dashboard),
    RedirectLogin,
    RedirectHome,
}

/// Resolve the dashboard for the current session. Signed-out callers go to
/// the login page; everyone else gets exactly one dashboard.
pub fn resolve_dashboard(principal: Option<&Principal>) -> DashboardRoute {
    match principal {
        Some(p) => DashboardRoute::View(Dashboard::for_role(p.role)),
        None => DashboardRoute::RedirectLogin,
    }
}

/// Resolve a dashboard from an untrusted role label, e.g. one read back from
/// a stored profile. Labels outside the known set are treated the same as a
/// broken session and sent home rather than to any dashboard.
pub fn resolve_dashboard_label(label: &str) -> DashboardRoute {
    match label.parse::<Role>() {
        Ok(role) => DashboardRoute::View(Dashboard::for_role(role)),
        Err(_) => DashboardRoute::RedirectHome,
    }
}
