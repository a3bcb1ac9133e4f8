//! Route protection for portal views.
//!
//! [`evaluate`] is a pure function of the caller's role, their onboarding
//! flag and the route's declaration. It is re-run for every navigation;
//! there is no state to invalidate.

use serde::Serialize;

use crate::roles::Role;

pub const PUBLIC_HOME: &str = "/";
pub const ONBOARDING_PATH: &str = "/onboarding";
pub const ADMIN_HOME: &str = "/admin";
pub const ANALYTICS_HOME: &str = "/admin/analytics";
pub const FELLOW_HOME: &str = "/house";
pub const ALUMNI_HOME: &str = "/alumni";

/// Access declaration attached to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouteAccess {
    pub required_roles: &'static [Role],
    pub require_onboarding: bool,
}

impl RouteAccess {
    pub const PUBLIC: RouteAccess = RouteAccess {
        required_roles: &[],
        require_onboarding: false,
    };

    pub const fn roles(required_roles: &'static [Role], require_onboarding: bool) -> Self {
        Self {
            required_roles,
            require_onboarding,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    Allow,
    Redirect { to: &'static str },
}

/// Landing view for a role that hit a route it may not see.
pub fn home_for(role: Option<Role>) -> &'static str {
    match role {
        Some(Role::Admin | Role::SuperAdmin) => ADMIN_HOME,
        Some(Role::Analyst) => ANALYTICS_HOME,
        Some(Role::Fellow) => FELLOW_HOME,
        Some(Role::Alumni) => ALUMNI_HOME,
        None => PUBLIC_HOME,
    }
}

/// Decide whether the caller may view a route. First matching rule wins:
///
/// 1. Onboarding routes send non-admins without a completed profile to
///    onboarding.
/// 2. Routes without role requirements are open.
/// 3. A listed role is let through.
/// 4. Everyone else goes to their role's home.
///
/// `onboarding_completed` is `None` when the caller has no profile.
pub fn evaluate(
    role: Option<Role>,
    onboarding_completed: Option<bool>,
    access: &RouteAccess,
) -> GuardDecision {
    if access.require_onboarding
        && role != Some(Role::Admin)
        && !onboarding_completed.unwrap_or(false)
    {
        return GuardDecision::Redirect {
            to: ONBOARDING_PATH,
        };
    }

    if access.required_roles.is_empty() {
        return GuardDecision::Allow;
    }

    if role.is_some_and(|r| access.required_roles.contains(&r)) {
        return GuardDecision::Allow;
    }

    GuardDecision::Redirect { to: home_for(role) }
}

// ---------------------------------------------------------------------------
// Route table
// ---------------------------------------------------------------------------

const STAFF: &[Role] = &[Role::Admin, Role::SuperAdmin];
const STAFF_AND_ANALYSTS: &[Role] = &[Role::Admin, Role::SuperAdmin, Role::Analyst];
const FELLOWS: &[Role] = &[Role::Fellow];
const ALUMNI: &[Role] = &[Role::Alumni];

/// One entry of the path table. A pattern ending in `/*` matches the
/// prefix itself and everything below it.
#[derive(Debug, Clone, Copy)]
pub struct RouteEntry {
    pub pattern: &'static str,
    pub access: RouteAccess,
}

/// Externally visible paths and their protection. Order matters: the first
/// matching pattern wins, so specific paths precede wildcards.
pub const ROUTE_TABLE: &[RouteEntry] = &[
    RouteEntry { pattern: "/", access: RouteAccess::PUBLIC },
    RouteEntry { pattern: "/mentors", access: RouteAccess::PUBLIC },
    RouteEntry { pattern: "/faq", access: RouteAccess::PUBLIC },
    RouteEntry { pattern: "/perks", access: RouteAccess::PUBLIC },
    RouteEntry { pattern: "/apply", access: RouteAccess::PUBLIC },
    RouteEntry { pattern: "/onboarding", access: RouteAccess::PUBLIC },
    RouteEntry { pattern: "/admin/analytics", access: RouteAccess::roles(STAFF_AND_ANALYSTS, false) },
    RouteEntry { pattern: "/admin/applications", access: RouteAccess::roles(STAFF, false) },
    RouteEntry { pattern: "/admin/opportunities", access: RouteAccess::roles(STAFF, false) },
    RouteEntry { pattern: "/admin/events", access: RouteAccess::roles(STAFF, false) },
    RouteEntry { pattern: "/admin/*", access: RouteAccess::roles(STAFF, false) },
    RouteEntry { pattern: "/house/*", access: RouteAccess::roles(FELLOWS, true) },
    RouteEntry { pattern: "/alumni/*", access: RouteAccess::roles(ALUMNI, true) },
];

fn pattern_matches(pattern: &str, path: &str) -> bool {
    match pattern.strip_suffix("/*") {
        Some(prefix) => {
            path == prefix
                || path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/'))
        }
        None => pattern == path,
    }
}

/// Page-view bucket for paths outside the route table.
pub const OTHER_PAGE: &str = "other";

/// First table entry matching `path`, ignoring query, fragment and a
/// trailing slash.
fn lookup(path: &str) -> Option<&'static RouteEntry> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };
    ROUTE_TABLE.iter().find(|entry| pattern_matches(entry.pattern, path))
}

/// Access declaration for `path`; unknown paths are public.
pub fn access_for_path(path: &str) -> RouteAccess {
    lookup(path).map(|entry| entry.access).unwrap_or(RouteAccess::PUBLIC)
}

/// Key a page view is counted under: the matching table pattern without
/// its `/*` suffix, or [`OTHER_PAGE`]. The set of keys is fixed, whatever
/// paths callers send.
pub fn page_view_key(path: &str) -> &'static str {
    match lookup(path) {
        Some(entry) => entry.pattern.strip_suffix("/*").unwrap_or(entry.pattern),
        None => OTHER_PAGE,
    }
}

/// Look up `path` in the route table and evaluate it for the caller.
pub fn guard_path(role: Option<Role>, onboarding_completed: Option<bool>, path: &str) -> GuardDecision {
    evaluate(role, onboarding_completed, &access_for_path(path))
}
