//! Admin navigation table.
//!
//! The same table drives the menu and the route guard, so a section can
//! never be visible in the menu but blocked by the guard (or the reverse).

use tienda_core::{NavItem, Role, RoleSet};

const STAFF: &[Role] = &[Role::Owner, Role::Admin];

/// Admin menu in display order.
pub const ADMIN_NAV: &[NavItem] = &[
    NavItem {
        path: "/admin",
        label: "Panel",
        roles: STAFF,
    },
    NavItem {
        path: "/admin/inventario",
        label: "Inventario",
        roles: &[Role::Owner, Role::Admin, Role::Inventario, Role::Repositor],
    },
    NavItem {
        path: "/admin/produccion",
        label: "Producción",
        roles: &[
            Role::Owner,
            Role::Admin,
            Role::Produccion,
            Role::Cortador,
            Role::Doblador,
        ],
    },
    NavItem {
        path: "/admin/ventas",
        label: "Ventas",
        roles: &[Role::Owner, Role::Admin, Role::Ventas],
    },
    NavItem {
        path: "/admin/contabilidad",
        label: "Contabilidad",
        roles: &[Role::Owner, Role::Admin, Role::Contador],
    },
    NavItem {
        path: "/admin/equipo",
        label: "Equipo",
        roles: STAFF,
    },
    NavItem {
        path: "/",
        label: "Tienda",
        roles: &Role::ALL,
    },
];

/// Routes below this prefix are guarded; the storefront is public.
pub const ADMIN_PREFIX: &str = "/admin";

fn is_under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// The nav entry guarding `path`.
///
/// Matches the entry's path exactly, or as a parent segment
/// (`/admin/ventas/42` is guarded by `/admin/ventas`). The longest match
/// wins. Paths outside [`ADMIN_PREFIX`] are not guarded.
#[must_use]
pub fn route_entry(path: &str) -> Option<&'static NavItem> {
    if !is_under(path, ADMIN_PREFIX) {
        return None;
    }
    ADMIN_NAV
        .iter()
        .filter(|item| is_under(path, item.path))
        .max_by_key(|item| item.path.len())
}

/// Roles required to open `path`, or `None` if it is not a guarded route.
#[must_use]
pub fn route_requirements(path: &str) -> Option<RoleSet> {
    route_entry(path).map(NavItem::required_roles)
}
