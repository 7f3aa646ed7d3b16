//! Navigation and route guard commands.

use tienda_console::navigation::ADMIN_NAV;
use tienda_console::{AppError, AppState, Result};
use tienda_core::{GuardDecision, NavItem, RoleSet, visible_nav};

/// Print the admin menu for the signed-in user, or for `roles` if given.
pub async fn menu(state: &mut AppState, roles: Option<&str>) -> Result<()> {
    let items: Vec<&NavItem> = match roles {
        Some(list) => {
            let roles =
                RoleSet::parse_list(list).map_err(|e| AppError::BadRequest(e.to_string()))?;
            visible_nav(ADMIN_NAV, &roles)
        }
        None => {
            state.resolve_session().await;
            state.navigation()
        }
    };

    if items.is_empty() {
        println!("No menu entries");
    }
    for item in items {
        println!("{:<22} {}", item.path, item.label);
    }
    Ok(())
}

/// Print the guard decision for `path`.
pub async fn guard(state: &mut AppState, path: &str) {
    state.resolve_session().await;
    match state.guard_route(path) {
        GuardDecision::Pending => println!("pending"),
        GuardDecision::Allow => println!("allow"),
        GuardDecision::RedirectToLogin(to) => println!("redirect to login: {to}"),
        GuardDecision::Redirect(to) => println!("redirect: {to}"),
    }
}
