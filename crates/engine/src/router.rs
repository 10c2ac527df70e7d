//! Role/status view router.
//!
//! [`resolve`] is the application's central state machine: a pure function
//! from session flags to exactly one top-level view. The evaluation order
//! is the contract - first match wins, and reordering the arms changes
//! user-visible behavior:
//!
//! 1. Onboarding pending (logged in, not complete, not administrator)
//! 2. Deactivated account (logged in, inactive, not administrator)
//! 3. Administrator with the admin-view toggle: manager preview or admin panel
//! 4. Manager
//! 5. Any other logged-in account
//! 6. Public site
//!
//! The maintenance overlay is applied separately by [`gated`] so the
//! routing function itself stays independent of the gate's state.

use std::sync::atomic::{AtomicBool, Ordering};

use upgrow_core::Role;

/// Top-level views the panel can present.
///
/// [`resolve`] yields every variant except [`AppView::Maintenance`], which
/// only [`gated`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppView {
    Onboarding,
    Deactivated,
    AdminPanel,
    ManagerPanel,
    CustomerPanel,
    PublicSite,
    Maintenance,
}

/// Inputs to the routing decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteInputs {
    pub logged_in: bool,
    pub onboarding_complete: bool,
    pub account_active: bool,
    pub role: Option<Role>,
    /// Administrator's admin-view toggle (defaults on).
    pub admin_view: bool,
    /// Process-wide manager-preview toggle, cleared on logout.
    pub manager_preview: bool,
}

/// Select the view for the given session flags. First match wins.
#[must_use]
pub fn resolve(inputs: &RouteInputs) -> AppView {
    let is_admin = inputs.role == Some(Role::Administrator);

    if inputs.logged_in && !inputs.onboarding_complete && !is_admin {
        return AppView::Onboarding;
    }
    if inputs.logged_in && !inputs.account_active && !is_admin {
        return AppView::Deactivated;
    }
    if is_admin && inputs.admin_view {
        return if inputs.manager_preview {
            AppView::ManagerPanel
        } else {
            AppView::AdminPanel
        };
    }
    if inputs.role == Some(Role::Manager) {
        return AppView::ManagerPanel;
    }
    if inputs.logged_in {
        return AppView::CustomerPanel;
    }
    AppView::PublicSite
}

/// Overlay the maintenance gate on a routed view.
///
/// Administrators bypass maintenance; everyone else, including visitors,
/// sees the maintenance page while the flag is set.
#[must_use]
pub const fn gated(view: AppView, maintenance: bool, role: Option<Role>) -> AppView {
    if maintenance && !matches!(role, Some(Role::Administrator)) {
        AppView::Maintenance
    } else {
        view
    }
}

/// Shared view toggles, injectable where a routing decision is made.
///
/// The manager preview lets an administrator inspect the manager
/// experience without logging out. Both toggles are process-wide, not
/// per-identity, and return to defaults on logout.
#[derive(Debug)]
pub struct ViewToggles {
    admin_view: AtomicBool,
    manager_preview: AtomicBool,
}

impl Default for ViewToggles {
    fn default() -> Self {
        Self {
            admin_view: AtomicBool::new(true),
            manager_preview: AtomicBool::new(false),
        }
    }
}

impl ViewToggles {
    /// Whether the administrator sees the admin panel (vs the customer
    /// experience).
    #[must_use]
    pub fn admin_view(&self) -> bool {
        self.admin_view.load(Ordering::Relaxed)
    }

    pub fn set_admin_view(&self, on: bool) {
        self.admin_view.store(on, Ordering::Relaxed);
    }

    /// Whether an administrator is previewing the manager experience.
    #[must_use]
    pub fn manager_preview(&self) -> bool {
        self.manager_preview.load(Ordering::Relaxed)
    }

    pub fn set_manager_preview(&self, on: bool) {
        self.manager_preview.store(on, Ordering::Relaxed);
    }

    /// Restore defaults. Called on logout.
    pub fn reset(&self) {
        self.admin_view.store(true, Ordering::Relaxed);
        self.manager_preview.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn logged_in(role: Role) -> RouteInputs {
        RouteInputs {
            logged_in: true,
            onboarding_complete: true,
            account_active: true,
            role: Some(role),
            admin_view: true,
            manager_preview: false,
        }
    }

    #[test]
    fn test_onboarding_takes_precedence() {
        // Any non-administrator with pending onboarding lands on
        // Onboarding, regardless of every other flag.
        for role in [Role::Customer, Role::Manager] {
            for account_active in [true, false] {
                let inputs = RouteInputs {
                    onboarding_complete: false,
                    account_active,
                    ..logged_in(role)
                };
                assert_eq!(resolve(&inputs), AppView::Onboarding);
            }
        }
    }

    #[test]
    fn test_admin_skips_onboarding() {
        let inputs = RouteInputs {
            onboarding_complete: false,
            ..logged_in(Role::Administrator)
        };
        assert_eq!(resolve(&inputs), AppView::AdminPanel);
    }

    #[test]
    fn test_deactivated_customer() {
        // Deactivation wins even with onboarding complete.
        let inputs = RouteInputs {
            account_active: false,
            ..logged_in(Role::Customer)
        };
        assert_eq!(resolve(&inputs), AppView::Deactivated);
    }

    #[test]
    fn test_deactivated_does_not_apply_to_admin() {
        let inputs = RouteInputs {
            account_active: false,
            ..logged_in(Role::Administrator)
        };
        assert_eq!(resolve(&inputs), AppView::AdminPanel);
    }

    #[test]
    fn test_admin_toggles() {
        let inputs = logged_in(Role::Administrator);
        assert_eq!(resolve(&inputs), AppView::AdminPanel);

        let inputs = RouteInputs {
            manager_preview: true,
            ..logged_in(Role::Administrator)
        };
        assert_eq!(resolve(&inputs), AppView::ManagerPanel);

        // Toggle off: the administrator sees the customer experience.
        let inputs = RouteInputs {
            admin_view: false,
            ..logged_in(Role::Administrator)
        };
        assert_eq!(resolve(&inputs), AppView::CustomerPanel);
    }

    #[test]
    fn test_manager_panel() {
        assert_eq!(resolve(&logged_in(Role::Manager)), AppView::ManagerPanel);
    }

    #[test]
    fn test_customer_panel() {
        assert_eq!(resolve(&logged_in(Role::Customer)), AppView::CustomerPanel);
    }

    #[test]
    fn test_public_site_when_logged_out() {
        assert_eq!(resolve(&RouteInputs::default()), AppView::PublicSite);
    }

    #[test]
    fn test_gated_overlays_for_non_admins() {
        assert_eq!(
            gated(AppView::CustomerPanel, true, Some(Role::Customer)),
            AppView::Maintenance
        );
        assert_eq!(gated(AppView::PublicSite, true, None), AppView::Maintenance);
        assert_eq!(
            gated(AppView::AdminPanel, true, Some(Role::Administrator)),
            AppView::AdminPanel
        );
        assert_eq!(
            gated(AppView::CustomerPanel, false, Some(Role::Customer)),
            AppView::CustomerPanel
        );
    }

    #[test]
    fn test_view_toggles_reset() {
        let toggles = ViewToggles::default();
        toggles.set_admin_view(false);
        toggles.set_manager_preview(true);

        toggles.reset();
        assert!(toggles.admin_view());
        assert!(!toggles.manager_preview());
    }
}
