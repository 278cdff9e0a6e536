//! Permission levels, the module catalogue, and the grant evaluation rules.
//!
//! Access is granted per (employee, module) pair. Levels form the hierarchy
//! `View < Edit < Full`; holding a higher level implies every lower one.
//! `None` is an explicit "no access" grant and never satisfies a check.

use crate::status::define_status_enum;
use crate::types::Date;

define_status_enum! {
    /// Permission level stored on an access-control row.
    PermissionLevel {
        None = 1 => "None",
        View = 2 => "View",
        Edit = 3 => "Edit",
        Full = 4 => "Full",
    }
}

impl PermissionLevel {
    /// Whether a grant at this level satisfies a check for `required`.
    pub fn satisfies(self, required: PermissionLevel) -> bool {
        match (self, required) {
            (_, PermissionLevel::None) | (PermissionLevel::None, _) => false,
            (granted, required) => granted.id() >= required.id(),
        }
    }
}

// ---------------------------------------------------------------------------
// Module catalogue
// ---------------------------------------------------------------------------

pub const MODULE_PRISONERS: &str = "Prisoners";
pub const MODULE_CELLS: &str = "Cells";
pub const MODULE_EMPLOYEES: &str = "Employees";
pub const MODULE_VISITORS: &str = "Visitors";
pub const MODULE_VISITS: &str = "Visits";
pub const MODULE_TASKS: &str = "Tasks";
pub const MODULE_GUARD_DUTIES: &str = "Guard Duties";
pub const MODULE_SECURITY: &str = "Security";
pub const MODULE_ACCESS_CONTROL: &str = "Access Control";
pub const MODULE_EMERGENCY: &str = "Emergency Procedures";
pub const MODULE_REPORTS: &str = "Reports";

/// All modules that may appear on an access-control row.
pub const VALID_MODULES: &[&str] = &[
    MODULE_PRISONERS,
    MODULE_CELLS,
    MODULE_EMPLOYEES,
    MODULE_VISITORS,
    MODULE_VISITS,
    MODULE_TASKS,
    MODULE_GUARD_DUTIES,
    MODULE_SECURITY,
    MODULE_ACCESS_CONTROL,
    MODULE_EMERGENCY,
    MODULE_REPORTS,
];

/// Validate that a module name is one of the catalogued modules.
pub fn validate_module(module: &str) -> Result<(), String> {
    if VALID_MODULES.contains(&module) {
        Ok(())
    } else {
        Err(format!(
            "Unknown module '{module}'. Must be one of: {}",
            VALID_MODULES.join(", ")
        ))
    }
}

// ---------------------------------------------------------------------------
// Expiry
// ---------------------------------------------------------------------------

/// A grant expires once its `expires_on` date lies strictly before `today`.
///
/// A grant expiring today is still honoured for the rest of that day.
pub fn is_expired(expires_on: Option<Date>, today: Date) -> bool {
    expires_on.is_some_and(|d| d < today)
}

/// Evaluate a stored grant against a required level.
///
/// Fails closed: inactive or expired grants deny every level.
pub fn grant_allows(
    granted: PermissionLevel,
    is_active: bool,
    expires_on: Option<Date>,
    required: PermissionLevel,
    today: Date,
) -> bool {
    is_active && !is_expired(expires_on, today) && granted.satisfies(required)
}
