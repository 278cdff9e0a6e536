//! Employee roles.
//!
//! These must match the seed data in the `employee_roles` lookup table.

use crate::status::define_status_enum;

define_status_enum! {
    /// Coarse role carried on every employee row.
    EmployeeRole {
        Administrator = 1 => "Administrator",
        Officer = 2 => "Officer",
        Staff = 3 => "Staff",
    }
}

impl EmployeeRole {
    /// Administrators may manage access controls for other employees.
    pub fn can_manage_access(self) -> bool {
        matches!(self, EmployeeRole::Administrator)
    }
}
