//! Closed enumerations mapping to SMALLSERIAL/SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding lookup table, and each label matches the seeded
//! `name` column. Conversions from raw ids go through `TryFrom<StatusId>`,
//! which rejects ids outside the seeded range.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Every variant in seed order.
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// Return the database lookup ID.
            pub fn id(self) -> $crate::status::StatusId {
                self as $crate::status::StatusId
            }

            /// Human-readable name as seeded in the lookup table.
            pub fn label(self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }
        }

        impl From<$name> for $crate::status::StatusId {
            fn from(value: $name) -> Self {
                value as $crate::status::StatusId
            }
        }

        impl TryFrom<$crate::status::StatusId> for $name {
            type Error = $crate::error::CoreError;

            fn try_from(value: $crate::status::StatusId) -> Result<Self, Self::Error> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.id() == value)
                    .ok_or_else(|| {
                        $crate::error::CoreError::Validation(format!(
                            "Unknown {} id {value}",
                            stringify!($name)
                        ))
                    })
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

pub(crate) use define_status_enum;

define_status_enum! {
    /// Custody status of a prisoner.
    PrisonerStatus {
        InCustody = 1 => "In Custody",
        Released = 2 => "Released",
        Transferred = 3 => "Transferred",
    }
}

define_status_enum! {
    /// Cell availability status.
    CellStatus {
        Vacant = 1 => "Vacant",
        Occupied = 2 => "Occupied",
        UnderMaintenance = 3 => "Under Maintenance",
    }
}

define_status_enum! {
    /// Cell security classification.
    SecurityLevel {
        Minimum = 1 => "Minimum",
        Medium = 2 => "Medium",
        Maximum = 3 => "Maximum",
    }
}

define_status_enum! {
    /// Visitor approval status.
    VisitorStatus {
        Pending = 1 => "Pending",
        Approved = 2 => "Approved",
        Banned = 3 => "Banned",
    }
}

define_status_enum! {
    /// Visit lifecycle status.
    VisitStatus {
        Scheduled = 1 => "Scheduled",
        InProgress = 2 => "In Progress",
        Completed = 3 => "Completed",
        Cancelled = 4 => "Cancelled",
    }
}

define_status_enum! {
    /// Task lifecycle status.
    TaskStatus {
        Pending = 1 => "Pending",
        InProgress = 2 => "In Progress",
        Completed = 3 => "Completed",
    }
}

define_status_enum! {
    /// Task urgency.
    TaskPriority {
        Low = 1 => "Low",
        Medium = 2 => "Medium",
        High = 3 => "High",
        Urgent = 4 => "Urgent",
    }
}

define_status_enum! {
    /// Security alert lifecycle status.
    AlertStatus {
        Active = 1 => "Active",
        Acknowledged = 2 => "Acknowledged",
        Resolved = 3 => "Resolved",
    }
}

define_status_enum! {
    /// Severity shared by security alerts and security logs.
    Severity {
        Low = 1 => "Low",
        Medium = 2 => "Medium",
        High = 3 => "High",
        Critical = 4 => "Critical",
    }
}

define_status_enum! {
    /// Guard duty lifecycle status.
    DutyStatus {
        Scheduled = 1 => "Scheduled",
        InProgress = 2 => "In Progress",
        Completed = 3 => "Completed",
    }
}

define_status_enum! {
    /// Security log review status.
    LogStatus {
        Open = 1 => "Open",
        Closed = 2 => "Closed",
    }
}

/// Derive the cell status implied by an occupancy count.
///
/// Cells under maintenance keep that status regardless of occupancy.
pub fn cell_status_for(current: CellStatus, occupancy: i32) -> CellStatus {
    match current {
        CellStatus::UnderMaintenance => CellStatus::UnderMaintenance,
        _ if occupancy > 0 => CellStatus::Occupied,
        _ => CellStatus::Vacant,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visit_status_ids_match_seed_data() {
        assert_eq!(VisitStatus::Scheduled.id(), 1);
        assert_eq!(VisitStatus::InProgress.id(), 2);
        assert_eq!(VisitStatus::Completed.id(), 3);
        assert_eq!(VisitStatus::Cancelled.id(), 4);
    }

    #[test]
    fn status_into_status_id() {
        let id: StatusId = AlertStatus::Acknowledged.into();
        assert_eq!(id, 2);
    }

    #[test]
    fn try_from_round_trips_known_ids() {
        for status in CellStatus::ALL {
            assert_eq!(CellStatus::try_from(status.id()).unwrap(), *status);
        }
    }

    #[test]
    fn try_from_rejects_unknown_ids() {
        let err = TaskStatus::try_from(9_i16).unwrap_err();
        assert!(err.to_string().contains("Unknown TaskStatus id 9"));
        assert!(Severity::try_from(0_i16).is_err());
    }

    #[test]
    fn labels_match_seed_names() {
        assert_eq!(PrisonerStatus::InCustody.label(), "In Custody");
        assert_eq!(CellStatus::UnderMaintenance.to_string(), "Under Maintenance");
    }

    #[test]
    fn cell_status_follows_occupancy() {
        assert_eq!(cell_status_for(CellStatus::Vacant, 1), CellStatus::Occupied);
        assert_eq!(cell_status_for(CellStatus::Occupied, 0), CellStatus::Vacant);
        assert_eq!(
            cell_status_for(CellStatus::UnderMaintenance, 2),
            CellStatus::UnderMaintenance
        );
    }
}
