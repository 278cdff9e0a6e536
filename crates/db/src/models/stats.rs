//! Aggregate rows returned by the statistics queries.

use cellblock_core::status::StatusId;
use serde::Serialize;
use sqlx::FromRow;

/// Number of rows per lookup id (status, severity, role).
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct StatusCount {
    pub status_id: StatusId,
    pub count: i64,
}

/// Look up the count for one id, defaulting to zero when absent.
pub fn count_for(counts: &[StatusCount], status_id: impl Into<StatusId>) -> i64 {
    let status_id = status_id.into();
    counts
        .iter()
        .find(|c| c.status_id == status_id)
        .map_or(0, |c| c.count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellblock_core::status::VisitStatus;

    #[test]
    fn count_for_defaults_to_zero() {
        let counts = vec![StatusCount {
            status_id: VisitStatus::Scheduled.id(),
            count: 3,
        }];
        assert_eq!(count_for(&counts, VisitStatus::Scheduled), 3);
        assert_eq!(count_for(&counts, VisitStatus::Completed), 0);
    }
}
