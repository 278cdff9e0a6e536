//! Status state machines for visits, tasks, security alerts, and guard duties.
//!
//! This module lives in `core` (zero internal deps) so the repository layer
//! can turn a target status into the set of legal predecessor ids used in
//! conditional `UPDATE ... WHERE status_id = ANY($n)` statements.

use crate::status::{AlertStatus, DutyStatus, StatusId, TaskStatus, VisitStatus};

/// A closed status enumeration with a fixed transition table.
pub trait StateMachine: Copy + PartialEq + Into<StatusId> + std::fmt::Display + 'static {
    /// Entity name used in error messages.
    const ENTITY: &'static str;

    /// Every status in seed order.
    fn variants() -> &'static [Self];

    /// Statuses reachable in one step from `self`.
    fn valid_transitions(self) -> &'static [Self];

    /// Check whether a transition from `self` to `to` is valid.
    fn can_transition(self, to: Self) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Terminal statuses allow no further transitions.
    fn is_terminal(self) -> bool {
        self.valid_transitions().is_empty()
    }

    /// Lookup ids of every status from which `to` may be entered.
    fn predecessors(to: Self) -> Vec<StatusId> {
        Self::variants()
            .iter()
            .copied()
            .filter(|from| from.can_transition(to))
            .map(Into::into)
            .collect()
    }

    /// Validate a state transition, returning an error message for invalid ones.
    fn validate_transition(self, to: Self) -> Result<(), String> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(format!(
                "{} cannot move from '{self}' to '{to}'",
                Self::ENTITY
            ))
        }
    }
}

impl StateMachine for VisitStatus {
    const ENTITY: &'static str = "Visit";

    fn variants() -> &'static [Self] {
        VisitStatus::ALL
    }

    fn valid_transitions(self) -> &'static [Self] {
        match self {
            VisitStatus::Scheduled => &[VisitStatus::InProgress, VisitStatus::Cancelled],
            VisitStatus::InProgress => &[VisitStatus::Completed, VisitStatus::Cancelled],
            VisitStatus::Completed | VisitStatus::Cancelled => &[],
        }
    }
}

impl StateMachine for TaskStatus {
    const ENTITY: &'static str = "Task";

    fn variants() -> &'static [Self] {
        TaskStatus::ALL
    }

    fn valid_transitions(self) -> &'static [Self] {
        match self {
            // Small chores are often closed without ever being started.
            TaskStatus::Pending => &[TaskStatus::InProgress, TaskStatus::Completed],
            TaskStatus::InProgress => &[TaskStatus::Completed],
            TaskStatus::Completed => &[],
        }
    }
}

impl StateMachine for AlertStatus {
    const ENTITY: &'static str = "Security alert";

    fn variants() -> &'static [Self] {
        AlertStatus::ALL
    }

    fn valid_transitions(self) -> &'static [Self] {
        match self {
            AlertStatus::Active => &[AlertStatus::Acknowledged, AlertStatus::Resolved],
            AlertStatus::Acknowledged => &[AlertStatus::Resolved],
            AlertStatus::Resolved => &[],
        }
    }
}

impl StateMachine for DutyStatus {
    const ENTITY: &'static str = "Guard duty";

    fn variants() -> &'static [Self] {
        DutyStatus::ALL
    }

    fn valid_transitions(self) -> &'static [Self] {
        match self {
            DutyStatus::Scheduled => &[DutyStatus::InProgress],
            DutyStatus::InProgress => &[DutyStatus::Completed],
            DutyStatus::Completed => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visit_happy_path() {
        assert!(VisitStatus::Scheduled.can_transition(VisitStatus::InProgress));
        assert!(VisitStatus::InProgress.can_transition(VisitStatus::Completed));
    }

    #[test]
    fn visit_cancel_only_before_completion() {
        assert!(VisitStatus::Scheduled.can_transition(VisitStatus::Cancelled));
        assert!(VisitStatus::InProgress.can_transition(VisitStatus::Cancelled));
        assert!(!VisitStatus::Completed.can_transition(VisitStatus::Cancelled));
    }

    #[test]
    fn visit_cannot_skip_start() {
        assert!(!VisitStatus::Scheduled.can_transition(VisitStatus::Completed));
    }

    #[test]
    fn visit_predecessors_of_cancelled() {
        assert_eq!(
            VisitStatus::predecessors(VisitStatus::Cancelled),
            vec![VisitStatus::Scheduled.id(), VisitStatus::InProgress.id()]
        );
    }

    #[test]
    fn task_completion_from_pending_or_in_progress() {
        assert_eq!(
            TaskStatus::predecessors(TaskStatus::Completed),
            vec![TaskStatus::Pending.id(), TaskStatus::InProgress.id()]
        );
        assert!(!TaskStatus::Completed.can_transition(TaskStatus::InProgress));
    }

    #[test]
    fn alert_never_reverses() {
        assert!(!AlertStatus::Acknowledged.can_transition(AlertStatus::Active));
        assert!(!AlertStatus::Resolved.can_transition(AlertStatus::Acknowledged));
        assert!(AlertStatus::Resolved.is_terminal());
    }

    #[test]
    fn alert_resolve_allowed_from_active_and_acknowledged() {
        assert_eq!(
            AlertStatus::predecessors(AlertStatus::Resolved),
            vec![AlertStatus::Active.id(), AlertStatus::Acknowledged.id()]
        );
    }

    #[test]
    fn duty_is_strictly_linear() {
        assert_eq!(
            DutyStatus::predecessors(DutyStatus::InProgress),
            vec![DutyStatus::Scheduled.id()]
        );
        assert!(DutyStatus::predecessors(DutyStatus::Scheduled).is_empty());
    }

    #[test]
    fn validate_transition_names_states() {
        let err = AlertStatus::Resolved
            .validate_transition(AlertStatus::Resolved)
            .unwrap_err();
        assert_eq!(err, "Security alert cannot move from 'Resolved' to 'Resolved'");
        assert!(DutyStatus::Scheduled
            .validate_transition(DutyStatus::InProgress)
            .is_ok());
    }
}
