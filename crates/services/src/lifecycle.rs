//! Status transitions for visits, tasks, security alerts, and guard duties.
//!
//! Each transition is one conditional `UPDATE` that only matches rows whose
//! current status is a legal predecessor of the target. When nothing
//! matches, the row is re-read to report `NotFound` or a `Conflict` naming
//! both states.

use cellblock_core::error::CoreError;
use cellblock_core::lifecycle::StateMachine;
use cellblock_core::status::{
    AlertStatus, DutyStatus, PrisonerStatus, Severity, StatusId, TaskStatus, VisitStatus,
    VisitorStatus,
};
use cellblock_core::types::DbId;
use cellblock_db::models::guard_duty::{CreateGuardDuty, GuardDuty, GuardDutyReport};
use cellblock_db::models::security_alert::{CreateSecurityAlert, SecurityAlert};
use cellblock_db::models::task::{CreateTask, Task};
use cellblock_db::models::visit::{CreateVisit, Visit};
use cellblock_db::repositories::{
    GuardDutyRepo, PrisonerRepo, SecurityAlertRepo, TaskRepo, VisitRepo, VisitorRepo,
};
use cellblock_db::DbPool;
use chrono::Utc;
use validator::Validate;

use crate::error::{ServiceError, ServiceResult};

/// Build the error for a conditional transition that matched no row.
fn transition_error<S>(current: Option<StatusId>, id: DbId, to: S) -> ServiceError
where
    S: StateMachine + TryFrom<StatusId, Error = CoreError>,
{
    let Some(current) = current else {
        return CoreError::not_found(S::ENTITY, id).into();
    };
    let from = match S::try_from(current) {
        Ok(from) => from,
        Err(e) => return e.into(),
    };
    let message = from
        .validate_transition(to)
        .err()
        .unwrap_or_else(|| format!("{} {id} changed status concurrently", S::ENTITY));
    tracing::warn!(entity = S::ENTITY, id, %from, %to, "Transition rejected");
    CoreError::Conflict(message).into()
}

/// Drives the visit, task, alert, and duty state machines.
#[derive(Clone)]
pub struct StatusLifecycleManager {
    pool: DbPool,
}

impl StatusLifecycleManager {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    // -----------------------------------------------------------------------
    // Visits
    // -----------------------------------------------------------------------

    /// Schedule a visit for an approved visitor of an in-custody prisoner.
    pub async fn schedule_visit(&self, input: &CreateVisit) -> ServiceResult<Visit> {
        input.validate()?;

        let visitor = VisitorRepo::find_by_id(&self.pool, input.visitor_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Visitor", input.visitor_id))?;
        if visitor.prisoner_id != input.prisoner_id {
            return Err(CoreError::Validation(format!(
                "Visitor {} is not registered for prisoner {}",
                visitor.id, input.prisoner_id
            ))
            .into());
        }

        match VisitorStatus::try_from(visitor.status_id)? {
            VisitorStatus::Approved => {}
            status => {
                tracing::warn!(visitor_id = visitor.id, %status, "Visit refused");
                return Err(CoreError::Forbidden(format!(
                    "Visitor {} is {status} and may not visit",
                    visitor.id
                ))
                .into());
            }
        }

        let prisoner = PrisonerRepo::find_by_id(&self.pool, input.prisoner_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Prisoner", input.prisoner_id))?;
        if prisoner.status_id != PrisonerStatus::InCustody.id() {
            return Err(CoreError::Conflict(format!(
                "Prisoner {} is not in custody",
                prisoner.prisoner_number
            ))
            .into());
        }

        let visit = VisitRepo::create(&self.pool, input).await?;
        tracing::info!(
            visit_id = visit.id,
            visit_code = %visit.visit_code,
            prisoner_id = visit.prisoner_id,
            visitor_id = visit.visitor_id,
            "Visit scheduled"
        );
        Ok(visit)
    }

    pub async fn start_visit(&self, visit_id: DbId) -> ServiceResult<Visit> {
        match VisitRepo::mark_started(&self.pool, visit_id).await? {
            Some(visit) => {
                tracing::info!(visit_id, "Visit started");
                Ok(visit)
            }
            None => {
                let current = VisitRepo::find_by_id(&self.pool, visit_id).await?;
                Err(transition_error(
                    current.map(|v| v.status_id),
                    visit_id,
                    VisitStatus::InProgress,
                ))
            }
        }
    }

    /// Complete an in-progress visit and count it against the visitor.
    ///
    /// The visitor's `visit_count` and `last_visit_date` change in the same
    /// transaction as the visit status.
    pub async fn complete_visit(&self, visit_id: DbId, notes: Option<&str>) -> ServiceResult<Visit> {
        let mut tx = self.pool.begin().await?;

        let Some(visit) = VisitRepo::mark_completed(&mut *tx, visit_id, notes).await? else {
            let current = VisitRepo::find_by_id(&mut *tx, visit_id).await?;
            return Err(transition_error(
                current.map(|v| v.status_id),
                visit_id,
                VisitStatus::Completed,
            ));
        };

        let completed_on = visit.actual_end_at.unwrap_or_else(Utc::now).date_naive();
        let visitor = VisitorRepo::record_visit(&mut *tx, visit.visitor_id, completed_on)
            .await?
            .ok_or_else(|| CoreError::not_found("Visitor", visit.visitor_id))?;
        tx.commit().await?;

        tracing::info!(
            visit_id,
            visitor_id = visitor.id,
            visit_count = visitor.visit_count,
            "Visit completed"
        );
        Ok(visit)
    }

    pub async fn cancel_visit(&self, visit_id: DbId, reason: Option<&str>) -> ServiceResult<Visit> {
        match VisitRepo::mark_cancelled(&self.pool, visit_id, reason).await? {
            Some(visit) => {
                tracing::info!(visit_id, reason = ?reason, "Visit cancelled");
                Ok(visit)
            }
            None => {
                let current = VisitRepo::find_by_id(&self.pool, visit_id).await?;
                Err(transition_error(
                    current.map(|v| v.status_id),
                    visit_id,
                    VisitStatus::Cancelled,
                ))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    pub async fn assign_task(&self, input: &CreateTask) -> ServiceResult<Task> {
        input.validate()?;
        let task = TaskRepo::create(&self.pool, input, Utc::now().date_naive()).await?;
        tracing::info!(
            task_id = task.id,
            task_code = %task.task_code,
            assigned_to = ?task.assigned_to,
            "Task assigned"
        );
        Ok(task)
    }

    pub async fn start_task(&self, task_id: DbId) -> ServiceResult<Task> {
        match TaskRepo::mark_started(&self.pool, task_id).await? {
            Some(task) => {
                tracing::info!(task_id, "Task started");
                Ok(task)
            }
            None => {
                let current = TaskRepo::find_by_id(&self.pool, task_id).await?;
                Err(transition_error(
                    current.map(|t| t.status_id),
                    task_id,
                    TaskStatus::InProgress,
                ))
            }
        }
    }

    /// Complete a pending or in-progress task.
    pub async fn complete_task(
        &self,
        task_id: DbId,
        completed_by: DbId,
        notes: Option<&str>,
    ) -> ServiceResult<Task> {
        match TaskRepo::mark_completed(&self.pool, task_id, completed_by, notes).await? {
            Some(task) => {
                tracing::info!(task_id, completed_by, "Task completed");
                Ok(task)
            }
            None => {
                let current = TaskRepo::find_by_id(&self.pool, task_id).await?;
                Err(transition_error(
                    current.map(|t| t.status_id),
                    task_id,
                    TaskStatus::Completed,
                ))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Security alerts
    // -----------------------------------------------------------------------

    pub async fn raise_alert(&self, input: &CreateSecurityAlert) -> ServiceResult<SecurityAlert> {
        input.validate()?;
        let severity = Severity::try_from(input.severity_id)?;

        let alert = SecurityAlertRepo::create(&self.pool, input, Utc::now().date_naive()).await?;
        tracing::info!(
            alert_id = alert.id,
            alert_code = %alert.alert_code,
            %severity,
            location = %alert.location,
            "Security alert raised"
        );
        Ok(alert)
    }

    pub async fn acknowledge_alert(&self, alert_id: DbId, actor: DbId) -> ServiceResult<SecurityAlert> {
        match SecurityAlertRepo::mark_acknowledged(&self.pool, alert_id, actor).await? {
            Some(alert) => {
                tracing::info!(alert_id, actor, "Security alert acknowledged");
                Ok(alert)
            }
            None => {
                let current = SecurityAlertRepo::find_by_id(&self.pool, alert_id).await?;
                Err(transition_error(
                    current.map(|a| a.status_id),
                    alert_id,
                    AlertStatus::Acknowledged,
                ))
            }
        }
    }

    /// Resolve an active or acknowledged alert.
    pub async fn resolve_alert(
        &self,
        alert_id: DbId,
        actor: DbId,
        notes: Option<&str>,
    ) -> ServiceResult<SecurityAlert> {
        match SecurityAlertRepo::mark_resolved(&self.pool, alert_id, actor, notes).await? {
            Some(alert) => {
                tracing::info!(alert_id, actor, "Security alert resolved");
                Ok(alert)
            }
            None => {
                let current = SecurityAlertRepo::find_by_id(&self.pool, alert_id).await?;
                Err(transition_error(
                    current.map(|a| a.status_id),
                    alert_id,
                    AlertStatus::Resolved,
                ))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Guard duties
    // -----------------------------------------------------------------------

    pub async fn schedule_duty(&self, input: &CreateGuardDuty) -> ServiceResult<GuardDuty> {
        input.validate()?;
        let duty = GuardDutyRepo::create(&self.pool, input).await?;
        tracing::info!(
            duty_id = duty.id,
            duty_code = %duty.duty_code,
            employee_id = duty.employee_id,
            post = %duty.post,
            "Guard duty scheduled"
        );
        Ok(duty)
    }

    pub async fn start_duty(&self, duty_id: DbId) -> ServiceResult<GuardDuty> {
        match GuardDutyRepo::mark_started(&self.pool, duty_id).await? {
            Some(duty) => {
                tracing::info!(duty_id, "Guard duty started");
                Ok(duty)
            }
            None => {
                let current = GuardDutyRepo::find_by_id(&self.pool, duty_id).await?;
                Err(transition_error(
                    current.map(|d| d.status_id),
                    duty_id,
                    DutyStatus::InProgress,
                ))
            }
        }
    }

    pub async fn complete_duty(&self, duty_id: DbId, notes: Option<&str>) -> ServiceResult<GuardDuty> {
        match GuardDutyRepo::mark_completed(&self.pool, duty_id, notes).await? {
            Some(duty) => {
                tracing::info!(duty_id, "Guard duty completed");
                Ok(duty)
            }
            None => {
                let current = GuardDutyRepo::find_by_id(&self.pool, duty_id).await?;
                Err(transition_error(
                    current.map(|d| d.status_id),
                    duty_id,
                    DutyStatus::Completed,
                ))
            }
        }
    }

    /// File an issue against a duty in any status.
    pub async fn report_duty_issue(
        &self,
        duty_id: DbId,
        reporter: Option<DbId>,
        description: &str,
    ) -> ServiceResult<GuardDutyReport> {
        if description.trim().is_empty() {
            return Err(CoreError::Validation("Report description must not be empty".into()).into());
        }
        GuardDutyRepo::find_by_id(&self.pool, duty_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Guard duty", duty_id))?;

        let report = GuardDutyRepo::add_report(&self.pool, duty_id, reporter, description).await?;
        tracing::info!(duty_id, report_id = report.id, reporter = ?reporter, "Guard duty issue reported");
        Ok(report)
    }
}
