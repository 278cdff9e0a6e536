mod config;

use anyhow::Context;
use cellblock_core::permissions::VALID_MODULES;
use cellblock_core::roles::EmployeeRole;
use cellblock_core::status::{PrisonerStatus, Severity};
use cellblock_db::models::cell::{OccupancyDrift, OccupancySummary};
use cellblock_db::models::employee::EmployeeProfile;
use cellblock_db::models::stats::count_for;
use cellblock_db::repositories::{PrisonerRepo, SecurityAlertRepo};
use cellblock_services::{BackOffice, NewEmployee};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{BackofficeConfig, BootstrapAdmin};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cellblock_backoffice=debug,cellblock_services=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = BackofficeConfig::from_env().context("Invalid configuration")?;
    tracing::info!(
        max_connections = config.db.max_connections,
        acquire_timeout_secs = config.db.acquire_timeout_secs,
        statement_timeout_ms = config.db.statement_timeout_ms,
        "Loaded back-office configuration"
    );

    // --- Database ---
    let pool = cellblock_db::create_pool(&config.db)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection pool created");

    cellblock_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    tracing::info!("Database health check passed");

    cellblock_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    let office = BackOffice::new(pool, config.auth.clone());

    // --- Bootstrap administrator ---
    if let Some(admin) = &config.bootstrap_admin {
        bootstrap_admin(&office, admin).await?;
    }

    // --- Integrity report ---
    let report = integrity_report(&office, config.sweep_expired_access).await?;
    tracing::info!(
        report = %serde_json::to_string(&report)?,
        "Integrity report"
    );

    office.pool.close().await;
    Ok(())
}

/// Create the administrator account if needed and restore any module
/// grant it is missing.
async fn bootstrap_admin(office: &BackOffice, admin: &BootstrapAdmin) -> anyhow::Result<()> {
    let (employee, granted) = office
        .ensure_administrator(&NewEmployee {
            employee_code: "ADMIN".to_string(),
            first_name: "System".to_string(),
            last_name: "Administrator".to_string(),
            phone: None,
            email: None,
            job_title: "Administrator".to_string(),
            department: "Administration".to_string(),
            salary_cents: 0,
            hire_date: None,
            username: admin.username.clone(),
            password: admin.password.clone(),
            role: EmployeeRole::Administrator,
        })
        .await
        .context("Failed to provision bootstrap administrator")?;

    tracing::info!(
        profile = %serde_json::to_string(&EmployeeProfile::from(&employee))?,
        granted = ?granted,
        modules = VALID_MODULES.len(),
        "Bootstrap administrator ready"
    );
    Ok(())
}

#[derive(Debug, Serialize)]
struct IntegrityReport {
    expired_grants: usize,
    grants_deactivated: u64,
    occupancy: OccupancySummary,
    drift: Vec<OccupancyDrift>,
    in_custody: i64,
    open_critical_alerts: i64,
}

async fn integrity_report(office: &BackOffice, sweep: bool) -> anyhow::Result<IntegrityReport> {
    let expired = office.permissions.expired_access_controls().await?;
    for grant in &expired {
        tracing::warn!(
            employee_id = grant.employee_id,
            module = %grant.module,
            expires_on = ?grant.expires_on,
            "Access grant expired but still active"
        );
    }

    let grants_deactivated = if sweep && !expired.is_empty() {
        office.permissions.deactivate_expired().await?
    } else {
        0
    };

    let prisoners = PrisonerRepo::count_by_status(&office.pool).await?;
    let alerts = SecurityAlertRepo::count_unresolved_by_severity(&office.pool).await?;

    Ok(IntegrityReport {
        expired_grants: expired.len(),
        grants_deactivated,
        occupancy: office.occupancy.occupancy_summary().await?,
        drift: office.occupancy.find_drift().await?,
        in_custody: count_for(&prisoners, PrisonerStatus::InCustody),
        open_critical_alerts: count_for(&alerts, Severity::Critical),
    })
}
