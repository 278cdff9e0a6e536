//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Methods that take part in
//! service-level transactions are generic over `PgExecutor` instead.

pub mod access_control_repo;
pub mod cell_repo;
pub mod emergency_procedure_repo;
pub mod employee_repo;
pub mod guard_duty_repo;
pub mod prisoner_repo;
pub mod security_alert_repo;
pub mod security_log_repo;
pub mod task_repo;
pub mod visit_repo;
pub mod visitor_repo;

pub use access_control_repo::AccessControlRepo;
pub use cell_repo::CellRepo;
pub use emergency_procedure_repo::EmergencyProcedureRepo;
pub use employee_repo::EmployeeRepo;
pub use guard_duty_repo::GuardDutyRepo;
pub use prisoner_repo::PrisonerRepo;
pub use security_alert_repo::SecurityAlertRepo;
pub use security_log_repo::SecurityLogRepo;
pub use task_repo::TaskRepo;
pub use visit_repo::VisitRepo;
pub use visitor_repo::VisitorRepo;
