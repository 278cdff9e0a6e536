//! Shared fixtures for the service integration tests.

#![allow(dead_code)]

use cellblock_core::roles::EmployeeRole;
use cellblock_core::status::{SecurityLevel, VisitorStatus};
use cellblock_db::models::cell::{Cell, CreateCell};
use cellblock_db::models::employee::{CreateEmployee, Employee};
use cellblock_db::models::prisoner::{CreatePrisoner, Prisoner};
use cellblock_db::models::visitor::{CreateVisitor, Visitor};
use cellblock_db::repositories::{CellRepo, EmployeeRepo, VisitorRepo};
use cellblock_services::{AuthConfig, BackOffice, NewEmployee};
use sqlx::PgPool;

pub const PASSWORD: &str = "correct-horse-battery";

pub fn office(pool: PgPool) -> BackOffice {
    BackOffice::new(pool, AuthConfig::default())
}

/// Insert an officer directly, bypassing password hashing.
pub async fn staff(pool: &PgPool, code: &str) -> Employee {
    staff_with_role(pool, code, EmployeeRole::Officer).await
}

pub async fn staff_with_role(pool: &PgPool, code: &str, role: EmployeeRole) -> Employee {
    EmployeeRepo::create(
        pool,
        &CreateEmployee {
            employee_code: code.to_string(),
            first_name: "Dana".to_string(),
            last_name: "Reyes".to_string(),
            phone: None,
            email: None,
            job_title: "Officer".to_string(),
            department: "Security".to_string(),
            salary_cents: 4_500_000,
            hire_date: None,
            username: code.to_lowercase(),
            password_hash: "unused".to_string(),
            role_id: role.id(),
        },
    )
    .await
    .unwrap()
}

pub fn new_employee(username: &str, password: &str) -> NewEmployee {
    NewEmployee {
        employee_code: format!("EMP-{username}"),
        first_name: "Dana".to_string(),
        last_name: "Reyes".to_string(),
        phone: None,
        email: Some(format!("{username}@cellblock.test")),
        job_title: "Officer".to_string(),
        department: "Security".to_string(),
        salary_cents: 4_500_000,
        hire_date: None,
        username: username.to_string(),
        password: password.to_string(),
        role: EmployeeRole::Officer,
    }
}

pub async fn cell(pool: &PgPool, number: &str, capacity: i32) -> Cell {
    CellRepo::create(
        pool,
        &CreateCell {
            cell_number: number.to_string(),
            block: number[..1].to_string(),
            cell_type: "Standard".to_string(),
            capacity,
            security_level_id: SecurityLevel::Medium.id(),
        },
    )
    .await
    .unwrap()
}

pub fn new_prisoner(first: &str, last: &str) -> CreatePrisoner {
    CreatePrisoner {
        first_name: first.to_string(),
        last_name: last.to_string(),
        date_of_birth: None,
        phone: None,
        crime_description: "Burglary".to_string(),
        sentence_months: 24,
        admission_date: None,
    }
}

/// Admit a prisoner into `cell_number` through the occupancy tracker.
pub async fn housed(office: &BackOffice, cell_number: &str) -> Prisoner {
    office
        .occupancy
        .admit_prisoner(&new_prisoner("John", "Doe"), cell_number)
        .await
        .unwrap()
}

pub async fn visitor(pool: &PgPool, prisoner_id: i64, status: VisitorStatus) -> Visitor {
    VisitorRepo::create(
        pool,
        &CreateVisitor {
            prisoner_id,
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            phone: None,
            id_document: Some("P1234567".to_string()),
            relationship: "Sister".to_string(),
            status_id: Some(status.id()),
        },
    )
    .await
    .unwrap()
}
