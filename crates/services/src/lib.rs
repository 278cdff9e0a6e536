//! Cross-entity consistency layer for the cellblock back office.
//!
//! [`BackOffice`] is built once from a pool and hands out the four
//! components. Each component is a cheap clone over the same pool.

pub mod auth;
mod bootstrap;
pub mod error;
pub mod lifecycle;
pub mod occupancy;
pub mod permissions;

use cellblock_db::DbPool;

pub use auth::{AuthConfig, AuthGateway, NewEmployee};
pub use error::{ErrorKind, ServiceError, ServiceResult};
pub use lifecycle::StatusLifecycleManager;
pub use occupancy::OccupancyTracker;
pub use permissions::PermissionEvaluator;

/// All back-office services sharing one connection pool.
#[derive(Clone)]
pub struct BackOffice {
    pub pool: DbPool,
    pub permissions: PermissionEvaluator,
    pub occupancy: OccupancyTracker,
    pub lifecycle: StatusLifecycleManager,
    pub auth: AuthGateway,
}

impl BackOffice {
    pub fn new(pool: DbPool, auth_config: AuthConfig) -> Self {
        Self {
            permissions: PermissionEvaluator::new(pool.clone()),
            occupancy: OccupancyTracker::new(pool.clone()),
            lifecycle: StatusLifecycleManager::new(pool.clone()),
            auth: AuthGateway::new(pool.clone(), auth_config),
            pool,
        }
    }
}
