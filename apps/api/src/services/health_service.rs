//! Health check for monitoring and load balancer health checks.
//!
//! Reports database connectivity and whether every embedded migration has
//! been applied. An unreachable database makes the whole service unhealthy.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use promoweb_db::migrations;
use serde::Serialize;
use tracing::warn;

use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServingStatus {
    Serving,
    /// Up, but the schema is behind the binary.
    Degraded,
    NotServing,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: ServingStatus,
    pub message: String,
    pub database: bool,
    pub migrations_applied: usize,
    pub migrations_total: usize,
    pub version: &'static str,
    pub server_time: DateTime<Utc>,
}

impl HealthReport {
    pub fn is_serving(&self) -> bool {
        self.status != ServingStatus::NotServing
    }
}

pub struct HealthService {
    state: Arc<AppState>,
}

impl HealthService {
    pub fn new(state: Arc<AppState>) -> Self {
        HealthService { state }
    }

    pub async fn check(&self) -> HealthReport {
        let database = self.state.db.health_check().await;

        let (total, applied) = if database {
            match migrations::migration_status(self.state.db.pool()).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(error = %e, "Could not read migration status");
                    (0, 0)
                }
            }
        } else {
            (0, 0)
        };

        let (status, message) = if !database {
            (ServingStatus::NotServing, "Database unreachable".to_string())
        } else if applied < total {
            (
                ServingStatus::Degraded,
                format!("{} of {} migrations applied", applied, total),
            )
        } else {
            (ServingStatus::Serving, "All systems operational".to_string())
        };

        HealthReport {
            status,
            message,
            database,
            migrations_applied: applied,
            migrations_total: total,
            version: env!("CARGO_PKG_VERSION"),
            server_time: Utc::now(),
        }
    }
}
