use serde::Serialize;
use utoipa::ToSchema;

/// Overall verdict of `/healthcheck`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
}

/// What the last storage ping observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StorageHealth {
    Reachable,
    Unreachable,
    /// No backend is installed yet, or it was dropped after a failure.
    Detached,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub storage: StorageHealth,
    /// Sessions currently held in memory, expired ones included until swept.
    pub open_sessions: usize,
}

impl HealthResponse {
    /// Exams and accounts are served only while storage answers and the
    /// supervisor has not flagged degraded mode.
    pub fn new(storage: StorageHealth, degraded: bool, open_sessions: usize) -> Self {
        let status = match storage {
            StorageHealth::Reachable if !degraded => HealthStatus::Ok,
            _ => HealthStatus::Degraded,
        };
        Self {
            status,
            storage,
            open_sessions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn degraded_flag_overrides_a_reachable_store() {
        let response = HealthResponse::new(StorageHealth::Reachable, true, 0);
        assert_eq!(response.status, HealthStatus::Degraded);
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"status": "degraded", "storage": "reachable", "open_sessions": 0})
        );
    }
}
