use tracing::warn;

use crate::{
    dto::health::{HealthResponse, StorageHealth},
    state::SharedState,
};

/// Ping the installed store, if any, and combine the result with the
/// supervisor's degraded flag.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let storage = match state.require_store().await {
        Ok(store) => match store.health_check().await {
            Ok(()) => StorageHealth::Reachable,
            Err(err) => {
                warn!(error = %err, "storage health check failed");
                StorageHealth::Unreachable
            }
        },
        Err(_) => {
            warn!("storage unavailable (degraded mode)");
            StorageHealth::Detached
        }
    };

    HealthResponse::new(storage, state.is_degraded(), state.sessions().len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dto::health::HealthStatus,
        services::auth_service::tests::signed_up,
        state::{AppState, tests::test_state},
    };
    use time::macros::datetime;

    #[tokio::test]
    async fn reports_degraded_without_store() {
        let state = AppState::new(AppConfig::default());
        let health = health_status(&state).await;
        assert_eq!(health.status, HealthStatus::Degraded);
        assert_eq!(health.storage, StorageHealth::Detached);
    }

    #[tokio::test]
    async fn reports_ok_with_a_reachable_store() {
        let (state, _, _) =
            test_state(AppConfig::default(), datetime!(2024-05-01 09:00 UTC)).await;
        signed_up(&state, "ada@example.org", "Ada").await;

        let health = health_status(&state).await;
        assert_eq!(health.status, HealthStatus::Ok);
        assert_eq!(health.storage, StorageHealth::Reachable);
        assert_eq!(health.open_sessions, 1);
    }
}
