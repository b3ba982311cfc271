pub mod countdown;
pub mod leaderboard;
pub mod session;
mod sse;
pub mod ticker;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};
use tracing::warn;

use crate::{
    config::AppConfig,
    dao::{
        repository::{Record, Repository},
        store::DocumentStore,
    },
    dto::sse::{ServerEvent, SystemStatus},
    error::ServiceError,
    services::mailer::{LogMailer, Mailer},
};

pub use self::session::{Session, SessionRegistry};
pub use self::sse::SseHub;
pub use self::ticker::{Clock, SystemClock};

pub type SharedState = Arc<AppState>;

const PUBLIC_SSE_CAPACITY: usize = 64;
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Central application state: the storage slot, sessions, broadcast hub and
/// the collaborators services reach through it.
pub struct AppState {
    store: RwLock<Option<Arc<dyn DocumentStore>>>,
    degraded: watch::Sender<bool>,
    sessions: SessionRegistry,
    public_sse: SseHub,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    config: Arc<AppConfig>,
}

impl AppState {
    /// Construct the production state wrapped in an [`Arc`].
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        Self::with_parts(config, Arc::new(LogMailer), Arc::new(SystemClock))
    }

    /// Construct a state with explicit mailer and clock implementations.
    pub fn with_parts(
        config: AppConfig,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            store: RwLock::new(None),
            degraded: degraded_tx,
            sessions: SessionRegistry::new(config.session_ttl()),
            public_sse: SseHub::new(PUBLIC_SSE_CAPACITY),
            mailer,
            clock,
            config: Arc::new(config),
        })
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn store(&self) -> Option<Arc<dyn DocumentStore>> {
        self.store.read().await.as_ref().cloned()
    }

    /// Obtain the current store or fail with [`ServiceError::Degraded`].
    pub async fn require_store(&self) -> Result<Arc<dyn DocumentStore>, ServiceError> {
        self.store().await.ok_or(ServiceError::Degraded)
    }

    /// Typed repository over the current store.
    pub async fn repository<T: Record>(&self) -> Result<Repository<T>, ServiceError> {
        Ok(Repository::new(self.require_store().await?))
    }

    /// Install a store implementation and leave degraded mode.
    pub async fn install_store(&self, store: Arc<dyn DocumentStore>) {
        {
            let mut guard = self.store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current store and enter degraded mode.
    pub async fn clear_store(&self) {
        {
            let mut guard = self.store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update the degraded flag, announcing changes on the public stream.
    pub fn update_degraded(&self, value: bool) {
        let changed = self.degraded.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
        if !changed {
            return;
        }

        match ServerEvent::json(
            Some(EVENT_SYSTEM_STATUS.to_string()),
            &SystemStatus { degraded: value },
        ) {
            Ok(event) => self.public_sse.broadcast(event),
            Err(err) => warn!(error = %err, "failed to serialize system status event"),
        }
    }

    /// Broadcast hub used for the public SSE stream.
    pub fn public_sse(&self) -> &SseHub {
        &self.public_sse
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn mailer(&self) -> &dyn Mailer {
        self.mailer.as_ref()
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        dao::store::memory::MemoryStore, services::mailer::tests::RecordingMailer,
        state::ticker::tests::ManualClock,
    };
    use time::OffsetDateTime;

    /// State backed by an in-memory store, a recording mailer and a manual clock.
    pub(crate) async fn test_state(
        config: AppConfig,
        now: OffsetDateTime,
    ) -> (SharedState, Arc<RecordingMailer>, Arc<ManualClock>) {
        let mailer = Arc::new(RecordingMailer::default());
        let clock = ManualClock::new(now);
        let state = AppState::with_parts(config, mailer.clone(), clock.clone());
        state.install_store(Arc::new(MemoryStore::new())).await;
        (state, mailer, clock)
    }

    #[tokio::test]
    async fn starts_degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded());
        assert!(matches!(
            state.require_store().await,
            Err(ServiceError::Degraded)
        ));

        let mut events = state.public_sse().subscribe();
        state.install_store(Arc::new(MemoryStore::new())).await;
        assert!(!state.is_degraded());
        assert!(state.require_store().await.is_ok());

        let event = events.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("system.status"));
        assert_eq!(event.data, r#"{"degraded":false}"#);

        state.clear_store().await;
        assert!(state.is_degraded());
        let event = events.recv().await.unwrap();
        assert_eq!(event.data, r#"{"degraded":true}"#);
    }

    #[tokio::test]
    async fn unchanged_flag_is_not_rebroadcast() {
        let state = AppState::new(AppConfig::default());
        let mut events = state.public_sse().subscribe();
        state.update_degraded(true);
        assert!(events.try_recv().is_err());
    }
}
