use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::{exam::ExamSummary, result::ResultView};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// First message sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream.
    pub stream: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when an exam is created or changed.
pub struct ExamChangedEvent {
    pub exam: ExamSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when an exam is removed.
pub struct ExamDeletedEvent {
    pub exam_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the winners of an exam are published.
pub struct ResultPublishedEvent {
    pub result: ResultView,
}
