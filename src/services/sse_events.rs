use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        exam::ExamSummary,
        result::ResultView,
        sse::{ExamChangedEvent, ExamDeletedEvent, ResultPublishedEvent, ServerEvent},
    },
    state::SharedState,
};

pub const EVENT_EXAM_CREATED: &str = "exam.created";
pub const EVENT_EXAM_UPDATED: &str = "exam.updated";
pub const EVENT_EXAM_DELETED: &str = "exam.deleted";
pub const EVENT_RESULT_PUBLISHED: &str = "result.published";

/// Announce a newly scheduled exam.
pub fn broadcast_exam_created(state: &SharedState, exam: ExamSummary) {
    send_public_event(state, EVENT_EXAM_CREATED, &ExamChangedEvent { exam });
}

/// Announce a change to an exam's schedule or description.
pub fn broadcast_exam_updated(state: &SharedState, exam: ExamSummary) {
    send_public_event(state, EVENT_EXAM_UPDATED, &ExamChangedEvent { exam });
}

pub fn broadcast_exam_deleted(state: &SharedState, exam_id: Uuid) {
    send_public_event(state, EVENT_EXAM_DELETED, &ExamDeletedEvent { exam_id });
}

/// Announce the winners of an exam.
pub fn broadcast_result_published(state: &SharedState, result: ResultView) {
    send_public_event(
        state,
        EVENT_RESULT_PUBLISHED,
        &ResultPublishedEvent { result },
    );
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}
