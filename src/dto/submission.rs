use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{dao::models::SubmissionEntity, dto::format_unix_ms};

/// Answers handed in for an exam, one entry per question in order.
/// `null` leaves a question unanswered.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitAnswersRequest {
    #[validate(length(max = 500))]
    pub answers: Vec<Option<usize>>,
}

/// Stored submission with its score.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmissionView {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub answers: Vec<Option<usize>>,
    pub score: Option<i64>,
    pub submitted_at: String,
}

impl From<&SubmissionEntity> for SubmissionView {
    fn from(submission: &SubmissionEntity) -> Self {
        Self {
            id: submission.id,
            exam_id: submission.exam_id,
            user_id: submission.user_id,
            display_name: submission.display_name.clone(),
            answers: submission.answers.clone(),
            score: submission.score,
            submitted_at: format_unix_ms(submission.submitted_at_ms),
        }
    }
}
