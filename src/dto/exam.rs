use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{ExamEntity, QuestionEntity},
    dto::{
        format_timestamp, format_unix_ms,
        validation::{validate_answer_index, validate_not_blank, validate_rfc3339},
    },
    state::countdown::Countdown,
};

fn default_points() -> u32 {
    1
}

/// Payload used by administrators to schedule an exam.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateExamRequest {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
    /// RFC 3339 opening time.
    #[validate(custom(function = "validate_rfc3339"))]
    pub starts_at: String,
    /// Minutes submissions stay open after the start. Omit to never close.
    #[validate(range(min = 1))]
    pub duration_minutes: Option<u32>,
    #[validate(length(min = 1), nested)]
    pub questions: Vec<QuestionInput>,
}

/// One multiple-choice question as sent by administrators.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
#[validate(schema(function = "validate_answer_index"))]
pub struct QuestionInput {
    #[validate(length(min = 1, max = 2000))]
    pub prompt: String,
    #[validate(length(min = 2, max = 10))]
    pub options: Vec<String>,
    /// Index of the correct option.
    pub answer: usize,
    #[serde(default = "default_points")]
    #[validate(range(min = 1, max = 1000))]
    pub points: u32,
}

impl From<QuestionInput> for QuestionEntity {
    fn from(input: QuestionInput) -> Self {
        Self {
            prompt: input.prompt,
            options: input.options,
            answer: input.answer,
            points: input.points,
        }
    }
}

/// Partial update of an exam; absent fields are left untouched.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateExamRequest {
    #[validate(length(min = 1, max = 200), custom(function = "validate_not_blank"))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(custom(function = "validate_rfc3339"))]
    pub starts_at: Option<String>,
    #[validate(range(min = 1))]
    pub duration_minutes: Option<u32>,
}

/// Exam as listed publicly, with its live countdown.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExamSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub starts_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<String>,
    pub duration_minutes: Option<u32>,
    pub question_count: usize,
    pub max_score: i64,
    pub countdown: Countdown,
}

impl ExamSummary {
    pub fn new(exam: &ExamEntity, countdown: Countdown) -> Self {
        Self {
            id: exam.id,
            title: exam.title.clone(),
            description: exam.description.clone(),
            starts_at: format_unix_ms(exam.starts_at_ms),
            ends_at: exam.ends_at().map(format_timestamp),
            duration_minutes: exam.duration_minutes,
            question_count: exam.questions.len(),
            max_score: exam.max_score(),
            countdown,
        }
    }
}

/// A question as shown to candidates; `answer` is only filled for administrators.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionView {
    pub prompt: String,
    pub options: Vec<String>,
    pub points: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<usize>,
}

/// Exam with its questions.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExamDetail {
    #[serde(flatten)]
    pub summary: ExamSummary,
    pub questions: Vec<QuestionView>,
}

impl ExamDetail {
    /// Candidate view: correct answers are withheld.
    pub fn public(exam: &ExamEntity, countdown: Countdown) -> Self {
        Self::build(exam, countdown, false)
    }

    /// Administrator view including correct answers.
    pub fn with_answers(exam: &ExamEntity, countdown: Countdown) -> Self {
        Self::build(exam, countdown, true)
    }

    fn build(exam: &ExamEntity, countdown: Countdown, reveal: bool) -> Self {
        Self {
            summary: ExamSummary::new(exam, countdown),
            questions: exam
                .questions
                .iter()
                .map(|question| QuestionView {
                    prompt: question.prompt.clone(),
                    options: question.options.clone(),
                    points: question.points,
                    answer: reveal.then_some(question.answer),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use validator::Validate;

    fn request(value: serde_json::Value) -> CreateExamRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn well_formed_exam_is_valid() {
        let exam = request(json!({
            "title": "Rust basics",
            "starts_at": "2024-05-01T10:00:00Z",
            "questions": [{"prompt": "2 + 2?", "options": ["3", "4"], "answer": 1}]
        }));
        assert!(exam.validate().is_ok());
        assert_eq!(exam.questions[0].points, 1);
    }

    #[test]
    fn invalid_exams_are_rejected() {
        let no_questions = request(json!({
            "title": "Empty",
            "starts_at": "2024-05-01T10:00:00Z",
            "questions": []
        }));
        assert!(no_questions.validate().is_err());

        let bad_answer = request(json!({
            "title": "Bad",
            "starts_at": "2024-05-01T10:00:00Z",
            "questions": [{"prompt": "?", "options": ["a", "b"], "answer": 5}]
        }));
        assert!(bad_answer.validate().is_err());

        let bad_time = request(json!({
            "title": "Late",
            "starts_at": "tomorrow",
            "questions": [{"prompt": "?", "options": ["a", "b"], "answer": 0}]
        }));
        assert!(bad_time.validate().is_err());
    }

    #[test]
    fn partial_update_validates_present_fields_only() {
        assert!(UpdateExamRequest::default().validate().is_ok());
        let update = UpdateExamRequest {
            starts_at: Some("not a time".into()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }
}
