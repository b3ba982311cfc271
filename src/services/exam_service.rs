use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        document::{Direction, Query},
        models::{ExamEntity, SubmissionEntity, closing_time, from_unix_ms, to_unix_ms},
    },
    dto::{
        exam::{CreateExamRequest, ExamDetail, ExamSummary, UpdateExamRequest},
        parse_timestamp,
    },
    error::ServiceError,
    services::sse_events,
    state::{Session, SharedState, countdown::evaluate},
};

#[derive(Serialize)]
struct ExamPatch<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    starts_at_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_minutes: Option<u32>,
    updated_at_ms: i64,
}

fn parse_start(value: &str) -> Result<i64, ServiceError> {
    parse_timestamp(value)
        .map(to_unix_ms)
        .ok_or_else(|| ServiceError::InvalidInput(format!("`{value}` is not an RFC 3339 timestamp")))
}

/// Reject schedules whose closing time cannot be represented.
fn check_schedule(starts_at_ms: i64, duration_minutes: Option<u32>) -> Result<(), ServiceError> {
    match duration_minutes {
        Some(minutes) if closing_time(from_unix_ms(starts_at_ms), minutes).is_none() => {
            Err(ServiceError::InvalidInput(format!(
                "a {minutes} minute exam starting then would end past the last supported date"
            )))
        }
        _ => Ok(()),
    }
}

fn summarize(state: &SharedState, exam: &ExamEntity) -> ExamSummary {
    ExamSummary::new(exam, evaluate(exam.starts_at(), state.clock().now()))
}

/// Load an exam or fail with [`ServiceError::NotFound`].
pub async fn load_exam(state: &SharedState, exam_id: Uuid) -> Result<ExamEntity, ServiceError> {
    state
        .repository::<ExamEntity>()
        .await?
        .get(&exam_id.to_string())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("exam {exam_id} not found")))
}

/// Every exam, soonest first.
pub async fn list_exams(state: &SharedState) -> Result<Vec<ExamSummary>, ServiceError> {
    let exams = state
        .repository::<ExamEntity>()
        .await?
        .list(Query::new().order_by("starts_at_ms", Direction::Ascending))
        .await?;
    Ok(exams.iter().map(|exam| summarize(state, exam)).collect())
}

/// Exam as shown to candidates, without the correct answers.
pub async fn get_exam(state: &SharedState, exam_id: Uuid) -> Result<ExamDetail, ServiceError> {
    let exam = load_exam(state, exam_id).await?;
    let countdown = evaluate(exam.starts_at(), state.clock().now());
    Ok(ExamDetail::public(&exam, countdown))
}

/// Exam including the correct answers.
pub async fn get_exam_for_admin(
    state: &SharedState,
    exam_id: Uuid,
) -> Result<ExamDetail, ServiceError> {
    let exam = load_exam(state, exam_id).await?;
    let countdown = evaluate(exam.starts_at(), state.clock().now());
    Ok(ExamDetail::with_answers(&exam, countdown))
}

/// Schedule a new exam and announce it.
pub async fn create_exam(
    state: &SharedState,
    admin: &Session,
    request: CreateExamRequest,
) -> Result<ExamDetail, ServiceError> {
    let starts_at_ms = parse_start(&request.starts_at)?;
    check_schedule(starts_at_ms, request.duration_minutes)?;
    let now_ms = to_unix_ms(state.clock().now());
    let exam = ExamEntity {
        id: Uuid::new_v4(),
        title: request.title.trim().to_string(),
        description: request.description,
        starts_at_ms,
        duration_minutes: request.duration_minutes,
        questions: request.questions.into_iter().map(Into::into).collect(),
        created_by: admin.user_id,
        created_at_ms: now_ms,
        updated_at_ms: now_ms,
    };
    state.repository::<ExamEntity>().await?.put(&exam).await?;
    info!(exam_id = %exam.id, questions = exam.questions.len(), "exam created");

    sse_events::broadcast_exam_created(state, summarize(state, &exam));
    let countdown = evaluate(exam.starts_at(), state.clock().now());
    Ok(ExamDetail::with_answers(&exam, countdown))
}

/// Apply a partial update to an exam and announce it.
pub async fn update_exam(
    state: &SharedState,
    exam_id: Uuid,
    request: UpdateExamRequest,
) -> Result<ExamDetail, ServiceError> {
    let starts_at_ms = request.starts_at.as_deref().map(parse_start).transpose()?;
    if starts_at_ms.is_some() || request.duration_minutes.is_some() {
        let current = load_exam(state, exam_id).await?;
        check_schedule(
            starts_at_ms.unwrap_or(current.starts_at_ms),
            request.duration_minutes.or(current.duration_minutes),
        )?;
    }
    let patch = ExamPatch {
        title: request.title.as_deref().map(str::trim),
        description: request.description.as_deref(),
        starts_at_ms,
        duration_minutes: request.duration_minutes,
        updated_at_ms: to_unix_ms(state.clock().now()),
    };

    let exams = state.repository::<ExamEntity>().await?;
    if !exams.update(&exam_id.to_string(), &patch).await? {
        return Err(ServiceError::NotFound(format!("exam {exam_id} not found")));
    }
    let exam = load_exam(state, exam_id).await?;
    info!(exam_id = %exam.id, "exam updated");

    sse_events::broadcast_exam_updated(state, summarize(state, &exam));
    let countdown = evaluate(exam.starts_at(), state.clock().now());
    Ok(ExamDetail::with_answers(&exam, countdown))
}

/// Delete an exam together with its submissions.
pub async fn delete_exam(state: &SharedState, exam_id: Uuid) -> Result<(), ServiceError> {
    let exams = state.repository::<ExamEntity>().await?;
    if !exams.delete(&exam_id.to_string()).await? {
        return Err(ServiceError::NotFound(format!("exam {exam_id} not found")));
    }

    let submissions = state.repository::<SubmissionEntity>().await?;
    let orphans = submissions
        .list(Query::new().where_eq("exam_id", exam_id.to_string()))
        .await?;
    for submission in &orphans {
        submissions.delete(&submission.id.to_string()).await?;
    }
    info!(%exam_id, submissions = orphans.len(), "exam deleted");

    sse_events::broadcast_exam_deleted(state, exam_id);
    Ok(())
}
