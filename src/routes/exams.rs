use std::convert::Infallible;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, Sse},
    routing::{get, post},
};
use axum_valid::Valid;
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{
    dto::{
        exam::{ExamDetail, ExamSummary},
        leaderboard::{LeaderboardResponse, WinnersQuery, WinnersResponse},
        submission::{SubmissionView, SubmitAnswersRequest},
    },
    error::AppError,
    routes::session::CurrentSession,
    services::{
        countdown_service, exam_service, leaderboard_service, sse_service, submission_service,
    },
    state::SharedState,
};

/// Exam browsing, countdowns, leaderboards, and answer submission.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/exams", get(list_exams))
        .route("/exams/{id}", get(get_exam))
        .route("/exams/{id}/countdown", get(countdown))
        .route("/exams/{id}/leaderboard", get(leaderboard))
        .route("/exams/{id}/winners", get(winners))
        .route("/exams/{id}/submissions", post(submit_answers))
        .route("/exams/{id}/submissions/me", get(own_submission))
}

#[utoipa::path(
    get,
    path = "/exams",
    tag = "exams",
    responses(
        (status = 200, description = "Exams ordered by start time", body = [ExamSummary]),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn list_exams(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ExamSummary>>, AppError> {
    Ok(Json(exam_service::list_exams(&state).await?))
}

#[utoipa::path(
    get,
    path = "/exams/{id}",
    tag = "exams",
    params(("id" = Uuid, Path, description = "Exam identifier")),
    responses(
        (status = 200, description = "Exam with its questions, answers hidden", body = ExamDetail),
        (status = 404, description = "Unknown exam")
    )
)]
pub async fn get_exam(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExamDetail>, AppError> {
    Ok(Json(exam_service::get_exam(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/exams/{id}/countdown",
    tag = "exams",
    params(("id" = Uuid, Path, description = "Exam identifier")),
    responses(
        (status = 200, description = "Countdown ticks until the exam starts", content_type = "text/event-stream", body = String),
        (status = 404, description = "Unknown exam")
    )
)]
/// Stream the time left before the exam opens, closing once it has started.
pub async fn countdown(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let countdowns = countdown_service::open_countdown(&state, id).await?;
    info!(exam_id = %id, "countdown stream opened");
    Ok(sse_service::countdown_to_sse(countdowns))
}

#[utoipa::path(
    get,
    path = "/exams/{id}/leaderboard",
    tag = "exams",
    params(("id" = Uuid, Path, description = "Exam identifier")),
    responses(
        (status = 200, description = "Ranked participants", body = LeaderboardResponse),
        (status = 404, description = "Unknown exam")
    )
)]
pub async fn leaderboard(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    Ok(Json(leaderboard_service::leaderboard(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/exams/{id}/winners",
    tag = "exams",
    params(("id" = Uuid, Path, description = "Exam identifier"), WinnersQuery),
    responses(
        (status = 200, description = "Top participants, ties at the cut included", body = WinnersResponse),
        (status = 404, description = "Unknown exam")
    )
)]
pub async fn winners(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(query): Query<WinnersQuery>,
) -> Result<Json<WinnersResponse>, AppError> {
    Ok(Json(
        leaderboard_service::winners(&state, id, query.n).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/exams/{id}/submissions",
    tag = "exams",
    params(
        ("Authorization" = String, Header, description = "Bearer token"),
        ("id" = Uuid, Path, description = "Exam identifier")
    ),
    request_body = SubmitAnswersRequest,
    responses(
        (status = 201, description = "Answers recorded and graded", body = SubmissionView),
        (status = 400, description = "Wrong number of answers"),
        (status = 401, description = "Not signed in"),
        (status = 409, description = "Exam not open or already submitted")
    )
)]
/// Hand in answers for an open exam. One submission per user.
pub async fn submit_answers(
    State(state): State<SharedState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<SubmitAnswersRequest>>,
) -> Result<(StatusCode, Json<SubmissionView>), AppError> {
    let view = submission_service::submit(&state, &session, id, payload).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    get,
    path = "/exams/{id}/submissions/me",
    tag = "exams",
    params(
        ("Authorization" = String, Header, description = "Bearer token"),
        ("id" = Uuid, Path, description = "Exam identifier")
    ),
    responses(
        (status = 200, description = "The caller's submission", body = SubmissionView),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "Nothing submitted yet")
    )
)]
pub async fn own_submission(
    State(state): State<SharedState>,
    CurrentSession(session): CurrentSession,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmissionView>, AppError> {
    Ok(Json(
        submission_service::own_submission(&state, &session, id).await?,
    ))
}
