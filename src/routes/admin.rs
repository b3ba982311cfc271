use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, patch, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        course::{CourseView, CreateCourseRequest, UpdateCourseRequest},
        exam::{CreateExamRequest, ExamDetail, UpdateExamRequest},
        result::ResultView,
        submission::SubmissionView,
    },
    error::AppError,
    routes::session::require_admin,
    services::{course_service, exam_service, leaderboard_service, submission_service},
    state::{Session, SharedState},
};

/// Administrator endpoints for authoring exams and courses and publishing results.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/exams", post(create_exam))
        .route(
            "/admin/exams/{id}",
            get(get_exam).patch(update_exam).delete(delete_exam),
        )
        .route("/admin/exams/{id}/submissions", get(list_submissions))
        .route("/admin/exams/{id}/results", post(publish_results))
        .route("/admin/courses", post(create_course))
        .route(
            "/admin/courses/{id}",
            patch(update_course).delete(delete_course),
        )
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

#[utoipa::path(
    post,
    path = "/admin/exams",
    tag = "admin",
    params(("Authorization" = String, Header, description = "Bearer token of an administrator")),
    request_body = CreateExamRequest,
    responses(
        (status = 201, description = "Exam created", body = ExamDetail),
        (status = 400, description = "Invalid exam definition"),
        (status = 403, description = "Not an administrator")
    )
)]
pub async fn create_exam(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Valid(Json(payload)): Valid<Json<CreateExamRequest>>,
) -> Result<(StatusCode, Json<ExamDetail>), AppError> {
    let exam = exam_service::create_exam(&state, &session, payload).await?;
    Ok((StatusCode::CREATED, Json(exam)))
}

#[utoipa::path(
    get,
    path = "/admin/exams/{id}",
    tag = "admin",
    operation_id = "admin_get_exam",
    params(
        ("Authorization" = String, Header, description = "Bearer token of an administrator"),
        ("id" = Uuid, Path, description = "Exam identifier")
    ),
    responses(
        (status = 200, description = "Exam including correct answers", body = ExamDetail),
        (status = 404, description = "Unknown exam")
    )
)]
pub async fn get_exam(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ExamDetail>, AppError> {
    Ok(Json(exam_service::get_exam_for_admin(&state, id).await?))
}

#[utoipa::path(
    patch,
    path = "/admin/exams/{id}",
    tag = "admin",
    params(
        ("Authorization" = String, Header, description = "Bearer token of an administrator"),
        ("id" = Uuid, Path, description = "Exam identifier")
    ),
    request_body = UpdateExamRequest,
    responses(
        (status = 200, description = "Exam updated", body = ExamDetail),
        (status = 400, description = "Invalid changes"),
        (status = 404, description = "Unknown exam")
    )
)]
/// Change an exam's title, description, start time, or duration.
pub async fn update_exam(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<UpdateExamRequest>>,
) -> Result<Json<ExamDetail>, AppError> {
    Ok(Json(exam_service::update_exam(&state, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/admin/exams/{id}",
    tag = "admin",
    params(
        ("Authorization" = String, Header, description = "Bearer token of an administrator"),
        ("id" = Uuid, Path, description = "Exam identifier")
    ),
    responses(
        (status = 204, description = "Exam and its submissions deleted"),
        (status = 404, description = "Unknown exam")
    )
)]
pub async fn delete_exam(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    exam_service::delete_exam(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/admin/exams/{id}/submissions",
    tag = "admin",
    params(
        ("Authorization" = String, Header, description = "Bearer token of an administrator"),
        ("id" = Uuid, Path, description = "Exam identifier")
    ),
    responses(
        (status = 200, description = "Every submission for the exam", body = [SubmissionView]),
        (status = 404, description = "Unknown exam")
    )
)]
pub async fn list_submissions(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<SubmissionView>>, AppError> {
    Ok(Json(submission_service::list_submissions(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/exams/{id}/results",
    tag = "admin",
    params(
        ("Authorization" = String, Header, description = "Bearer token of an administrator"),
        ("id" = Uuid, Path, description = "Exam identifier")
    ),
    responses(
        (status = 201, description = "Winners published", body = ResultView),
        (status = 404, description = "Unknown exam"),
        (status = 409, description = "Exam has not started")
    )
)]
/// Freeze the current winners of an exam into a published result.
pub async fn publish_results(
    State(state): State<SharedState>,
    Extension(session): Extension<Session>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ResultView>), AppError> {
    let result = leaderboard_service::publish_results(&state, &session, id).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

#[utoipa::path(
    post,
    path = "/admin/courses",
    tag = "admin",
    params(("Authorization" = String, Header, description = "Bearer token of an administrator")),
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = CourseView),
        (status = 400, description = "Invalid course")
    )
)]
pub async fn create_course(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateCourseRequest>>,
) -> Result<(StatusCode, Json<CourseView>), AppError> {
    let course = course_service::create_course(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

#[utoipa::path(
    patch,
    path = "/admin/courses/{id}",
    tag = "admin",
    params(
        ("Authorization" = String, Header, description = "Bearer token of an administrator"),
        ("id" = Uuid, Path, description = "Course identifier")
    ),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Course updated", body = CourseView),
        (status = 404, description = "Unknown course")
    )
)]
pub async fn update_course(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<UpdateCourseRequest>>,
) -> Result<Json<CourseView>, AppError> {
    Ok(Json(
        course_service::update_course(&state, id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/admin/courses/{id}",
    tag = "admin",
    params(
        ("Authorization" = String, Header, description = "Bearer token of an administrator"),
        ("id" = Uuid, Path, description = "Course identifier")
    ),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 404, description = "Unknown course")
    )
)]
pub async fn delete_course(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    course_service::delete_course(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
