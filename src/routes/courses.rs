use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::course::CourseView, error::AppError, services::course_service, state::SharedState,
};

/// Read-only course viewer endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/courses", get(list_courses))
        .route("/courses/{id}", get(get_course))
}

#[utoipa::path(
    get,
    path = "/courses",
    tag = "courses",
    responses((status = 200, description = "All courses", body = [CourseView]))
)]
pub async fn list_courses(
    State(state): State<SharedState>,
) -> Result<Json<Vec<CourseView>>, AppError> {
    Ok(Json(course_service::list_courses(&state).await?))
}

#[utoipa::path(
    get,
    path = "/courses/{id}",
    tag = "courses",
    params(("id" = Uuid, Path, description = "Course identifier")),
    responses(
        (status = 200, description = "Course with its lessons", body = CourseView),
        (status = 404, description = "Unknown course")
    )
)]
pub async fn get_course(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CourseView>, AppError> {
    Ok(Json(course_service::get_course(&state, id).await?))
}
