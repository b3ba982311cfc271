use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::result::ResultView, error::AppError, services::result_service, state::SharedState,
};

/// Published exam results.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/results", get(list_results))
        .route("/results/{id}", get(get_result))
}

#[utoipa::path(
    get,
    path = "/results",
    tag = "results",
    responses((status = 200, description = "Published results, newest first", body = [ResultView]))
)]
pub async fn list_results(
    State(state): State<SharedState>,
) -> Result<Json<Vec<ResultView>>, AppError> {
    Ok(Json(result_service::list_results(&state).await?))
}

#[utoipa::path(
    get,
    path = "/results/{id}",
    tag = "results",
    params(("id" = Uuid, Path, description = "Result identifier")),
    responses(
        (status = 200, description = "Published result", body = ResultView),
        (status = 404, description = "Unknown result")
    )
)]
pub async fn get_result(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResultView>, AppError> {
    Ok(Json(result_service::get_result(&state, id).await?))
}
