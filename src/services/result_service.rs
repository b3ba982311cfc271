use uuid::Uuid;

use crate::{
    dao::{
        document::{Direction, Query},
        models::ResultEntity,
    },
    dto::result::ResultView,
    error::ServiceError,
    state::SharedState,
};

/// Published results, most recent first.
pub async fn list_results(state: &SharedState) -> Result<Vec<ResultView>, ServiceError> {
    let results = state
        .repository::<ResultEntity>()
        .await?
        .list(Query::new().order_by("published_at_ms", Direction::Descending))
        .await?;
    Ok(results.iter().map(ResultView::from).collect())
}

pub async fn get_result(state: &SharedState, result_id: Uuid) -> Result<ResultView, ServiceError> {
    state
        .repository::<ResultEntity>()
        .await?
        .get(&result_id.to_string())
        .await?
        .map(|result| ResultView::from(&result))
        .ok_or_else(|| ServiceError::NotFound(format!("result {result_id} not found")))
}
