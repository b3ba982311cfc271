use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use axum_valid::Valid;

use crate::{
    dto::{auth::ActionResponse, contact::ContactRequest},
    error::AppError,
    services::contact_service,
    state::SharedState,
};

pub fn router() -> Router<SharedState> {
    Router::new().route("/contact", post(send_message))
}

#[utoipa::path(
    post,
    path = "/contact",
    tag = "contact",
    request_body = ContactRequest,
    responses(
        (status = 202, description = "Message forwarded to the contact inbox", body = ActionResponse),
        (status = 400, description = "Invalid payload"),
        (status = 503, description = "Mail could not be dispatched")
    )
)]
/// Forward a contact form message by mail.
pub async fn send_message(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<ContactRequest>>,
) -> Result<(StatusCode, Json<ActionResponse>), AppError> {
    contact_service::send_contact_message(&state, payload).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ActionResponse::new("message sent")),
    ))
}
