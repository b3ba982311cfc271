use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

/// Browsable API explorer.
pub const EXPLORER_PATH: &str = "/docs";
/// Raw OpenAPI document consumed by the explorer and by client generators.
pub const OPENAPI_JSON_PATH: &str = "/api-doc/openapi.json";

pub fn router() -> Router<SharedState> {
    SwaggerUi::new(EXPLORER_PATH)
        .url(OPENAPI_JSON_PATH, ApiDoc::openapi())
        .into()
}
