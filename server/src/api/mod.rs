pub mod crawl;

use crate::AppState;
use axum::routing::{get, post};
use axum::{Json, Router};
use utoipa::OpenApi;

pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(title = "crawler-server", description = "Fetch a page and return its HTML"),
    paths(crawl::crawl)
)]
pub struct ApiDoc;

/// Generate the OpenAPI document served at [`OPENAPI_PATH`].
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/crawl", post(crawl::crawl))
        .route(OPENAPI_PATH, get(openapi_json))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_crawl_endpoint() {
        let spec = openapi();
        assert!(spec.paths.paths.contains_key("/crawl"));
    }
}
