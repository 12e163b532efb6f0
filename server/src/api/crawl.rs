use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use crawler_core::{codes, CrawlData, CrawlRequest, CrawlResponse, Envelope};

#[utoipa::path(
    post,
    path = "/crawl",
    tag = "crawl",
    request_body = CrawlRequest,
    responses(
        (status = 200, description = "Fetched page, or a nonzero code when the fetch failed", body = Envelope<CrawlData>)
    )
)]
pub async fn crawl(
    State(client): State<AppState>,
    payload: Result<Json<CrawlRequest>, JsonRejection>,
) -> Json<CrawlResponse> {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            let reason = rejection.body_text();
            tracing::warn!(error = %reason, "rejected crawl request");
            return Json(Envelope::error(
                codes::INVALID_PARAM,
                format!("Invalid request: {}", reason),
            ));
        }
    };

    let url = request.url;
    if request.force_browser {
        tracing::debug!(url = %url, "force_browser requested, ignoring");
    }

    let envelope = match client.fetch_html(&url).await {
        Ok(html) if !html.is_empty() => Envelope::success(CrawlData {
            url: url.clone(),
            html,
        }),
        Ok(_) => {
            tracing::warn!(url = %url, "fetched page is empty");
            Envelope::error(codes::CRAWL_FAILED, format!("Failed to crawl {}", url))
        }
        Err(e) if e.is_invalid_input() => {
            tracing::warn!(url = %url, error = %e, "invalid crawl url");
            Envelope::error(codes::INVALID_PARAM, format!("Invalid url: {}", url))
        }
        Err(e) => {
            tracing::error!(url = %url, error = %e, "crawl failed");
            Envelope::error(codes::CRAWL_FAILED, format!("Failed to crawl {}", url))
        }
    };

    if envelope.is_success() {
        tracing::debug!(url = %url, "crawl succeeded");
    }
    Json(envelope)
}
