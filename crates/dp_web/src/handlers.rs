use std::sync::Arc;

use axum::extract::{Host, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::json;
use tracing::error;

use crate::AppState;

/// Self-referential link for the document being served.
fn request_url(host: &str, uri: &Uri) -> String {
    format!("https://{host}{}", uri.path())
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "endpoints": ["/feed", "/summary", "/conversation", "/podcast"],
        "cache_status": state.pipeline.cache().usable(),
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn feed(
    State(state): State<Arc<AppState>>,
    Host(host): Host,
    uri: Uri,
) -> Response {
    match state.pipeline.feed(&request_url(&host, &uri)).await {
        Ok(bytes) => rss_response(bytes),
        Err(e) => {
            error!(error = %e, "failed to produce feed");
            (StatusCode::INTERNAL_SERVER_ERROR, "error generating feed").into_response()
        }
    }
}

pub async fn summary(
    State(state): State<Arc<AppState>>,
    Host(host): Host,
    uri: Uri,
) -> Response {
    match state.pipeline.summary(&request_url(&host, &uri)).await {
        Ok(bytes) => rss_response(bytes),
        Err(e) => {
            error!(error = %e, "failed to produce summary");
            (StatusCode::INTERNAL_SERVER_ERROR, "error generating summary").into_response()
        }
    }
}

pub async fn conversation(
    State(state): State<Arc<AppState>>,
    Host(host): Host,
    uri: Uri,
) -> Response {
    match state.pipeline.conversation(&request_url(&host, &uri)).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "application/json")], bytes).into_response(),
        Err(e) => {
            error!(error = %e, "failed to produce conversation");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "error generating conversation",
            )
                .into_response()
        }
    }
}

pub async fn podcast(
    State(state): State<Arc<AppState>>,
    Host(host): Host,
    uri: Uri,
) -> Response {
    match state.pipeline.podcast(&request_url(&host, &uri)).await {
        Ok(audio) => (
            [
                (header::CONTENT_TYPE, "audio/mpeg"),
                (
                    header::CONTENT_DISPOSITION,
                    "inline; filename=\"daily-papers-podcast.mp3\"",
                ),
                (header::ACCEPT_RANGES, "bytes"),
            ],
            audio,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to produce podcast");
            (StatusCode::INTERNAL_SERVER_ERROR, "error generating podcast").into_response()
        }
    }
}

pub async fn update_cache(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let provided = headers.get("x-update-key").and_then(|v| v.to_str().ok());
    let authorized = matches!(
        (state.update_key.as_deref(), provided),
        (Some(expected), Some(given)) if expected == given
    );
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
    }

    match state.pipeline.refresh_all().await {
        Ok(()) => Json(json!({
            "status": "cache updated successfully",
            "timestamp": Utc::now().to_rfc3339(),
        }))
        .into_response(),
        Err(e) => {
            error!(error = %e, "cache refresh failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("error updating caches: {e}"),
            )
                .into_response()
        }
    }
}

fn rss_response(bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "application/rss+xml")], bytes).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use dp_pipeline::testing::{papers, PipelineBuilder, StubGenerator};
    use tower::ServiceExt;

    fn app(update_key: Option<&str>) -> axum::Router {
        let pipeline = PipelineBuilder::new()
            .papers(papers(1))
            .generator(StubGenerator::always("<h2>Headline</h2>"))
            .build();
        crate::create_app(AppState {
            pipeline: Arc::new(pipeline),
            update_key: update_key.map(str::to_string),
        })
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn health_reports_cache_status() {
        let response = app(None)
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("host", "papers.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["cache_status"], false);
    }

    #[tokio::test]
    async fn feed_is_served_as_rss() {
        let response = app(None)
            .oneshot(
                Request::builder()
                    .uri("/feed")
                    .header("host", "papers.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/rss+xml"
        );
        let body = String::from_utf8(body_bytes(response).await).unwrap();
        // The self-link reflects the requesting host.
        assert!(body.contains("https://papers.test/feed"));
    }

    #[tokio::test]
    async fn update_cache_rejects_missing_or_wrong_secrets() {
        for (configured, header_value) in [
            (None, Some("anything")),
            (Some("expected"), None),
            (Some("expected"), Some("wrong")),
        ] {
            let mut request = Request::builder()
                .method("POST")
                .uri("/update-cache")
                .header("host", "papers.test");
            if let Some(value) = header_value {
                request = request.header("x-update-key", value);
            }
            let response = app(configured)
                .oneshot(request.body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn authorized_refresh_with_unusable_store_is_a_server_error() {
        let response = app(Some("expected"))
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/update-cache")
                    .header("host", "papers.test")
                    .header("x-update-key", "expected")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
