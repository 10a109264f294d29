use std::{net::SocketAddr, time::Duration};

use axum::{
    http::{Request, Response, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use time::OffsetDateTime;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::Span;

use crate::{
    admin, auth,
    error::{method_not_allowed, reveal_internal_errors, ApiResponse},
    state::AppState,
    users,
};

const SERVICE_NAME: &str = "users-service";
const SLOW_REQUEST: Duration = Duration::from_secs(1);

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    timestamp: OffsetDateTime,
    service: &'static str,
}

async fn health() -> Json<ApiResponse<HealthStatus>> {
    Json(ApiResponse::ok(HealthStatus {
        status: "OK",
        timestamp: OffsetDateTime::now_utc(),
        service: SERVICE_NAME,
    }))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::failure("Route not found")),
    )
}

pub fn build_app(state: AppState) -> Router {
    let api = Router::new()
        .merge(auth::router(state.clone()))
        .merge(users::router(state.clone()))
        .merge(admin::router(state.clone()));

    Router::new()
        .nest("/api", api)
        .route("/health", get(health))
        .fallback(not_found)
        .layer(from_fn(method_not_allowed))
        .layer(from_fn_with_state(state.clone(), reveal_internal_errors))
        .with_state(state)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &Request<_>| {
                    let request_id = req
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default();
                    tracing::info_span!(
                        "http_request",
                        method = %req.method(),
                        uri = %req.uri(),
                        request_id,
                        status = tracing::field::Empty,
                    )
                })
                .on_response(|res: &Response<_>, latency: Duration, span: &Span| {
                    let status = res.status();
                    span.record("status", tracing::field::display(status));
                    let latency_ms = latency.as_millis() as u64;
                    if status.is_server_error() {
                        tracing::error!(%status, latency_ms, "response");
                    } else if latency > SLOW_REQUEST {
                        tracing::warn!(%status, latency_ms, "slow response");
                    } else {
                        tracing::info!(%status, latency_ms, "response");
                    }
                }),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::testing;

    #[tokio::test]
    async fn health_reports_ok_with_request_id() {
        let (app, _) = testing::app();
        let res = testing::call_raw(&app, "GET", "/health", None, None).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("x-request-id"));

        let (_, body) = testing::call(&app, "GET", "/health", None, None).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "OK");
        assert_eq!(body["data"]["service"], "users-service");
        assert!(body["data"]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn unknown_route_uses_envelope() {
        let (app, _) = testing::app();
        let (status, body) = testing::call(&app, "GET", "/api/nothing", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            serde_json::json!({"success": false, "error": "Route not found"})
        );
    }

    #[tokio::test]
    async fn wrong_method_uses_envelope() {
        let (app, _) = testing::app();
        let res = testing::call_raw(&app, "POST", "/health", None, None).await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(res.headers().contains_key("allow"));

        let (status, body) = testing::call(&app, "POST", "/health", None, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            body,
            serde_json::json!({"success": false, "error": "Method not allowed"})
        );

        let (app, _) = testing::app();
        let (token, id) = testing::register(&app, "m@x.com").await;
        let (status, body) = testing::call(
            &app,
            "PATCH",
            &format!("/api/users/{id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["success"], false);
    }
}
