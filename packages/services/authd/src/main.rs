//! Passage authd
//!
//! Refresh Token 기반 Access Token 갱신과 Bearer 토큰 인증을 제공합니다.
//! 로그인(자격 증명 확인)은 이 서비스 밖에서 같은 세션 DB에 세션을 만듭니다.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 환경변수 로드
    dotenvy::dotenv().ok();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "psg_authd=debug,psg_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 설정 로드
    let config = Config::from_env()?;
    tracing::info!("Starting authd with config: {:?}", config);

    // 앱 상태 초기화
    let state = AppState::new(&config).await?;
    let state = Arc::new(state);

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("authd listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// 라우터 생성
fn create_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/tokens/me", get(handlers::tokens::current_payload))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    Router::new()
        .route("/tokens/renew", post(handlers::tokens::renew_access_token))
        .route("/tokens/revoke", post(handlers::tokens::revoke_session))
        .route("/health", get(handlers::health::health_check))
        .merge(protected)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(from_fn(middleware::request_id))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use chrono::Duration;
    use psg_core::auth::Payload;
    use psg_core::session::{ClientMetadata, SessionStore};
    use psg_core::CallContext;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::handlers::tokens::RenewAccessTokenResponse;

    async fn test_state() -> Arc<AppState> {
        let config = Config::from_lookup(|key| match key {
            "PSG_TOKEN_SYMMETRIC_KEY" => Some("0123456789abcdef0123456789abcdef".to_string()),
            "PSG_DB_URL" => Some("sqlite::memory:".to_string()),
            _ => None,
        })
        .unwrap();
        Arc::new(AppState::new(&config).await.unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_router(test_state().await);
        let resp = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key("x-request-id"));
        assert_eq!(body_json(resp).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let app = create_router(test_state().await);
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.headers()["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn test_renew_ok() {
        let state = test_state().await;
        let login = state
            .tokens
            .open_session(&CallContext::background(), "alice@example.com", ClientMetadata::default())
            .await
            .unwrap();

        let resp = create_router(state.clone())
            .oneshot(post_json(
                "/tokens/renew",
                json!({ "refresh_token": login.tokens.refresh_token }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: RenewAccessTokenResponse = serde_json::from_slice(&bytes).unwrap();
        let payload = state.tokens.verify_access_token(&body.access_token).unwrap();
        assert_eq!(payload.subject, "alice@example.com");
        assert_eq!(payload.expired_at, body.access_token_expires_at);
    }

    #[tokio::test]
    async fn test_renew_empty_body() {
        let resp = create_router(test_state().await)
            .oneshot(post_json("/tokens/renew", json!({ "refresh_token": "" })))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_renew_invalid_token() {
        let resp = create_router(test_state().await)
            .oneshot(post_json("/tokens/renew", json!({ "refresh_token": "123" })))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(resp).await;
        assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
        assert_eq!(body["error"]["message"], "authentication failed");
        assert!(body["error"]["requestId"].is_string());
    }

    #[tokio::test]
    async fn test_renew_unknown_session() {
        let state = test_state().await;
        let (token, _) = state
            .tokens
            .maker()
            .create_token("alice", Duration::minutes(1))
            .unwrap();

        let resp = create_router(state)
            .oneshot(post_json("/tokens/renew", json!({ "refresh_token": token })))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_revoke_then_renew_rejected() {
        let state = test_state().await;
        let login = state
            .tokens
            .open_session(&CallContext::background(), "alice", ClientMetadata::default())
            .await
            .unwrap();
        let body = json!({ "refresh_token": login.tokens.refresh_token });

        let resp = create_router(state.clone())
            .oneshot(post_json("/tokens/revoke", body.clone()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let session = state.sessions().get_session(&login.session.id).await.unwrap();
        assert!(session.is_blocked);

        let resp = create_router(state)
            .oneshot(post_json("/tokens/renew", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_me_requires_bearer() {
        let state = test_state().await;

        let resp = create_router(state.clone())
            .oneshot(Request::builder().uri("/tokens/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let (token, issued) = state
            .tokens
            .maker()
            .create_token("alice", Duration::minutes(1))
            .unwrap();
        let resp = create_router(state)
            .oneshot(
                Request::builder()
                    .uri("/tokens/me")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let payload: Payload = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(payload, issued);
    }

    #[tokio::test]
    async fn test_me_rejects_expired_token() {
        let state = test_state().await;
        let (token, _) = state
            .tokens
            .maker()
            .create_token("alice", Duration::milliseconds(-1))
            .unwrap();

        let resp = create_router(state)
            .oneshot(
                Request::builder()
                    .uri("/tokens/me")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
