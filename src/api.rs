//! REST API server for Guardián Financiero
//!
//! Exposes the application facade over HTTP. Scheduled actions answer
//! `202 Accepted` with their pending label; the result shows up in the next
//! `GET /api/view`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::app::{ActionHandle, GuardianApp};
use crate::auth::LoginMethod;
use crate::error::GuardianError;
use crate::models::{FraudDecision, PauseDecision, Screen};
use crate::stores::MarketplaceQuery;
use crate::Result;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct LoginMethodRequest {
    pub method: LoginMethod,
}

#[derive(Debug, Deserialize)]
pub struct PinInputRequest {
    pub pin: String,
}

#[derive(Debug, Deserialize)]
pub struct BiometricSetupRequest {
    pub enable: bool,
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub screen: Screen,
}

#[derive(Debug, Deserialize)]
pub struct FraudDecisionRequest {
    pub decision: FraudDecision,
}

#[derive(Debug, Deserialize)]
pub struct PauseDecisionRequest {
    pub decision: PauseDecision,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

type Reply = (StatusCode, Json<ApiResponse>);

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub app: GuardianApp,
}

/// =============================
/// Helpers: Error → Status
/// =============================

fn status_for(err: &GuardianError) -> StatusCode {
    match err {
        GuardianError::NotAuthenticated => StatusCode::UNAUTHORIZED,
        GuardianError::NotFound(_) => StatusCode::NOT_FOUND,
        GuardianError::ActionPending(_)
        | GuardianError::AlreadyAuthenticated
        | GuardianError::InvalidTransition { .. }
        | GuardianError::WrongScreen { .. } => StatusCode::CONFLICT,
        GuardianError::MethodUnavailable(_) => StatusCode::BAD_REQUEST,
        e if e.is_user_recoverable() => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(err: GuardianError) -> Reply {
    let status = status_for(&err);
    if status.is_server_error() {
        warn!(error = %err, "Request failed");
    }
    (status, Json(ApiResponse::error(err.to_string())))
}

/// Detaches the scheduled task and reports its label
fn accepted(result: Result<ActionHandle>) -> Reply {
    match result {
        Ok(handle) => (
            StatusCode::ACCEPTED,
            Json(ApiResponse::success(serde_json::json!({
                "pending": handle.label(),
            }))),
        ),
        Err(e) => failure(e),
    }
}

/// Answers an immediate action with the updated view
async fn with_view(app: &GuardianApp, result: Result<()>) -> Reply {
    match result {
        Ok(()) => (StatusCode::OK, Json(ApiResponse::success(app.view().await))),
        Err(e) => failure(e),
    }
}

/// =============================
/// Read Endpoints
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn current_view(State(state): State<ApiState>) -> Reply {
    (StatusCode::OK, Json(ApiResponse::success(state.app.view().await)))
}

async fn current_state(State(state): State<ApiState>) -> Reply {
    (StatusCode::OK, Json(ApiResponse::success(state.app.snapshot().await)))
}

/// =============================
/// Login Endpoints
/// =============================

async fn select_method(
    State(state): State<ApiState>,
    Json(req): Json<LoginMethodRequest>,
) -> Reply {
    let result = state.app.select_login_method(req.method).await;
    with_view(&state.app, result).await
}

async fn login_back(State(state): State<ApiState>) -> Reply {
    let result = state.app.back_to_login_choice().await;
    with_view(&state.app, result).await
}

async fn pin_input(State(state): State<ApiState>, Json(req): Json<PinInputRequest>) -> Reply {
    let result = state.app.enter_pin(&req.pin).await;
    with_view(&state.app, result).await
}

async fn confirm_pin_input(
    State(state): State<ApiState>,
    Json(req): Json<PinInputRequest>,
) -> Reply {
    let result = state.app.enter_confirm_pin(&req.pin).await;
    with_view(&state.app, result).await
}

async fn toggle_reveal(State(state): State<ApiState>) -> Reply {
    let result = state.app.toggle_pin_reveal().await;
    with_view(&state.app, result).await
}

async fn submit_pin(State(state): State<ApiState>) -> Reply {
    accepted(state.app.submit_pin().await)
}

async fn start_biometric(State(state): State<ApiState>) -> Reply {
    accepted(state.app.start_biometric().await)
}

async fn submit_setup(State(state): State<ApiState>) -> Reply {
    accepted(state.app.submit_pin_setup().await)
}

async fn biometric_setup(
    State(state): State<ApiState>,
    Json(req): Json<BiometricSetupRequest>,
) -> Reply {
    if req.enable {
        accepted(state.app.enable_biometric().await)
    } else {
        accepted(state.app.skip_biometric().await)
    }
}

async fn logout(State(state): State<ApiState>) -> Reply {
    accepted(state.app.logout().await)
}

/// =============================
/// Navigation & Screen Endpoints
/// =============================

async fn navigate(State(state): State<ApiState>, Json(req): Json<NavigateRequest>) -> Reply {
    info!(screen = %req.screen, "Navigation requested");
    accepted(state.app.navigate(req.screen).await)
}

async fn back(State(state): State<ApiState>) -> Reply {
    accepted(state.app.back().await)
}

async fn toggle_contact(State(state): State<ApiState>, Path(id): Path<u32>) -> Reply {
    accepted(state.app.toggle_contact(id).await)
}

async fn fraud_decision(
    State(state): State<ApiState>,
    Json(req): Json<FraudDecisionRequest>,
) -> Reply {
    accepted(state.app.resolve_fraud_alert(req.decision).await)
}

async fn pause_decision(
    State(state): State<ApiState>,
    Json(req): Json<PauseDecisionRequest>,
) -> Reply {
    accepted(state.app.resolve_security_pause(req.decision).await)
}

async fn call_support(State(state): State<ApiState>) -> Reply {
    accepted(state.app.call_support().await)
}

async fn add_document(State(state): State<ApiState>) -> Reply {
    accepted(state.app.add_document().await)
}

async fn create_goal(State(state): State<ApiState>) -> Reply {
    accepted(state.app.create_goal().await)
}

async fn contribute(State(state): State<ApiState>, Path(id): Path<String>) -> Reply {
    accepted(state.app.contribute(&id).await)
}

async fn marketplace_query(
    State(state): State<ApiState>,
    Json(query): Json<MarketplaceQuery>,
) -> Reply {
    let result = state.app.set_marketplace_query(query).await;
    with_view(&state.app, result).await
}

async fn contact_service(State(state): State<ApiState>, Path(id): Path<String>) -> Reply {
    accepted(state.app.contact_service(&id).await)
}

async fn start_listening(State(state): State<ApiState>) -> Reply {
    accepted(state.app.start_listening().await)
}

async fn stop_listening(State(state): State<ApiState>) -> Reply {
    let result = state.app.stop_listening().await;
    with_view(&state.app, result).await
}

/// =============================
/// Router
/// =============================

pub fn create_router(app: GuardianApp) -> Router {
    let state = ApiState { app };

    Router::new()
        .route("/health", get(health))
        .route("/api/view", get(current_view))
        .route("/api/state", get(current_state))
        .route("/api/login/method", post(select_method))
        .route("/api/login/back", post(login_back))
        .route("/api/login/pin", post(pin_input))
        .route("/api/login/confirm-pin", post(confirm_pin_input))
        .route("/api/login/reveal", post(toggle_reveal))
        .route("/api/login/submit", post(submit_pin))
        .route("/api/login/biometric", post(start_biometric))
        .route("/api/login/setup", post(submit_setup))
        .route("/api/login/setup/biometric", post(biometric_setup))
        .route("/api/logout", post(logout))
        .route("/api/navigate", post(navigate))
        .route("/api/back", post(back))
        .route("/api/contacts/:id/toggle", post(toggle_contact))
        .route("/api/fraud-alert/decision", post(fraud_decision))
        .route("/api/security-pause/decision", post(pause_decision))
        .route("/api/help/call", post(call_support))
        .route("/api/vault/documents", post(add_document))
        .route("/api/goals", post(create_goal))
        .route("/api/goals/:id/contribute", post(contribute))
        .route("/api/marketplace/query", put(marketplace_query))
        .route("/api/marketplace/services/:id/contact", post(contact_service))
        .route("/api/voice/listen", post(start_listening))
        .route("/api/voice/stop", post(stop_listening))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    app: GuardianApp,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(app);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::storage::PIN_KEY;
    use crate::auth::{FixedBiometric, InMemoryKeyValueStore};
    use crate::config::Delays;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    async fn instant_app() -> GuardianApp {
        let store = Arc::new(InMemoryKeyValueStore::with_entries([(PIN_KEY, "1234")]));
        let biometric = Arc::new(FixedBiometric {
            available: true,
            outcome: true,
        });
        GuardianApp::start(Delays::default().scaled(0.0), store, biometric)
            .await
            .unwrap()
    }

    async fn settle(app: &GuardianApp) {
        while !app.pending().is_idle() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    async fn call(
        router: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, ApiResponse) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(json) => Body::from(json.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let router = create_router(instant_app().await);
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn signed_out_view_is_the_login_screen() {
        let router = create_router(instant_app().await);
        let (status, body) = call(&router, "GET", "/api/view", None).await;

        assert_eq!(status, StatusCode::OK);
        let data = body.data.unwrap();
        assert_eq!(data["view"]["screen"], "login");
        assert_eq!(data["view"]["step"], "choose");
    }

    #[tokio::test]
    async fn navigation_without_session_is_unauthorized() {
        let router = create_router(instant_app().await);
        let (status, body) = call(
            &router,
            "POST",
            "/api/navigate",
            Some(serde_json::json!({ "screen": "expenses" })),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(!body.success);
    }

    #[tokio::test]
    async fn pin_login_then_toggle_contact() {
        let app = instant_app().await;
        let router = create_router(app.clone());

        let pin_method = Some(serde_json::json!({ "method": "pin" }));
        call(&router, "POST", "/api/login/method", pin_method).await;
        call(&router, "POST", "/api/login/pin", Some(serde_json::json!({ "pin": "1234" }))).await;

        let (status, body) = call(&router, "POST", "/api/login/submit", None).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body.data.unwrap()["pending"], "login");
        settle(&app).await;

        let (status, _) = call(
            &router,
            "POST",
            "/api/navigate",
            Some(serde_json::json!({ "screen": "trust" })),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        settle(&app).await;

        let (status, _) = call(&router, "POST", "/api/contacts/3/toggle", None).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        settle(&app).await;

        let (_, body) = call(&router, "GET", "/api/view", None).await;
        let view = body.data.unwrap()["view"].clone();
        assert_eq!(view["screen"], "trust");
        assert_eq!(view["contacts"][2]["enabled"], true);

        let (status, _) = call(&router, "POST", "/api/contacts/99/toggle", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wrong_pin_is_reported_on_the_login_view() {
        let app = instant_app().await;
        let router = create_router(app.clone());

        let pin_method = Some(serde_json::json!({ "method": "pin" }));
        call(&router, "POST", "/api/login/method", pin_method).await;
        call(&router, "POST", "/api/login/pin", Some(serde_json::json!({ "pin": "0000" }))).await;
        call(&router, "POST", "/api/login/submit", None).await;
        settle(&app).await;

        let (_, body) = call(&router, "GET", "/api/view", None).await;
        let view = body.data.unwrap()["view"].clone();
        assert_eq!(view["screen"], "login");
        assert_eq!(view["step"], "pin");
        assert_eq!(view["pin"], "");
        assert!(view["error"].is_string());
    }

    #[test]
    fn errors_map_to_statuses() {
        assert_eq!(
            status_for(&GuardianError::ActionPending("navigate".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(status_for(&GuardianError::PinMismatch), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            status_for(&GuardianError::StorageError("disk".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
