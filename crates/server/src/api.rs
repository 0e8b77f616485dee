use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::to_bytes,
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dinebot_agent::{
    ChatContext, Components, DialogFulfillmentHandler, ErrorBody, MessageRouter, SuggestionWorker,
};
use dinebot_core::{CodeHookEvent, InterfaceError};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{error, warn};
use uuid::Uuid;

use crate::health;

pub const SESSION_HEADER: &str = "x-session-id";
const MAX_CHAT_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone, Default)]
pub struct AppState {
    pub router: Option<Arc<MessageRouter>>,
    pub fulfillment: Option<Arc<DialogFulfillmentHandler>>,
    pub worker: Option<Arc<SuggestionWorker>>,
}

impl From<Components> for AppState {
    fn from(components: Components) -> Self {
        Self {
            router: components.router,
            fulfillment: components.fulfillment,
            worker: components.worker,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let chat = Router::new()
        .route("/chat", post(chat).options(chat_preflight))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type,x-session-id"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("POST, OPTIONS"),
        ));

    Router::new()
        .merge(chat)
        .route("/dialog", post(dialog))
        .route("/health", get(health::health))
        .with_state(state)
}

pub async fn serve(
    address: &str,
    app: Router,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!(
        event_name = "system.http.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "http endpoint started"
    );
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await
}

async fn chat_preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn chat(State(state): State<AppState>, request: Request) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let context = ChatContext {
        session_header: request
            .headers()
            .get(HeaderName::from_static(SESSION_HEADER))
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        source_ip: request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(address)| address.ip().to_string()),
        correlation_id: correlation_id.clone(),
    };

    let Some(router) = state.router else {
        return error_response(&InterfaceError::Internal {
            message: "message router is not configured".to_string(),
            correlation_id,
        });
    };

    let body = match to_bytes(request.into_body(), MAX_CHAT_BODY_BYTES).await {
        Ok(body) => body,
        Err(source) => {
            warn!(
                event_name = "router.request.unreadable",
                correlation_id = %correlation_id,
                error = %source,
                "chat body exceeded the size limit or could not be read"
            );
            return error_response(&InterfaceError::bad_request(
                "Request body too large",
                correlation_id,
            ));
        }
    };

    match router.route(&body, &context).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(error) => error_response(&error),
    }
}

async fn dialog(State(state): State<AppState>, Json(event): Json<CodeHookEvent>) -> Response {
    match state.fulfillment {
        Some(handler) => Json(handler.handle(event).await).into_response(),
        None => {
            warn!(
                event_name = "dialog.handler.unconfigured",
                correlation_id = "dialog",
                "code hook received without a configured queue"
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorBody { code: 503, message: "Fulfillment is not configured".to_string() }),
            )
                .into_response()
        }
    }
}

fn error_response(error: &InterfaceError) -> Response {
    if error.status_code() >= 500 {
        error!(
            event_name = "router.request.failed",
            correlation_id = %error.correlation_id(),
            error = %error,
            "chat request failed"
        );
    }
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorBody::from(error))).into_response()
}
