//! A2A Gateway HTTP server powered by axum.
//!
//! Serves:
//! - `GET  /`                       — Agent info
//! - `GET  /health`                 — Health check
//! - `POST /a2a`                    — Inbound messages (configured mode)
//! - `POST /a2a/strict`             — Inbound messages, mention required
//! - `POST /query`                  — Local question, never routed
//! - `POST /agents/register`        — Register a peer
//! - `GET  /agents`                 — Known peers
//! - `GET  /.well-known/agent.json` — Self-description
//! - `GET  /agentfacts`             — NANDA AgentFacts

use crate::a2a::agent_card::{self, AgentCard, AgentFacts};
use crate::a2a::error::{RoutingError, ValidationError};
use crate::a2a::routing_log::{FileSink, RoutingLogSink, TracingSink};
use crate::a2a::types::*;
use crate::a2a::{AgentDirectory, RemoteDispatcher, Router, RoutingLog, RoutingMode};
use crate::config::Config;
use crate::responder::{
    ChatCompletionResponder, LocalResponder, PlaceholderResponder, ResponderError,
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::CorsLayer;

/// Shared state for the A2A gateway.
#[derive(Clone)]
pub struct A2aState {
    pub router: Arc<Router>,
    pub card: Arc<AgentCard>,
    pub facts: Arc<AgentFacts>,
    pub agent_username: Option<String>,
    /// Mode of `POST /a2a`.
    pub mode: RoutingMode,
}

impl A2aState {
    fn directory(&self) -> &AgentDirectory {
        self.router.directory()
    }
}

/// Build the axum router for the A2A gateway.
pub fn build_router(state: A2aState) -> axum::Router {
    axum::Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/a2a", post(handle_message))
        .route("/a2a/strict", post(handle_strict_message))
        .route("/query", post(handle_query))
        .route("/agents/register", post(register_agent))
        .route("/agents", get(list_agents))
        .route("/.well-known/agent.json", get(get_agent_card))
        .route("/agentfacts", get(get_agent_facts))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Wire every collaborator from configuration and run startup discovery.
///
/// `deployment_host` is the public host handed over by the hosting platform,
/// if any.
pub async fn bootstrap(cfg: &Config, deployment_host: Option<&str>) -> anyhow::Result<A2aState> {
    let base_url = agent_card::resolve_public_base_url(
        cfg.agent.public_url.as_deref(),
        deployment_host,
        cfg.gateway.port,
    );
    let card = agent_card::describe(&cfg.agent, &base_url, &cfg.directory.inbound_path);
    let facts = agent_card::agent_facts(&cfg.agent, &card);

    let mut sinks: Vec<Arc<dyn RoutingLogSink>> = Vec::new();
    if cfg.routing_log.tracing {
        sinks.push(Arc::new(TracingSink));
    }
    if let Some(path) = &cfg.routing_log.path {
        let sink = FileSink::open(path)
            .map_err(|e| anyhow::anyhow!("Cannot open routing log {}: {}", path.display(), e))?;
        sinks.push(Arc::new(sink));
    }

    let responder: Arc<dyn LocalResponder> = match cfg.responder.resolved_api_key() {
        Some(key) => Arc::new(ChatCompletionResponder::new(
            &cfg.responder.api_base,
            key,
            &cfg.responder.model,
            &cfg.responder.system_prompt,
            Duration::from_secs(cfg.responder.timeout_secs),
        )),
        None => {
            tracing::warn!("No responder API key configured; local questions will fail");
            Arc::new(PlaceholderResponder)
        }
    };

    let directory = AgentDirectory::new();
    if let Some(registry_url) = &cfg.directory.registry_url {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.dispatch.timeout_secs))
            .build()?;
        directory
            .load_from_registry(
                &client,
                registry_url,
                &cfg.directory.inbound_path,
            )
            .await;
    }

    let router = Router::new(
        card.identifier.clone(),
        directory,
        RemoteDispatcher::new(Duration::from_secs(cfg.dispatch.timeout_secs)),
        responder,
        RoutingLog::new(sinks),
    );

    Ok(A2aState {
        router: Arc::new(router),
        card: Arc::new(card),
        facts: Arc::new(facts),
        agent_username: cfg.agent.username.clone(),
        mode: cfg.routing.mode,
    })
}

/// Start the A2A gateway server and run until Ctrl-C.
pub async fn start_server(state: A2aState, bind: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid gateway address: {}", e))?;

    tracing::info!("A2A Gateway starting on http://{}", addr);
    tracing::info!("   Agent:       {} ({})", state.card.display_name, state.card.identifier);
    tracing::info!("   Inbound:     {}", state.card.inbound_endpoint);
    tracing::info!("   Mode:        {:?}", state.mode);
    tracing::info!("   Known peers: {}", state.directory().len().await);

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("A2A Gateway shutting down");
        })
        .await?;

    Ok(())
}

// ─── Errors ──────────────────────────────────────────────────

/// Errors that leave the gateway as non-200 responses.
enum ApiError {
    Validation(ValidationError),
    Routing(RoutingError),
    Local(ResponderError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Validation(e) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({"error": "validation_error", "detail": e.to_string()}),
            ),
            Self::Routing(e) => {
                let RoutingError::RoutingRequired { text } = &e;
                (
                    StatusCode::BAD_REQUEST,
                    serde_json::json!({
                        "error": "routing_required",
                        "detail": e.to_string(),
                        "text": text,
                        "local_endpoint": "/query",
                    }),
                )
            }
            Self::Local(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({"detail": format!("Error processing query: {}", e)}),
            ),
        };
        (status, Json(body)).into_response()
    }
}

// ─── Handlers ────────────────────────────────────────────────

/// GET / — Agent info.
async fn root(State(state): State<A2aState>) -> Json<serde_json::Value> {
    let known: Vec<String> = state
        .directory()
        .known_identifiers()
        .await
        .into_iter()
        .map(String::from)
        .collect();
    Json(serde_json::json!({
        "agent_id": state.card.identifier,
        "agent_name": state.card.display_name,
        "version": state.card.version,
        "a2a_enabled": true,
        "routing_mode": state.mode,
        "known_agents": known,
        "endpoints": {
            "health": "GET /health",
            "a2a": "POST /a2a",
            "a2a_strict": "POST /a2a/strict",
            "query": "POST /query",
            "register": "POST /agents/register",
            "agents": "GET /agents",
            "agent_card": "GET /.well-known/agent.json",
            "agentfacts": "GET /agentfacts"
        }
    }))
}

/// GET /health — Health check.
async fn health_check(State(state): State<A2aState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": crate::VERSION,
        "a2a_enabled": true,
        "known_agents": state.directory().len().await,
    }))
}

/// POST /a2a — Route with the configured mode.
async fn handle_message(
    State(state): State<A2aState>,
    Json(msg): Json<InboundMessage>,
) -> Result<Json<ReplyEnvelope>, ApiError> {
    route(&state, &msg, state.mode).await
}

/// POST /a2a/strict — Route, mention required.
async fn handle_strict_message(
    State(state): State<A2aState>,
    Json(msg): Json<InboundMessage>,
) -> Result<Json<ReplyEnvelope>, ApiError> {
    route(&state, &msg, RoutingMode::Strict).await
}

async fn route(
    state: &A2aState,
    msg: &InboundMessage,
    mode: RoutingMode,
) -> Result<Json<ReplyEnvelope>, ApiError> {
    let reply = state
        .router
        .route(msg, mode)
        .await
        .map_err(ApiError::Routing)?;
    Ok(Json(reply.envelope))
}

/// POST /query — Local answer only.
async fn handle_query(
    State(state): State<A2aState>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let started = Instant::now();
    let conversation_id = format!("query-{}-{}", req.user_id, uuid::Uuid::new_v4());
    let answer = state
        .router
        .answer_locally(&req.question, &conversation_id)
        .await
        .map_err(ApiError::Local)?;
    Ok(Json(QueryResponse {
        answer,
        timestamp: chrono::Utc::now(),
        processing_time: started.elapsed().as_secs_f64(),
    }))
}

/// POST /agents/register — Upsert a peer.
async fn register_agent(
    State(state): State<A2aState>,
    Query(params): Query<RegisterParams>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let record = state
        .directory()
        .register(
            &params.agent_id,
            &params.agent_url,
            params.name,
            params.description,
        )
        .await
        .map_err(ApiError::Validation)?;
    Ok(Json(RegisterResponse {
        message: format!(
            "Agent {} registered at {}",
            record.identifier, record.inbound_endpoint
        ),
        agent_id: record.identifier.to_string(),
        total_known_agents: state.directory().len().await,
    }))
}

/// GET /agents — Known peers.
async fn list_agents(State(state): State<A2aState>) -> Json<serde_json::Value> {
    let known: BTreeMap<String, String> = state
        .directory()
        .list()
        .await
        .into_iter()
        .map(|r| (r.identifier.to_string(), r.inbound_endpoint))
        .collect();
    Json(serde_json::json!({
        "my_agent_id": state.card.identifier,
        "my_agent_name": state.card.display_name,
        "my_agent_username": state.agent_username,
        "known_agents": known,
    }))
}

/// GET /.well-known/agent.json — Self-description.
async fn get_agent_card(State(state): State<A2aState>) -> Json<AgentCard> {
    Json(state.card.as_ref().clone())
}

/// GET /agentfacts — NANDA AgentFacts.
async fn get_agent_facts(State(state): State<A2aState>) -> Json<AgentFacts> {
    Json(state.facts.as_ref().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state() -> A2aState {
        let agent = AgentConfig {
            id: "self-agent".to_string(),
            name: "Self Agent".to_string(),
            username: Some("self".to_string()),
            ..AgentConfig::default()
        };
        let card = agent_card::describe(&agent, "http://127.0.0.1:8000", "/a2a");
        let facts = agent_card::agent_facts(&agent, &card);
        let router = Router::new(
            card.identifier.clone(),
            AgentDirectory::new(),
            RemoteDispatcher::new(Duration::from_secs(2)),
            Arc::new(PlaceholderResponder),
            RoutingLog::default(),
        );
        A2aState {
            router: Arc::new(router),
            card: Arc::new(card),
            facts: Arc::new(facts),
            agent_username: agent.username,
            mode: RoutingMode::Permissive,
        }
    }

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).expect("json")))
            .expect("request")
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = build_router(test_state());
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .expect("request");

        let resp = app.oneshot(req).await.expect("response");
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["known_agents"], 0);
    }

    #[tokio::test]
    async fn test_agent_card_endpoint() {
        let app = build_router(test_state());
        let req = Request::builder()
            .uri("/.well-known/agent.json")
            .body(Body::empty())
            .expect("request");

        let resp = app.oneshot(req).await.expect("response");
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["identifier"], "self-agent");
        assert_eq!(json["inbound_endpoint"], "http://127.0.0.1:8000/a2a");
    }

    #[tokio::test]
    async fn test_agentfacts_endpoint() {
        let app = build_router(test_state());
        let req = Request::builder()
            .uri("/agentfacts")
            .body(Body::empty())
            .expect("request");

        let resp = app.oneshot(req).await.expect("response");
        let json = body_json(resp).await;
        assert_eq!(json["id"], "self-agent");
        assert_eq!(json["endpoints"]["static"][0], "http://127.0.0.1:8000/a2a");
    }

    #[tokio::test]
    async fn test_register_then_list() {
        let state = test_state();

        let req = Request::builder()
            .method("POST")
            .uri("/agents/register?agent_id=test-agent&agent_url=http%3A%2F%2Fexample.com%2Fa2a")
            .body(Body::empty())
            .expect("request");
        let resp = build_router(state.clone()).oneshot(req).await.expect("response");
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["total_known_agents"], 1);
        assert_eq!(json["agent_id"], "test-agent");

        let req = Request::builder()
            .uri("/agents")
            .body(Body::empty())
            .expect("request");
        let resp = build_router(state).oneshot(req).await.expect("response");
        let json = body_json(resp).await;
        assert_eq!(json["my_agent_id"], "self-agent");
        assert_eq!(json["my_agent_username"], "self");
        assert_eq!(json["known_agents"]["test-agent"], "http://example.com/a2a");
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_identifier() {
        let req = Request::builder()
            .method("POST")
            .uri("/agents/register?agent_id=bad%20id&agent_url=http%3A%2F%2Fexample.com")
            .body(Body::empty())
            .expect("request");
        let resp = build_router(test_state()).oneshot(req).await.expect("response");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_strict_endpoint_requires_mention() {
        let body = serde_json::json!({
            "content": {"text": "hello", "type": "text"},
            "role": "user",
            "conversation_id": "strict-001"
        });
        let resp = build_router(test_state())
            .oneshot(post_json("/a2a/strict", body))
            .await
            .expect("response");

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "routing_required");
        assert_eq!(json["text"], "hello");
        assert_eq!(json["local_endpoint"], "/query");
    }

    #[tokio::test]
    async fn test_unknown_mention_still_returns_envelope() {
        let body = serde_json::json!({
            "content": {"text": "@nobody are you there?", "type": "text"},
            "role": "user",
            "conversation_id": "routed-001"
        });
        let resp = build_router(test_state())
            .oneshot(post_json("/a2a", body))
            .await
            .expect("response");

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["conversation_id"], "routed-001");
        assert_eq!(json["agent_id"], "self-agent");
        let text = json["content"]["text"].as_str().expect("text");
        assert!(text.contains("@nobody"));
        assert!(text.contains("Known agents: none"));
    }

    #[tokio::test]
    async fn test_direct_message_without_responder_is_folded() {
        let body = serde_json::json!({
            "content": {"text": "What is 2+2?", "type": "text"},
            "role": "user",
            "conversation_id": "test-direct-001"
        });
        let resp = build_router(test_state())
            .oneshot(post_json("/a2a", body))
            .await
            .expect("response");

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert!(
            json["content"]["text"]
                .as_str()
                .expect("text")
                .starts_with("Error processing message")
        );
    }

    #[tokio::test]
    async fn test_query_without_responder_is_500() {
        let body = serde_json::json!({"question": "What is 10 * 10?", "user_id": "test-user"});
        let resp = build_router(test_state())
            .oneshot(post_json("/query", body))
            .await
            .expect("response");

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert!(
            json["detail"]
                .as_str()
                .expect("detail")
                .starts_with("Error processing query")
        );
    }
}
