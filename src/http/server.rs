//! HTTP trigger server setup.
//!
//! # Responsibilities
//! - Merge the trigger's handlers and keep the routable ones
//! - Register one axum route per optimized handler
//! - Wire up middleware (request ID, tracing, timeout, body limit, CORS)
//! - Decode request content, resolve the action, hand it to the runner
//! - Bind server to listener and stop on the shutdown broadcast

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{on, MethodFilter},
    Router,
};
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::action::{ActionRunner, TriggerAttrs};
use crate::condition::{evaluator_for, ConditionEvaluator, RequestContent};
use crate::config::{TriggerConfig, TriggerSettings};
use crate::http::cors::cors_layer;
use crate::http::request::{decode_content, join_query, request_id, MakeRequestUuidV4, X_REQUEST_ID};
use crate::http::response;
use crate::observability::metrics;
use crate::routing::{
    routable, serialize_content, Dispatcher, HandlerOptimizer, InvalidHandler, OptimizeError,
    OptimizedHandler,
};

/// Errors raised while building a trigger server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("no settings found for trigger '{0}'")]
    MissingSettings(String),

    #[error(transparent)]
    Optimize(#[from] OptimizeError),

    #[error("route {method} {path} is declared by two handlers with different settings")]
    DuplicateRoute { method: String, path: String },

    #[error("route '{path}' conflicts with another route: {reason}")]
    RouteConflict { path: String, reason: String },

    #[error("invalid CORS setting: {0}")]
    Cors(String),
}

/// A route as registered on the HTTP router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredRoute {
    pub method: String,
    pub path: String,
    pub default_action_id: Option<String>,
    pub dispatches: usize,
}

/// State shared by all routes of one trigger.
#[derive(Clone)]
struct TriggerState {
    trigger_id: Arc<str>,
    dispatcher: Arc<Dispatcher>,
    runner: Arc<dyn ActionRunner>,
}

/// One optimized handler bound to its validated method.
struct RouteEntry {
    method: String,
    handler: OptimizedHandler,
}

/// HTTP server for one trigger instance.
pub struct TriggerServer {
    id: String,
    bind_address: String,
    router: Router,
    routes: Vec<RegisteredRoute>,
}

impl TriggerServer {
    /// Optimize the trigger's handlers and build the HTTP router.
    ///
    /// Configuration problems are fatal for this trigger.
    pub fn new(config: &TriggerConfig, runner: Arc<dyn ActionRunner>) -> Result<Self, ServerError> {
        let settings = config
            .settings
            .as_ref()
            .ok_or_else(|| ServerError::MissingSettings(config.id.clone()))?;
        let bind_address = settings
            .bind_address()
            .ok_or_else(|| ServerError::MissingSettings(config.id.clone()))?;

        let merged = HandlerOptimizer::new(config.dispatch.duplicate_default).optimize(&config.handlers)?;
        let handlers = routable(merged, config.dispatch.invalid_handler)?;

        let evaluator = evaluator_for(config.dispatch.evaluator);
        report_condition_problems(&config.id, evaluator.as_ref(), &handlers);

        let state = TriggerState {
            trigger_id: Arc::from(config.id.as_str()),
            dispatcher: Arc::new(Dispatcher::new(config.id.clone(), evaluator)),
            runner,
        };

        let mut router = Router::new();
        let mut routes = Vec::with_capacity(handlers.len());
        let mut seen = HashSet::new();
        let mut patterns: matchit::Router<()> = matchit::Router::new();

        for handler in handlers {
            let (method, declared) = handler.validate().map_err(|reason| OptimizeError::InvalidHandler {
                label: handler.label(),
                reason,
            })?;
            let path = route_pattern(declared);

            if !seen.insert((method.clone(), path.clone())) {
                return Err(ServerError::DuplicateRoute { method, path });
            }
            // Pre-check with the router axum uses so conflicts surface as errors, not panics.
            if !seen.iter().any(|(m, p)| p == &path && m != &method) {
                patterns.insert(path.clone(), ()).map_err(|e| ServerError::RouteConflict {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            }
            let filter = method_filter(&method).ok_or_else(|| OptimizeError::InvalidHandler {
                label: handler.label(),
                reason: InvalidHandler::UnsupportedMethod(method.clone()),
            })?;

            tracing::info!(
                trigger = %config.id,
                method = %method,
                path = %path,
                default_action_id = ?handler.default_action_id(),
                dispatches = handler.dispatches().len(),
                "Registered handler"
            );
            routes.push(RegisteredRoute {
                method: method.clone(),
                path: path.clone(),
                default_action_id: handler.default_action_id().map(str::to_string),
                dispatches: handler.dispatches().len(),
            });

            let entry = Arc::new(RouteEntry { method, handler });
            let state = state.clone();
            router = router.route(
                &path,
                on(
                    filter,
                    move |Path(path_params): Path<HashMap<String, String>>,
                          Query(query): Query<Vec<(String, String)>>,
                          headers: HeaderMap,
                          body: Bytes| {
                        let entry = Arc::clone(&entry);
                        let state = state.clone();
                        async move { handle_request(state, entry, path_params, query, headers, body).await }
                    },
                ),
            );
        }

        let router = Self::apply_layers(router, settings, config)?;
        Ok(Self {
            id: config.id.clone(),
            bind_address,
            router,
            routes,
        })
    }

    /// Wrap the router with all middleware layers.
    #[allow(deprecated)]
    fn apply_layers(
        router: Router,
        settings: &TriggerSettings,
        config: &TriggerConfig,
    ) -> Result<Router, ServerError> {
        Ok(router
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(settings.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(settings.request_timeout_secs)))
            .layer(cors_layer(&config.cors)?)
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4)))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Configured `host:port`.
    pub fn bind_address(&self) -> &str {
        &self.bind_address
    }

    pub fn routes(&self) -> &[RegisteredRoute] {
        &self.routes
    }

    /// The fully layered router, for in-process serving and tests.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve until the shutdown broadcast fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            trigger = %self.id,
            address = %addr,
            routes = self.routes.len(),
            "Trigger server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!(trigger = %self.id, "Trigger server stopped");
        Ok(())
    }
}

/// Per-request pipeline: decode, resolve, run.
async fn handle_request(
    state: TriggerState,
    entry: Arc<RouteEntry>,
    path_params: HashMap<String, String>,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let request_id = request_id(&headers).to_string();

    tracing::debug!(
        trigger = %state.trigger_id,
        request_id = %request_id,
        route = %entry.handler.label(),
        "Received request"
    );

    let content = match decode_content(&body) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(trigger = %state.trigger_id, request_id = %request_id, error = %e, "Invalid JSON body");
            metrics::record_request(&state.trigger_id, &entry.method, 400, start);
            return response::bad_request(e.to_string());
        }
    };

    let serialized = serialize_content(&content);
    let resolution = state
        .dispatcher
        .resolve_content(&entry.handler, &RequestContent::decoded(&serialized, &content));
    metrics::record_dispatch(&state.trigger_id, resolution.outcome());

    let Some(action_id) = resolution.action_id() else {
        tracing::warn!(
            trigger = %state.trigger_id,
            request_id = %request_id,
            route = %entry.handler.label(),
            "No condition matched and no default action"
        );
        metrics::record_request(&state.trigger_id, &entry.method, 404, start);
        return response::unresolved();
    };

    let attrs = TriggerAttrs::new(path_params.into_iter().collect(), join_query(query), content);
    let res = match state.runner.run(action_id, attrs).await {
        Ok(reply) => reply.into_response(),
        Err(e) => {
            tracing::warn!(
                trigger = %state.trigger_id,
                request_id = %request_id,
                action_id = %action_id,
                error = %e,
                "Action failed"
            );
            response::action_failed(&e)
        }
    };

    metrics::record_request(&state.trigger_id, &entry.method, res.status().as_u16(), start);
    res
}

/// Log conditions the evaluator cannot parse; they will never match.
fn report_condition_problems(trigger: &str, evaluator: &dyn ConditionEvaluator, handlers: &[OptimizedHandler]) {
    for handler in handlers {
        for dispatch in handler.dispatches() {
            if let Err(e) = evaluator.check(&dispatch.condition) {
                tracing::warn!(
                    trigger = %trigger,
                    evaluator = evaluator.name(),
                    handler = %handler.label(),
                    action_id = %dispatch.action_id,
                    error = %e,
                    "Condition will be skipped at dispatch time"
                );
            }
        }
    }
}

/// Translate `:name` / `*name` segments into axum's `{name}` / `{*name}`.
pub fn route_pattern(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':') {
                format!("{{{name}}}")
            } else if let Some(name) = segment.strip_prefix('*') {
                format!("{{*{name}}}")
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn method_filter(method: &str) -> Option<MethodFilter> {
    match method {
        "GET" => Some(MethodFilter::GET),
        "POST" => Some(MethodFilter::POST),
        "PUT" => Some(MethodFilter::PUT),
        "PATCH" => Some(MethodFilter::PATCH),
        "DELETE" => Some(MethodFilter::DELETE),
        "OPTIONS" => Some(MethodFilter::OPTIONS),
        _ => None,
    }
}
