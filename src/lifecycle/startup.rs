//! Startup orchestration.
//!
//! # Responsibilities
//! - Build one trigger server per configured trigger
//! - Bind every listener before any server starts serving
//! - Run servers until a shutdown signal, then drain them
//!
//! # Design Decisions
//! - Fail fast: any trigger that cannot be built or bound is fatal
//! - Listeners start last (traffic only when every trigger is ready)
//! - A server exiting on its own stops the others

use std::future::Future;
use std::sync::Arc;

use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinSet;

use crate::action::{ActionRegistry, ActionRunner};
use crate::condition::evaluator_for;
use crate::config::AppConfig;
use crate::http::server::route_pattern;
use crate::http::{ServerError, TriggerServer};
use crate::lifecycle::{shutdown_signal, Shutdown};
use crate::routing::HandlerOptimizer;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("no triggers configured")]
    NoTriggers,

    #[error("trigger '{trigger}': {source}")]
    Server {
        trigger: String,
        #[source]
        source: ServerError,
    },

    #[error("trigger '{trigger}' failed to bind {address}: {source}")]
    Bind {
        trigger: String,
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Build servers backed by the built-in action registry.
pub fn build_servers(config: &AppConfig) -> Result<Vec<TriggerServer>, StartupError> {
    let registry = ActionRegistry::from_config(&config.actions);
    if registry.is_empty() {
        tracing::warn!("No actions configured; every resolved request will fail");
    }
    build_servers_with(config, Arc::new(registry))
}

/// Build servers that hand resolved actions to `runner`.
pub fn build_servers_with(
    config: &AppConfig,
    runner: Arc<dyn ActionRunner>,
) -> Result<Vec<TriggerServer>, StartupError> {
    if config.triggers.is_empty() {
        return Err(StartupError::NoTriggers);
    }

    config
        .triggers
        .iter()
        .map(|trigger| {
            TriggerServer::new(trigger, Arc::clone(&runner)).map_err(|source| StartupError::Server {
                trigger: trigger.id.clone(),
                source,
            })
        })
        .collect()
}

/// Routing table of every trigger, built exactly as `run` builds its servers.
///
/// Fails whenever `run` would fail before binding. Each merged handler is
/// listed with its route, or the reason it is dropped, and each condition
/// with the evaluator's parse error, if any.
pub fn routing_table(config: &AppConfig) -> Result<Value, StartupError> {
    let servers = build_servers(config)?;

    let mut triggers = Vec::with_capacity(servers.len());
    for (trigger, server) in config.triggers.iter().zip(&servers) {
        let evaluator = evaluator_for(trigger.dispatch.evaluator);
        let handlers = HandlerOptimizer::new(trigger.dispatch.duplicate_default)
            .optimize(&trigger.handlers)
            .map_err(|e| StartupError::Server {
                trigger: trigger.id.clone(),
                source: e.into(),
            })?;

        let rows: Vec<Value> = handlers
            .iter()
            .map(|handler| {
                let dispatches: Vec<Value> = handler
                    .dispatches()
                    .iter()
                    .map(|d| {
                        json!({
                            "actionId": d.action_id,
                            "condition": d.condition,
                            "error": evaluator.check(&d.condition).err().map(|e| e.to_string()),
                        })
                    })
                    .collect();
                let (route, dropped) = match handler.validate() {
                    Ok((method, path)) => (Some(format!("{method} {}", route_pattern(path))), None),
                    Err(reason) => (None, Some(reason.to_string())),
                };
                json!({
                    "handler": handler.label(),
                    "route": route,
                    "dropped": dropped,
                    "defaultActionId": handler.default_action_id(),
                    "dispatches": dispatches,
                })
            })
            .collect();

        triggers.push(json!({
            "id": server.id(),
            "address": server.bind_address(),
            "evaluator": evaluator.name(),
            "routes": server.routes(),
            "handlers": rows,
        }));
    }
    Ok(json!({ "triggers": triggers }))
}

/// Bind each server to its configured address.
pub async fn bind(servers: Vec<TriggerServer>) -> Result<Vec<(TriggerServer, TcpListener)>, StartupError> {
    let mut bound = Vec::with_capacity(servers.len());
    for server in servers {
        let listener = TcpListener::bind(server.bind_address())
            .await
            .map_err(|source| StartupError::Bind {
                trigger: server.id().to_string(),
                address: server.bind_address().to_string(),
                source,
            })?;
        tracing::info!(
            trigger = %server.id(),
            address = %server.bind_address(),
            "Listener bound"
        );
        bound.push((server, listener));
    }
    Ok(bound)
}

/// Serve bound triggers until `signal` completes.
pub async fn serve_until<F>(bound: Vec<(TriggerServer, TcpListener)>, signal: F) -> Result<(), StartupError>
where
    F: Future<Output = ()>,
{
    let shutdown = Shutdown::new();
    let mut tasks = JoinSet::new();
    for (server, listener) in bound {
        let rx = shutdown.subscribe();
        tasks.spawn(server.run(listener, rx));
    }

    let early = tokio::select! {
        () = signal => None,
        Some(result) = tasks.join_next() => Some(result),
    };

    if early.is_some() {
        tracing::warn!("Trigger server exited early; stopping the rest");
    }
    tracing::info!(servers = shutdown.receiver_count(), "Shutting down");
    shutdown.trigger();

    let mut outcome = match early {
        Some(result) => result?.map_err(StartupError::from),
        None => Ok(()),
    };
    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result?.map_err(StartupError::from) {
            tracing::error!(error = %e, "Trigger server failed during shutdown");
            outcome = outcome.and(Err(e));
        }
    }
    outcome
}

/// Build, bind and serve every trigger until SIGINT/SIGTERM.
pub async fn run(config: AppConfig) -> Result<(), StartupError> {
    let servers = build_servers(&config)?;
    let bound = bind(servers).await?;
    serve_until(bound, shutdown_signal()).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
