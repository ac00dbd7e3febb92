//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::net::TcpListener;

use action_router::action::{ActionError, ActionReply, ActionRunner, TriggerAttrs};
use action_router::config::{TriggerConfig, TriggerSettings};
use action_router::{Shutdown, TriggerServer};

/// Runner that records every invocation and replies with the action id.
#[derive(Default, Clone)]
pub struct RecordingRunner {
    calls: Arc<Mutex<Vec<(String, TriggerAttrs)>>>,
}

#[allow(dead_code)]
impl RecordingRunner {
    pub fn calls(&self) -> Vec<(String, TriggerAttrs)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn action_ids(&self) -> Vec<String> {
        self.calls().into_iter().map(|(id, _)| id).collect()
    }
}

#[async_trait]
impl ActionRunner for RecordingRunner {
    async fn run(&self, action_id: &str, attrs: TriggerAttrs) -> Result<ActionReply, ActionError> {
        self.calls.lock().unwrap().push((action_id.to_string(), attrs));
        if action_id == "broken" {
            return Err(ActionError::Failed {
                action_id: action_id.to_string(),
                reason: "boom".into(),
            });
        }
        Ok(ActionReply::new(200, Some(json!({ "action": action_id }))))
    }
}

/// Trigger settings bound to loopback on an ephemeral port.
pub fn loopback() -> Option<TriggerSettings> {
    Some(TriggerSettings {
        port: Some(0),
        host: "127.0.0.1".into(),
        ..TriggerSettings::default()
    })
}

/// Start a trigger server on an ephemeral port.
///
/// The server stops when the returned `Shutdown` is triggered or dropped.
pub async fn start_trigger(
    config: &TriggerConfig,
    runner: Arc<dyn ActionRunner>,
) -> (SocketAddr, Shutdown) {
    let server = TriggerServer::new(config, runner).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(server.run(listener, rx));
    (addr, shutdown)
}
