//! WebSocket endpoint for change subscriptions.
//!
//! A client opens one socket and subscribes to any of the three channels:
//!
//! ```text
//! Client                      Session                      TodoStore
//!   ├─ {"type":"subscribe",     │                             │
//!   │   "channel":"todoAdded"} >├─ subscribe(TodoAdded) ─────>│
//!   │<─ {"type":"subscribed"} ──┤                             │
//!   │                           │<── Todo (addTodo mutation) ─┤
//!   │<─ {"type":"event",        │                             │
//!   │    "channel":"todoAdded", │                             │
//!   │    "todo":{...}} ─────────┤                             │
//! ```
//!
//! Each subscribed channel gets its own forwarding task that drains the store
//! subscription into the connection's outbound queue. A single writer task owns
//! the socket's sending half, so confirmations and events share one ordered path.

use crate::models::{Channel, Todo};
use crate::server::AppState;
use crate::store::SharedStore;
use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Client → server message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Subscribe { channel: Channel },
    Unsubscribe { channel: Channel },
    Ping,
}

/// Server → client message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    Subscribed { channel: Channel },
    Unsubscribed { channel: Channel },
    Event { channel: Channel, todo: Todo },
    Pong,
    Error { message: String },
}

/// Per-connection subscription state
///
/// Dropping the session detaches every listener it registered.
pub struct SubscriptionSession {
    store: SharedStore,
    outbound: mpsc::UnboundedSender<ServerMessage>,
    forwarders: HashMap<Channel, JoinHandle<()>>,
}

impl SubscriptionSession {
    pub fn new(store: SharedStore, outbound: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self {
            store,
            outbound,
            forwarders: HashMap::new(),
        }
    }

    /// Channels this session currently listens on
    pub fn channels(&self) -> Vec<Channel> {
        Channel::ALL
            .into_iter()
            .filter(|c| self.forwarders.contains_key(c))
            .collect()
    }

    /// Parse and apply a raw text frame
    pub async fn handle_text(&mut self, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(msg) => self.handle(msg).await,
            Err(e) => {
                warn!(error = %e, "Failed to parse subscription message");
                self.reply(ServerMessage::Error {
                    message: format!("invalid message: {}", e),
                });
            }
        }
    }

    pub async fn handle(&mut self, msg: ClientMessage) {
        match msg {
            ClientMessage::Subscribe { channel } => self.subscribe(channel).await,
            ClientMessage::Unsubscribe { channel } => self.unsubscribe(channel).await,
            ClientMessage::Ping => self.reply(ServerMessage::Pong),
        }
    }

    async fn subscribe(&mut self, channel: Channel) {
        if self.forwarders.contains_key(&channel) {
            self.reply(ServerMessage::Subscribed { channel });
            return;
        }

        // Confirm while holding the store lock so the confirmation is queued
        // ahead of any event this subscription can observe.
        let mut subscription = {
            let mut store = self.store.lock().await;
            let subscription = store.subscribe(channel);
            self.reply(ServerMessage::Subscribed { channel });
            subscription
        };

        let outbound = self.outbound.clone();
        let handle = tokio::spawn(async move {
            while let Some(todo) = subscription.next().await {
                if outbound.send(ServerMessage::Event { channel, todo }).is_err() {
                    break;
                }
            }
            debug!(%channel, "Forwarder terminated");
        });

        info!(%channel, "Client subscribed");
        self.forwarders.insert(channel, handle);
    }

    async fn unsubscribe(&mut self, channel: Channel) {
        if let Some(handle) = self.forwarders.remove(&channel) {
            handle.abort();
            // Wait for the forwarder to stop so no event trails the confirmation
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!(%channel, error = %e, "Forwarder failed");
                }
            }
            info!(%channel, "Client unsubscribed");
        }
        self.reply(ServerMessage::Unsubscribed { channel });
    }

    fn reply(&self, msg: ServerMessage) {
        if self.outbound.send(msg).is_err() {
            debug!("Outbound queue closed, dropping reply");
        }
    }
}

impl Drop for SubscriptionSession {
    fn drop(&mut self) {
        for (_, handle) in self.forwarders.drain() {
            handle.abort();
        }
    }
}

/// `GET /subscriptions` upgrade handler
pub async fn handle(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    info!("Subscription connection requested");
    ws.on_upgrade(move |socket| handle_socket(socket, state.store))
}

async fn handle_socket(socket: WebSocket, store: SharedStore) {
    info!("Subscription connection established");

    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ServerMessage>();
    let mut session = SubscriptionSession::new(store, outbound_tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    error!(error = %e, "Failed to serialize server message");
                    continue;
                }
            };

            if sender.send(Message::Text(text)).await.is_err() {
                // Client disconnected
                break;
            }
        }
        debug!("Subscription send task terminated");
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => session.handle_text(&text).await,
                Message::Binary(_) => {
                    warn!("Received unexpected binary message");
                    session.reply(ServerMessage::Error {
                        message: "binary messages are not supported".to_string(),
                    });
                }
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Close(_) => {
                    info!("Client requested close");
                    break;
                }
            }
        }
        debug!("Subscription receive task terminated");
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }

    info!("Subscription connection closed");
}
