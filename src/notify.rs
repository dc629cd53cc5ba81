// Change-notification fan-out for store mutations

use crate::models::{Channel, Todo};
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::debug;

/// Registry of active listeners, one list per channel
///
/// Publishing is synchronous: each event is pushed into every live listener's
/// unbounded queue before `publish` returns. Listeners whose receiving half has
/// been dropped are pruned on the next publish to their channel.
#[derive(Debug, Default)]
pub struct Broadcaster {
    listeners: HashMap<Channel, Vec<mpsc::UnboundedSender<Todo>>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new listener on `channel`
    pub fn subscribe(&mut self, channel: Channel) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners.entry(channel).or_default().push(tx);
        debug!(%channel, "Listener registered");
        Subscription { channel, rx }
    }

    /// Push `todo` to every live listener on `channel`
    ///
    /// Returns the number of listeners the event was delivered to.
    pub fn publish(&mut self, channel: Channel, todo: &Todo) -> usize {
        let Some(senders) = self.listeners.get_mut(&channel) else {
            return 0;
        };

        senders.retain(|tx| tx.send(todo.clone()).is_ok());
        debug!(%channel, id = %todo.id, delivered = senders.len(), "Published change event");
        senders.len()
    }

    /// Number of listeners on `channel` that have not detached
    pub fn listener_count(&self, channel: Channel) -> usize {
        self.listeners
            .get(&channel)
            .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }
}

/// Receiving end of a single channel subscription
///
/// Dropping it detaches the listener.
#[derive(Debug)]
pub struct Subscription {
    channel: Channel,
    rx: mpsc::UnboundedReceiver<Todo>,
}

impl Subscription {
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Wait for the next event, `None` once the broadcaster is gone
    pub async fn recv(&mut self) -> Option<Todo> {
        self.rx.recv().await
    }

    /// Take the next already-queued event without waiting
    pub fn try_recv(&mut self) -> Option<Todo> {
        self.rx.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = Todo;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Todo>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
