//! Live queries over the record store.
//!
//! Writes publish a `ChangeEvent` on a broadcast feed. An `InterviewSubscription`
//! is a handle owned by its caller: it yields the full interview list of one
//! user after every relevant change, and dropping it releases the listener.

use std::sync::Arc;

use futures_util::stream::{self, Stream};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

use crate::errors::AppError;
use crate::models::interview::Interview;
use crate::store::RecordStore;

const FEED_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Collection {
    #[serde(rename = "interview")]
    Interview,
    #[serde(rename = "userAnswers")]
    UserAnswers,
    #[serde(rename = "users")]
    Users,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub user_id: String,
}

impl ChangeEvent {
    pub fn new(collection: Collection, user_id: impl Into<String>) -> Self {
        Self {
            collection,
            user_id: user_id.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }
}

impl ChangeFeed {
    pub fn publish(&self, event: ChangeEvent) {
        // no listeners is not an error
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    #[cfg(test)]
    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Live query for `interview` documents where `userId == user_id`.
pub struct InterviewSubscription {
    store: Arc<dyn RecordStore>,
    user_id: String,
    rx: broadcast::Receiver<ChangeEvent>,
    primed: bool,
}

impl InterviewSubscription {
    /// Registers the listener before the first read so no write is missed.
    pub fn open(store: Arc<dyn RecordStore>, user_id: impl Into<String>) -> Self {
        let rx = store.changes().subscribe();
        Self {
            store,
            user_id: user_id.into(),
            rx,
            primed: false,
        }
    }

    /// Returns the current snapshot on the first call, then waits for the next
    /// change to this user's interviews. `None` once the feed is closed.
    pub async fn next_snapshot(&mut self) -> Option<Result<Vec<Interview>, AppError>> {
        if self.primed {
            loop {
                match self.rx.recv().await {
                    Ok(event) if self.is_relevant(&event) => break,
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(
                            "Interview subscription for {} lagged by {skipped} events, re-reading",
                            self.user_id
                        );
                        break;
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
            self.drain_pending();
        }
        self.primed = true;
        Some(self.store.list_interviews(&self.user_id).await)
    }

    /// Queued events are covered by the read that follows; last snapshot wins.
    fn drain_pending(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    fn is_relevant(&self, event: &ChangeEvent) -> bool {
        event.collection == Collection::Interview && event.user_id == self.user_id
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<Interview>, AppError>> {
        stream::unfold(self, |mut sub| async move {
            sub.next_snapshot().await.map(|snapshot| (snapshot, sub))
        })
    }
}
