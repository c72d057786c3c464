//! Per-client replay queues.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use http::StatusCode;

use crate::request::Request;

/// Identity of the client a queue belongs to.
///
/// Taken from the first `X-Forwarded-For` entry, else the peer IP. Requests
/// carrying neither share the single [anonymous](ClientKey::anonymous) key.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ClientKey(Option<String>);

impl ClientKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(Some(key.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn from_request(req: &Request) -> Self {
        if let Some(forwarded) = req.header("x-forwarded-for") {
            let first = forwarded.split(',').next().unwrap_or_default();
            return Self::new(first.trim());
        }
        match req.remote_addr() {
            Some(addr) => Self::new(addr.ip().to_string()),
            None => Self::anonymous(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().unwrap_or("-"))
    }
}

/// A response queued by a control request, waiting to be replayed.
#[derive(Clone, Debug, PartialEq)]
pub struct Recorded {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Which end of a client's queue replays consume.
///
/// New entries always go to the front.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ReplayOrder {
    /// Most recently queued first.
    #[default]
    Lifo,
    /// Oldest first.
    Fifo,
}

/// Shared map from [`ClientKey`] to its queue of [`Recorded`] responses.
///
/// Clones share the same queues. Each push or pop holds the key's shard
/// lock for the whole lookup-or-create plus mutation.
#[derive(Clone, Default)]
pub struct ReplayStore {
    queues: Arc<DashMap<ClientKey, VecDeque<Recorded>>>,
}

impl ReplayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `recorded` at the front of `key`'s queue.
    pub fn push(&self, key: ClientKey, recorded: Recorded) {
        self.queues.entry(key).or_default().push_front(recorded);
    }

    /// Removes and returns the next entry for `key`, if any.
    pub fn pop(&self, key: &ClientKey, order: ReplayOrder) -> Option<Recorded> {
        let mut queue = self.queues.entry(key.clone()).or_default();
        match order {
            ReplayOrder::Lifo => queue.pop_front(),
            ReplayOrder::Fifo => queue.pop_back(),
        }
    }

    /// Number of entries waiting for `key`.
    pub fn pending(&self, key: &ClientKey) -> usize {
        self.queues.get(key).map_or(0, |q| q.len())
    }

    /// Keys that have a queue, empty or not.
    pub fn clients(&self) -> Vec<ClientKey> {
        self.queues.iter().map(|e| e.key().clone()).collect()
    }

    /// Drops `key`'s queue, returning how many entries were discarded.
    pub fn clear_client(&self, key: &ClientKey) -> usize {
        self.queues.remove(key).map_or(0, |(_, q)| q.len())
    }

    /// Drops every queue.
    pub fn clear(&self) {
        self.queues.clear();
    }
}
