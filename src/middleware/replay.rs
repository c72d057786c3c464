//! Client-driven failure replay.
//!
//! A test client programs the responses its own next requests should get:
//!
//! ```text
//! POST /__testing__/503   body: oops    → 200 OK          (queued)
//! GET  /anything                        → 503 Explanation (replayed, body "oops")
//! GET  /anything                        → downstream app  (queue empty)
//! ```
//!
//! Queues are per client (see [`ClientKey`]) and consumed newest-first
//! unless [`ReplayOrder::Fifo`] is configured.

use std::sync::Arc;

use http::StatusCode;
use tracing::{debug, warn};

use crate::handler::{private, BoxFuture, BoxedHandler, ErasedHandler, Handler};
use crate::request::Request;
use crate::response::{ContentType, Response};

use super::store::{ClientKey, Recorded, ReplayOrder, ReplayStore};

/// Control-path prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "/__testing__";

/// Middleware that replays client-programmed responses in front of an
/// application.
///
/// ```rust,no_run
/// use faultline::{Router, Server};
/// use faultline::middleware::{Replay, ReplayStore};
///
/// # async fn run(app: Router) {
/// let store = ReplayStore::new();
/// let app = Replay::new(app).store(store.clone());
/// Server::bind("127.0.0.1:3000").serve(app).await.unwrap();
/// # }
/// ```
#[derive(Clone)]
pub struct Replay {
    downstream: BoxedHandler,
    store: ReplayStore,
    prefix: Arc<str>,
    order: ReplayOrder,
}

impl Replay {
    pub fn new(downstream: impl Handler) -> Self {
        Self {
            downstream: downstream.into_boxed_handler(),
            store: ReplayStore::new(),
            prefix: Arc::from(DEFAULT_PREFIX),
            order: ReplayOrder::default(),
        }
    }

    /// Paths starting with `prefix` are control requests.
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = Arc::from(prefix);
        self
    }

    /// Uses `store` instead of a private one, so the caller can inspect or
    /// reset queues.
    pub fn store(mut self, store: ReplayStore) -> Self {
        self.store = store;
        self
    }

    pub fn order(mut self, order: ReplayOrder) -> Self {
        self.order = order;
        self
    }

    pub fn replay_store(&self) -> &ReplayStore {
        &self.store
    }

    /// Records, replays, or forwards `req`.
    pub async fn handle(&self, req: Request) -> Response {
        self.dispatch(req).await
    }

    fn dispatch(&self, req: Request) -> BoxFuture {
        let client = ClientKey::from_request(&req);

        if req.path().starts_with(&*self.prefix) {
            return Box::pin(std::future::ready(self.record(client, &req)));
        }

        match self.store.pop(&client, self.order) {
            Some(recorded) => {
                debug!(%client, status = recorded.status.as_u16(), path = req.path(), "replaying");
                Box::pin(std::future::ready(replay_response(recorded)))
            }
            None => {
                debug!(%client, path = req.path(), "forwarding");
                self.downstream.call(req)
            }
        }
    }

    fn record(&self, client: ClientKey, req: &Request) -> Response {
        let Some(status) = parse_status(req.path()) else {
            warn!(%client, path = req.path(), "control request without a status code");
            return plain(StatusCode::BAD_REQUEST);
        };

        debug!(%client, status = status.as_u16(), bytes = req.body().len(), "recording");
        self.store.push(client, Recorded { status, body: req.body().clone() });
        plain(StatusCode::OK)
    }
}

/// Status code from the last path segment. Anything that is not an integer
/// in the 200..=999 range is rejected: a 1xx is never a final response.
fn parse_status(path: &str) -> Option<StatusCode> {
    let segment = path.rsplit('/').next()?;
    let code: u16 = segment.parse().ok()?;
    StatusCode::from_u16(code).ok().filter(|s| !s.is_informational())
}

/// Reason phrase sent with a replayed status.
///
/// Only 200, 400 and 401 get their usual phrase; everything else reads
/// `Explanation`.
pub fn replay_reason(status: StatusCode) -> &'static str {
    match status {
        StatusCode::OK           => "OK",
        StatusCode::BAD_REQUEST  => "Bad Request",
        StatusCode::UNAUTHORIZED => "Unauthorized",
        _                        => "Explanation",
    }
}

fn replay_response(recorded: Recorded) -> Response {
    Response::builder()
        .status(recorded.status)
        .reason(replay_reason(recorded.status))
        .bytes(ContentType::Plain, recorded.body)
}

fn plain(status: StatusCode) -> Response {
    Response::builder()
        .status(status)
        .reason(replay_reason(status))
        .bytes(ContentType::Plain, bytes::Bytes::new())
}

impl private::Sealed for Replay {}

impl Handler for Replay {
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(self)
    }
}

impl ErasedHandler for Replay {
    fn call(&self, req: Request) -> BoxFuture {
        self.dispatch(req)
    }
}
