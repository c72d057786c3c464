//! Middleware layer.
//!
//! Middleware is a [`Handler`](crate::Handler) that owns another handler and
//! decides per request whether to answer itself or pass the request on.
//!
//! - [`Replay`]: lets a test client queue up the responses its next requests
//!   should receive, then replays them ahead of the wrapped application.

mod replay;
mod store;

pub use replay::{replay_reason, Replay, DEFAULT_PREFIX};
pub use store::{ClientKey, Recorded, ReplayOrder, ReplayStore};
