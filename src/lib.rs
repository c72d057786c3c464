//! # faultline
//!
//! An HTTP middleware that lets integration-test clients drive failures in
//! the service they are testing, plus the minimal hyper-based host it runs in.
//!
//! ## The contract
//!
//! A client sends a control request whose last path segment is a status
//! code, optionally with a body:
//!
//! ```text
//! POST /__testing__/503
//! POST /__testing__/400
//! ```
//!
//! Every control request queues a response for that client (identified by
//! `X-Forwarded-For`, else peer IP). Its next ordinary requests are answered
//! from the queue, newest first, until it is empty. After that they reach
//! the application again.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use faultline::{Request, Response, Router, Server};
//! use faultline::middleware::Replay;
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new().get("/users/{id}", get_user);
//!
//!     Server::bind("0.0.0.0:3000")
//!         .serve(Replay::new(app))
//!         .await
//!         .unwrap();
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#))
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

pub use error::Error;
pub use handler::Handler;
pub use request::{Request, RequestBuilder};
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
