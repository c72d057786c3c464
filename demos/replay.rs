//! A small API behind the replay middleware.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example replay
//!
//! Configuration (environment):
//!   FAULTLINE_ADDR    listen address        (default 0.0.0.0:3000)
//!   FAULTLINE_PREFIX  control-path prefix   (default /__testing__)
//!
//! Try:
//!   curl -i -X POST http://localhost:3000/__testing__/503 -d 'oops'
//!   curl -i http://localhost:3000/users/42      # 503 Explanation, body "oops"
//!   curl -i http://localhost:3000/users/42      # the real handler again

use faultline::middleware::{Replay, DEFAULT_PREFIX};
use faultline::{Request, Response, Router, Server};
use http::StatusCode;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let addr = std::env::var("FAULTLINE_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_owned());
    let prefix = std::env::var("FAULTLINE_PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_owned());

    let app = Router::new()
        .get("/users/{id}",    get_user)
        .post("/users",        create_user)
        .delete("/users/{id}", delete_user);

    Server::bind(&addr)
        .serve(Replay::new(app).prefix(&prefix))
        .await
        .expect("server error");
}

async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#))
}

async fn create_user(req: Request) -> Response {
    if req.body().is_empty() {
        return Response::status(StatusCode::BAD_REQUEST);
    }

    Response::builder()
        .status(StatusCode::CREATED)
        .header("location", "/users/99")
        .json(r#"{"id":"99","name":"new_user"}"#)
}

async fn delete_user(_req: Request) -> StatusCode {
    StatusCode::NO_CONTENT
}
