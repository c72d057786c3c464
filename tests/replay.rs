//! In-process behaviour of the replay middleware.

use std::net::SocketAddr;

use faultline::middleware::{ClientKey, Replay, ReplayOrder, ReplayStore};
use faultline::{Request, Response, Router};
use http::{Method, StatusCode};

async fn downstream(req: Request) -> Response {
    Response::text(format!("app saw {}", req.path()))
}

fn replay() -> Replay {
    Replay::new(Router::new().get("/anything", downstream).get("/other", downstream))
}

fn control(client: &str, code: &str, body: &'static str) -> Request {
    Request::builder()
        .method(Method::POST)
        .path(&format!("/__testing__/{code}"))
        .header("x-forwarded-for", client)
        .body(body)
        .build()
}

fn get(client: &str, path: &str) -> Request {
    Request::builder()
        .path(path)
        .header("x-forwarded-for", client)
        .build()
}

#[tokio::test]
async fn record_replay_then_forward() {
    let app = replay();

    let res = app.handle(control("1.2.3.4", "503", "oops")).await;
    assert_eq!(res.status_line(), "200 OK");
    assert!(res.body().is_empty());

    let res = app.handle(get("1.2.3.4", "/anything")).await;
    assert_eq!(res.status_line(), "503 Explanation");
    assert_eq!(res.header("content-type"), Some("text/plain"));
    assert_eq!(res.body(), b"oops".as_slice());

    let res = app.handle(get("1.2.3.4", "/anything")).await;
    assert_eq!(res.status_code(), StatusCode::OK);
    assert_eq!(res.body(), b"app saw /anything".as_slice());
}

#[tokio::test]
async fn most_recent_entry_replays_first() {
    let app = replay();
    app.handle(control("1.2.3.4", "200", "")).await;
    app.handle(control("1.2.3.4", "400", "")).await;

    let first = app.handle(get("1.2.3.4", "/anything")).await;
    let second = app.handle(get("1.2.3.4", "/anything")).await;
    assert_eq!(first.status_line(), "400 Bad Request");
    assert_eq!(second.status_line(), "200 OK");
}

#[tokio::test]
async fn n_records_replay_in_reverse() {
    let app = replay();
    let codes: [u16; 6] = [500, 502, 503, 504, 429, 401];
    for code in codes {
        app.handle(control("c", &code.to_string(), "")).await;
    }

    let mut replayed = Vec::new();
    for _ in codes {
        replayed.push(app.handle(get("c", "/anything")).await.status_code().as_u16());
    }
    let expected: Vec<u16> = codes.iter().rev().copied().collect();
    assert_eq!(replayed, expected);
}

#[tokio::test]
async fn malformed_control_request_is_rejected_without_queueing() {
    let store = ReplayStore::new();
    let app = replay().store(store.clone());

    for code in ["abc", "", "99999", "4o4", "100", "199"] {
        let res = app.handle(control("1.2.3.4", code, "ignored")).await;
        assert_eq!(res.status_line(), "400 Bad Request", "{code:?}");
    }
    assert_eq!(store.pending(&ClientKey::new("1.2.3.4")), 0);

    let res = app.handle(get("1.2.3.4", "/anything")).await;
    assert_eq!(res.body(), b"app saw /anything".as_slice());
}

#[tokio::test]
async fn empty_queue_returns_downstream_response_verbatim() {
    let app = replay();
    let res = app.handle(get("9.9.9.9", "/missing")).await;
    assert_eq!(res.status_code(), StatusCode::NOT_FOUND);

    let res = app.handle(get("9.9.9.9", "/other")).await;
    assert_eq!(res.header("content-type"), Some("text/plain; charset=utf-8"));
    assert_eq!(res.body(), b"app saw /other".as_slice());
}

#[tokio::test]
async fn clients_are_isolated() {
    let app = replay();
    app.handle(control("10.0.0.1", "503", "for a")).await;

    let b = app.handle(get("10.0.0.2", "/anything")).await;
    assert_eq!(b.status_code(), StatusCode::OK);

    let a = app.handle(get("10.0.0.1", "/anything")).await;
    assert_eq!(a.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(a.body(), b"for a".as_slice());
}

#[tokio::test]
async fn forwarded_for_uses_first_entry() {
    let app = replay();
    app.handle(control("1.2.3.4, 172.16.0.1", "502", "")).await;

    let res = app.handle(get("1.2.3.4", "/anything")).await;
    assert_eq!(res.status_line(), "502 Explanation");
}

#[tokio::test]
async fn peer_address_identifies_client_across_ports() {
    let app = replay();
    let peer = |port: u16| SocketAddr::from(([127, 0, 0, 1], port));

    let req = Request::builder()
        .method(Method::POST)
        .path("/__testing__/504")
        .remote_addr(peer(40001))
        .build();
    app.handle(req).await;

    let req = Request::builder().path("/anything").remote_addr(peer(40002)).build();
    assert_eq!(app.handle(req).await.status_line(), "504 Explanation");
}

#[tokio::test]
async fn anonymous_clients_share_a_queue() {
    let app = replay();
    let req = Request::builder().method(Method::PUT).path("/__testing__/500").build();
    app.handle(req).await;

    let res = app.handle(Request::builder().path("/other").build()).await;
    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.replay_store().pending(&ClientKey::anonymous()), 0);
}

#[tokio::test]
async fn custom_prefix_and_fifo_order() {
    let app = replay().prefix("/_fail").order(ReplayOrder::Fifo);
    app.handle(Request::builder().path("/_fail/500").build()).await;
    app.handle(Request::builder().path("/_fail/503").build()).await;

    // the default prefix is now an ordinary path and consumes an entry
    let res = app.handle(Request::builder().path("/__testing__/418").build()).await;
    assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

    let res = app.handle(Request::builder().path("/other").build()).await;
    assert_eq!(res.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn shared_store_can_be_reset_between_tests() {
    let store = ReplayStore::new();
    let app = replay().store(store.clone());
    app.handle(control("1.2.3.4", "503", "")).await;
    app.handle(control("5.6.7.8", "503", "")).await;

    store.clear();

    let res = app.handle(get("1.2.3.4", "/anything")).await;
    assert_eq!(res.status_code(), StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_records_and_replays_consume_each_entry_once() {
    const N: usize = 200;
    let store = ReplayStore::new();
    let app = replay().store(store.clone());

    let records: Vec<_> = (0..N)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { app.handle(control("7.7.7.7", "503", "")).await.status_code() })
        })
        .collect();
    for task in records {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }
    assert_eq!(store.pending(&ClientKey::new("7.7.7.7")), N);

    let replays: Vec<_> = (0..2 * N)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { app.handle(get("7.7.7.7", "/anything")).await.status_code() })
        })
        .collect();
    let mut replayed = 0;
    for task in replays {
        if task.await.unwrap() == StatusCode::SERVICE_UNAVAILABLE {
            replayed += 1;
        }
    }

    assert_eq!(replayed, N);
    assert_eq!(store.pending(&ClientKey::new("7.7.7.7")), 0);
}
