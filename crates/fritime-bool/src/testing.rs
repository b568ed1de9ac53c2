//! Test doubles shared by the aggregation and server tests.

use axum::extract::{Path, State};
use axum::http::{header::CONTENT_TYPE, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::aggregate::UserId;

/// Canned answer of the fake timetable service for one user.
#[derive(Debug, Clone)]
pub enum Reply {
    /// 200 with the given JSON body
    Terms(Value),
    /// Bare status code
    Status(StatusCode),
    /// 200 with an arbitrary body labelled as JSON
    Raw(&'static str),
    /// Waits before answering with an empty timetable
    Stall(Duration),
    /// Waits before answering 200 with the given JSON body
    Delayed(Duration, Value),
}

async fn timetable(
    Path(user_id): Path<UserId>,
    State(replies): State<Arc<HashMap<UserId, Reply>>>,
) -> Response {
    match replies.get(&user_id) {
        Some(Reply::Terms(body)) => Json(body.clone()).into_response(),
        Some(Reply::Status(status)) => (*status, "upstream failure").into_response(),
        Some(Reply::Raw(body)) => ([(CONTENT_TYPE, "application/json")], *body).into_response(),
        Some(Reply::Stall(delay)) => {
            tokio::time::sleep(*delay).await;
            Json(json!({ "termini": [] })).into_response()
        }
        Some(Reply::Delayed(delay, body)) => {
            tokio::time::sleep(*delay).await;
            Json(body.clone()).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Starts a fake timetable service on an ephemeral port and returns its base URL.
pub async fn spawn_upstream(replies: Vec<(UserId, Reply)>) -> String {
    let replies: HashMap<UserId, Reply> = replies.into_iter().collect();
    let app = Router::new()
        .route("/urniki/:user_id", get(timetable))
        .with_state(Arc::new(replies));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{address}")
}

/// JSON for a source term as the timetable service sends it.
pub fn term_json(id: i64, day: u8, start: &str, duration_minutes: u32) -> Value {
    json!({
        "termin_id": id,
        "dan": day,
        "zacetek": start,
        "dolzina": duration_minutes,
        "lokacija": format!("Room {id}"),
        "tip": "lecture",
        "predmet": null,
        "aktivnost": null
    })
}
