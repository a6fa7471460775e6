#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const GOOD_KEY: &str = "good-key";
pub const TRANSLATE_PATH: &str = "/language/translate/v2";

/// In-process stand-in for the Google Cloud Translation v2 endpoint.
///
/// Answers `"[<target>] <q>"` for the good key; `q == "garbage"` gets a
/// non-JSON body and `q == "empty"` gets an empty translations list.
#[derive(Clone, Default)]
pub struct MockBackend {
    requests: Arc<Mutex<Vec<Value>>>,
}

impl MockBackend {
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|body| body["q"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

pub struct RunningBackend {
    pub addr: SocketAddr,
    pub backend: MockBackend,
}

impl RunningBackend {
    pub fn endpoint(&self) -> String {
        format!("http://{}{}", self.addr, TRANSLATE_PATH)
    }
}

pub async fn spawn_backend() -> RunningBackend {
    let backend = MockBackend::default();
    let router = Router::new().route(TRANSLATE_PATH, post(translate)).with_state(backend.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock backend");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve mock backend");
    });
    RunningBackend { addr, backend }
}

async fn translate(
    State(backend): State<MockBackend>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    backend.requests.lock().unwrap().push(body.clone());

    if query.get("key").map(String::as_str) != Some(GOOD_KEY) {
        let error = json!({
            "error": {
                "code": 400,
                "message": "API key not valid. Please pass a valid API key.",
                "status": "INVALID_ARGUMENT"
            }
        });
        return (StatusCode::BAD_REQUEST, Json(error)).into_response();
    }

    let text = body["q"].as_str().unwrap_or_default();
    let target = body["target"].as_str().unwrap_or_default();
    match text {
        "garbage" => (StatusCode::OK, "<html>oops</html>").into_response(),
        "empty" => Json(json!({"data": {"translations": []}})).into_response(),
        _ => Json(json!({
            "data": {"translations": [{"translatedText": format!("[{target}] {text}")}]}
        }))
        .into_response(),
    }
}
