//! In-process stand-in for the calculation service.
//!
//! Stores calculated months in memory, honors deletes, and can be told to
//! fail, delay or answer with a fixed body.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// Total reported for every calculation unless a body is configured.
pub const STUB_TOTAL: f64 = 512.5;

#[derive(Default)]
pub struct StubState {
    pub entries: Vec<Value>,
    pub requests: Vec<Value>,
    pub next_id: u64,
    pub calculate_status: Option<StatusCode>,
    pub calculate_body: Option<Value>,
    pub calculate_raw: Option<String>,
    pub calculate_delay: Option<Duration>,
    pub history_status: Option<StatusCode>,
    pub history_body: Option<Value>,
    pub delete_status: Option<StatusCode>,
}

#[derive(Clone, Default)]
pub struct StubService {
    state: Arc<Mutex<StubState>>,
}

impl StubService {
    pub fn configure(&self, f: impl FnOnce(&mut StubState)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn requests(&self) -> Vec<Value> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn entry_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .entries
            .iter()
            .map(|entry| entry["id"].to_string())
            .collect()
    }

    /// Serve on an ephemeral local port and return the base URL.
    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/api/footprint/calculate", post(calculate))
            .route("/api/footprint/history/:user_id", get(history))
            .route("/api/footprint/:id", delete(remove))
            .with_state(self.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }
}

async fn calculate(State(stub): State<StubService>, Json(request): Json<Value>) -> Response {
    let delay = stub.state.lock().unwrap().calculate_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let mut state = stub.state.lock().unwrap();
    state.requests.push(request.clone());

    if let Some(status) = state.calculate_status {
        return status.into_response();
    }
    if let Some(raw) = state.calculate_raw.clone() {
        return raw.into_response();
    }

    state.next_id += 1;
    let id = state.next_id;
    state.entries.push(json!({
        "id": id,
        "userId": request["userId"],
        "month": request["month"],
        "year": request["year"],
        "totalCO2Kg": STUB_TOTAL,
        "impactRating": "MODERATE"
    }));

    let body = state.calculate_body.clone().unwrap_or_else(|| {
        json!({
            "totalCO2Kg": STUB_TOTAL,
            "impactRating": "MODERATE",
            "aiAnalysis": "TOTAL_CO2: 512.5\nMost of it comes from road travel.",
            "recommendations": "Use public transit\n\nSwitch to LED bulbs\n"
        })
    });
    Json(body).into_response()
}

async fn history(State(stub): State<StubService>, Path(user_id): Path<String>) -> Response {
    let state = stub.state.lock().unwrap();

    if let Some(status) = state.history_status {
        return status.into_response();
    }
    if let Some(body) = state.history_body.clone() {
        return Json(body).into_response();
    }

    let entries: Vec<Value> = state
        .entries
        .iter()
        .filter(|entry| entry["userId"] == user_id.as_str())
        .cloned()
        .collect();
    Json(entries).into_response()
}

async fn remove(State(stub): State<StubService>, Path(id): Path<String>) -> Response {
    let mut state = stub.state.lock().unwrap();

    if let Some(status) = state.delete_status {
        return status.into_response();
    }

    let before = state.entries.len();
    state.entries.retain(|entry| entry["id"].to_string() != id);
    if state.entries.len() == before {
        return StatusCode::NOT_FOUND.into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}
