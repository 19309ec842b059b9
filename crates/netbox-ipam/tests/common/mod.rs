//! In-process fake NetBox servers for client tests
//!
//! `spawn_canned` answers every request with one fixed response and records
//! what it received. `spawn_pool` is a small stateful IPAM with a pool counter
//! whose available-ips handler reads the counter, waits, then claims, so
//! overlapping reservations would be handed the same address.

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// A request as seen by the fake server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: String,
    pub authorization: Option<String>,
    pub accept: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Debug)]
struct Canned {
    status: StatusCode,
    body: String,
    delay: Duration,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Handle to a canned-response server
#[derive(Debug, Clone)]
pub struct CannedServer {
    pub base_url: String,
    state: Arc<Canned>,
}

impl CannedServer {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests().pop().expect("no request recorded")
    }
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn canned_handler(
    State(state): State<Arc<Canned>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    state.requests.lock().unwrap().push(RecordedRequest {
        method,
        uri: uri.to_string(),
        authorization: header_value(&headers, header::AUTHORIZATION),
        accept: header_value(&headers, header::ACCEPT),
        content_type: header_value(&headers, header::CONTENT_TYPE),
        body,
    });

    if !state.delay.is_zero() {
        tokio::time::sleep(state.delay).await;
    }

    Response::builder()
        .status(state.status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(state.body.clone()))
        .unwrap()
}

async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Serve `body` with `status` for every request
pub async fn spawn_canned(status: u16, body: impl Into<String>) -> CannedServer {
    spawn_canned_with_delay(status, body, Duration::ZERO).await
}

/// Like `spawn_canned`, but each response is held back for `delay`
pub async fn spawn_canned_with_delay(
    status: u16,
    body: impl Into<String>,
    delay: Duration,
) -> CannedServer {
    let state = Arc::new(Canned {
        status: StatusCode::from_u16(status).unwrap(),
        body: body.into(),
        delay,
        requests: Mutex::new(Vec::new()),
    });
    let router = Router::new()
        .fallback(canned_handler)
        .with_state(Arc::clone(&state));
    let base_url = serve(router).await;
    CannedServer { base_url, state }
}

/// Base URL of a port nothing is listening on
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Shared state of the stateful fake IPAM
#[derive(Debug)]
pub struct PoolState {
    /// Free addresses left in the pool; each reservation takes one
    pub free: AtomicU64,
    pub pool_size: u64,
    pub claim_delay: Duration,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub reservations: AtomicUsize,
    pub next_id: AtomicU64,
    pub addresses: Mutex<HashMap<u64, Value>>,
}

impl PoolState {
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn reservations(&self) -> usize {
        self.reservations.load(Ordering::SeqCst)
    }

    pub fn insert(&self, id: u64, address: &str, status: &str, dns_name: &str) {
        self.addresses
            .lock()
            .unwrap()
            .insert(id, ip_json(id, address, status, dns_name));
    }
}

/// Handle to the stateful fake
#[derive(Debug, Clone)]
pub struct PoolServer {
    pub base_url: String,
    pub state: Arc<PoolState>,
}

pub fn ip_json(id: u64, address: &str, status: &str, dns_name: &str) -> Value {
    json!({
        "id": id,
        "url": format!("/api/ipam/ip-addresses/{}/", id),
        "family": {"value": 4, "label": "IPv4"},
        "address": address,
        "status": {"value": status, "label": status},
        "dns_name": dns_name,
        "tags": [],
    })
}

async fn reserve(
    State(state): State<Arc<PoolState>>,
    Path(_prefix_id): Path<String>,
    Json(body): Json<Vec<Value>>,
) -> Response {
    let in_flight = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    state.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);

    // Read, wait, then claim.
    let free = state.free.load(Ordering::SeqCst);
    tokio::time::sleep(state.claim_delay).await;

    let response = if free == 0 {
        (
            StatusCode::CONFLICT,
            Json(json!({"detail": "An insufficient number of IP addresses are available within the prefix"})),
        )
            .into_response()
    } else {
        state.free.store(free - 1, Ordering::SeqCst);
        let host = state.pool_size - free + 1;
        let id = state.next_id.fetch_add(1, Ordering::SeqCst);
        let dns_name = body
            .first()
            .and_then(|entry| entry.get("dns_name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let ip = ip_json(id, &format!("10.34.0.{}/21", host), "active", &dns_name);
        state.addresses.lock().unwrap().insert(id, ip.clone());
        state.reservations.fetch_add(1, Ordering::SeqCst);
        (StatusCode::CREATED, Json(json!([ip]))).into_response()
    };

    state.in_flight.fetch_sub(1, Ordering::SeqCst);
    response
}

async fn read_ip(State(state): State<Arc<PoolState>>, Path(id): Path<u64>) -> Response {
    match state.addresses.lock().unwrap().get(&id) {
        Some(ip) => (StatusCode::OK, Json(ip.clone())).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response(),
    }
}

async fn update_ip(
    State(state): State<Arc<PoolState>>,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    let mut addresses = state.addresses.lock().unwrap();
    match addresses.get_mut(&id) {
        Some(ip) => {
            if let Some(address) = body.get("address") {
                ip["address"] = address.clone();
            }
            if let Some(dns_name) = body.get("dns_name") {
                ip["dns_name"] = dns_name.clone();
            }
            (StatusCode::OK, Json(ip.clone())).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response(),
    }
}

async fn delete_ip(State(state): State<Arc<PoolState>>, Path(id): Path<u64>) -> Response {
    match state.addresses.lock().unwrap().remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response(),
    }
}

/// Stateful fake with `pool_size` free addresses and a read-to-claim gap of `claim_delay`
pub async fn spawn_pool(pool_size: u64, claim_delay: Duration) -> PoolServer {
    let state = Arc::new(PoolState {
        free: AtomicU64::new(pool_size),
        pool_size,
        claim_delay,
        in_flight: AtomicUsize::new(0),
        max_in_flight: AtomicUsize::new(0),
        reservations: AtomicUsize::new(0),
        next_id: AtomicU64::new(100),
        addresses: Mutex::new(HashMap::new()),
    });
    let router = Router::new()
        .route("/api/ipam/prefixes/{prefix_id}/available-ips/", post(reserve))
        .route(
            "/api/ipam/ip-addresses/{id}/",
            get(read_ip).put(update_ip).delete(delete_ip),
        )
        .with_state(Arc::clone(&state));
    let base_url = serve(router).await;
    PoolServer { base_url, state }
}
