use axum::{
    debug_handler,
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use metrics::counter;
use stampede_core::{AmountChange, Order};
use std::net::SocketAddr;
use std::{
    num::NonZeroU32,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, PoisonError, RwLock,
    },
    time::Duration,
};
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Behaviour knobs for the mock orders service.
#[derive(Clone, Debug, Default)]
pub struct MockConfig {
    /// Added to every request before it is handled.
    pub delay: Duration,
    /// Requests above this rate are rejected with `503 Service Unavailable`.
    pub max_tps: Option<NonZeroU32>,
    /// Answer `POST /orders` with `500 Internal Server Error`.
    pub fail_create: bool,
    /// Answer `GET /orders` with a body that is not JSON.
    pub malformed_list: bool,
}

/// In-memory implementation of the orders API.
#[derive(Clone)]
pub struct MockService {
    state: Arc<ServiceState>,
}

struct ServiceState {
    config: MockConfig,
    orders: RwLock<Vec<Order>>,
    requests: AtomicU64,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl Default for MockService {
    fn default() -> Self {
        Self::new(MockConfig::default())
    }
}

impl MockService {
    pub fn new(config: MockConfig) -> Self {
        let limiter = config
            .max_tps
            .map(|tps| RateLimiter::direct(Quota::per_second(tps)));

        Self {
            state: Arc::new(ServiceState {
                config,
                orders: RwLock::new(seed_orders()),
                requests: AtomicU64::new(0),
                limiter,
            }),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/orders", get(list_orders).post(create_order))
            .route(
                "/orders/:id",
                get(get_order).put(update_order).delete(delete_order),
            )
            .route("/orders/:id/increase", put(increase_amount))
            .route("/orders/:id/decrease", put(decrease_amount))
            .layer(middleware::from_fn_with_state(self.state.clone(), gate))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Requests received so far, including rejected ones.
    pub fn requests(&self) -> u64 {
        self.state.requests.load(Ordering::Relaxed)
    }

    pub fn orders(&self) -> Vec<Order> {
        self.state.read_orders().clone()
    }

    pub async fn serve(self, addr: SocketAddr) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, self.router()).await
    }

    /// Serve on an ephemeral localhost port in the background and return its address.
    pub async fn spawn(self) -> std::io::Result<SocketAddr> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let router = self.router();
        tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, router).await {
                tracing::error!("Mock service stopped: {err}");
            }
        });
        debug!("Mock service listening on {addr}");
        Ok(addr)
    }
}

pub async fn run(addr: SocketAddr) -> std::io::Result<()> {
    MockService::default().serve(addr).await
}

fn seed_orders() -> Vec<Order> {
    vec![Order::new("1", "Item 1", 10), Order::new("2", "Item 2", 20)]
}

impl ServiceState {
    fn read_orders(&self) -> std::sync::RwLockReadGuard<'_, Vec<Order>> {
        self.orders.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_orders(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Order>> {
        self.orders.write().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn gate(State(state): State<Arc<ServiceState>>, request: Request, next: Next) -> Response {
    state.requests.fetch_add(1, Ordering::Relaxed);
    counter!("mock-service.requests").increment(1);

    if !state.config.delay.is_zero() {
        tokio::time::sleep(state.config.delay).await;
    }

    if let Some(limiter) = &state.limiter {
        if limiter.check().is_err() {
            debug!("MOCK SERVICE ___ OVER LIMIT");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    }

    next.run(request).await
}

#[debug_handler]
async fn list_orders(State(state): State<Arc<ServiceState>>) -> Response {
    if state.config.malformed_list {
        return (StatusCode::OK, "<orders/>").into_response();
    }
    Json(state.read_orders().clone()).into_response()
}

#[debug_handler]
async fn get_order(
    State(state): State<Arc<ServiceState>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, StatusCode> {
    state
        .read_orders()
        .iter()
        .find(|o| o.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[debug_handler]
async fn create_order(
    State(state): State<Arc<ServiceState>>,
    Json(order): Json<Order>,
) -> Result<(StatusCode, Json<Order>), StatusCode> {
    if state.config.fail_create {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    state.write_orders().push(order.clone());
    Ok((StatusCode::CREATED, Json(order)))
}

#[debug_handler]
async fn update_order(
    State(state): State<Arc<ServiceState>>,
    Path(id): Path<String>,
    Json(order): Json<Order>,
) -> Result<Json<Order>, StatusCode> {
    let mut orders = state.write_orders();
    let existing = orders
        .iter_mut()
        .find(|o| o.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    *existing = order.clone();
    Ok(Json(order))
}

#[debug_handler]
async fn increase_amount(
    State(state): State<Arc<ServiceState>>,
    Path(id): Path<String>,
    Json(change): Json<AmountChange>,
) -> Result<Json<Order>, StatusCode> {
    adjust(&state, &id, change.amount)
}

#[debug_handler]
async fn decrease_amount(
    State(state): State<Arc<ServiceState>>,
    Path(id): Path<String>,
    Json(change): Json<AmountChange>,
) -> Result<Json<Order>, StatusCode> {
    adjust(&state, &id, -change.amount)
}

fn adjust(state: &ServiceState, id: &str, delta: i64) -> Result<Json<Order>, StatusCode> {
    let mut orders = state.write_orders();
    let order = orders
        .iter_mut()
        .find(|o| o.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    order.amount += delta;
    Ok(Json(order.clone()))
}

#[debug_handler]
async fn delete_order(
    State(state): State<Arc<ServiceState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    let mut orders = state.write_orders();
    let index = orders
        .iter()
        .position(|o| o.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    orders.remove(index);
    Ok(Json(serde_json::json!({ "message": "order deleted" })))
}
