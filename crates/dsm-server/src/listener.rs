//! Per-node request listener: applies peer requests to the local store.
//!
//! Requests received here are never re-broadcast. The sender has already
//! applied them locally and is delivering to every peer itself.

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use dsm_protocol::{
    encode_data, endpoints, CreateObjectForm, NameForm, ReadObjectForm, WriteObjectForm,
    HEALTH_OK,
};
use dsm_store::{InMemoryObjectStore, ObjectStore, MAX_OBJECT_SIZE};
use dsm_types::ObjectInfo;
use tower_http::trace::TraceLayer;

use crate::api::ApiError;
use crate::error::ServerResult;
use crate::server::{self, RunningServer};
use crate::shutdown::Shutdown;

#[derive(Clone)]
struct ListenerState {
    store: Arc<InMemoryObjectStore>,
    shutdown: Shutdown,
}

type ApiResult<T> = Result<T, ApiError>;

/// Largest accepted request body. A write payload grows by 4/3 under base64
/// and up to 3x again when its `+`, `/` and `=` are percent-encoded, so a
/// write of [`MAX_OBJECT_SIZE`] bytes must still fit.
pub const MAX_REQUEST_BODY: usize = MAX_OBJECT_SIZE
    .saturating_mul(4)
    .saturating_add(64 * 1024);

/// Build the request-listener router over `store`.
pub fn listener_router(store: Arc<InMemoryObjectStore>, shutdown: Shutdown) -> Router {
    Router::new()
        .route(endpoints::MEM_REGISTRATION, post(create_object))
        .route(endpoints::MEM_DELETION, post(delete_object))
        .route(endpoints::MEM_READ, post(read_object))
        .route(endpoints::MEM_WRITE, post(write_object))
        .route(endpoints::MEM_LIST, get(list_objects).post(list_objects))
        .route(endpoints::HEALTH, get(health).post(health))
        .route(endpoints::STOP, post(stop).get(stop))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY))
        .layer(TraceLayer::new_for_http())
        .with_state(ListenerState { store, shutdown })
}

async fn create_object(
    State(state): State<ListenerState>,
    form: Result<Form<CreateObjectForm>, FormRejection>,
) -> ApiResult<StatusCode> {
    let Form(form) = form?;
    tracing::debug!(name = %form.name, size = form.size, "create-object");
    state.store.create(&form.name, form.size)?;
    Ok(StatusCode::OK)
}

async fn delete_object(
    State(state): State<ListenerState>,
    form: Result<Form<NameForm>, FormRejection>,
) -> ApiResult<StatusCode> {
    let Form(form) = form?;
    tracing::debug!(name = %form.name, "delete-object");
    state.store.delete(&form.name)?;
    Ok(StatusCode::OK)
}

async fn read_object(
    State(state): State<ListenerState>,
    form: Result<Form<ReadObjectForm>, FormRejection>,
) -> ApiResult<String> {
    let Form(form) = form?;
    tracing::debug!(name = %form.name, offset = form.offset, length = form.length, "read-object");
    let bytes = ObjectStore::read(state.store.as_ref(), &form.name, form.offset, form.length)?;
    Ok(encode_data(&bytes))
}

async fn write_object(
    State(state): State<ListenerState>,
    form: Result<Form<WriteObjectForm>, FormRejection>,
) -> ApiResult<StatusCode> {
    let Form(form) = form?;
    tracing::debug!(name = %form.name, offset = form.offset, length = form.length, "write-object");
    let payload = form.payload()?;
    ObjectStore::write(state.store.as_ref(), &form.name, form.offset, &payload)?;
    Ok(StatusCode::OK)
}

async fn list_objects(State(state): State<ListenerState>) -> Json<Vec<ObjectInfo>> {
    Json(state.store.list())
}

async fn health() -> &'static str {
    HEALTH_OK
}

async fn stop(State(state): State<ListenerState>) -> &'static str {
    tracing::info!("stop requested");
    state.shutdown.trigger();
    HEALTH_OK
}

/// A node's request listener.
pub struct RequestListener;

impl RequestListener {
    /// Bind `addr` and start serving `store` in the background.
    pub async fn bind(addr: &str, store: Arc<InMemoryObjectStore>) -> ServerResult<RunningServer> {
        let shutdown = Shutdown::new();
        let running = server::bind(addr, listener_router(store, shutdown.clone()), shutdown).await?;
        tracing::info!(addr = %running.local_addr(), "request listener started");
        Ok(running)
    }
}
