//! The parameter server: named integer slots with atomic compare-and-swap.

use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use dsm_protocol::{endpoints, NameForm, ParamCasForm, ParamReadForm, ParamWriteForm, HEALTH_OK};
use dsm_store::ParamTable;
use dsm_types::CasOutcome;
use tower_http::trace::TraceLayer;

use crate::api::ApiError;
use crate::config::ParamServerConfig;
use crate::error::ServerResult;
use crate::server::{self, RunningServer};
use crate::shutdown::Shutdown;

#[derive(Clone)]
struct ParamState {
    table: Arc<ParamTable>,
    shutdown: Shutdown,
}

type ApiResult<T> = Result<T, ApiError>;

/// Build the parameter-server router over `table`.
pub fn param_router(table: Arc<ParamTable>, shutdown: Shutdown) -> Router {
    Router::new()
        .route(endpoints::PARAM_REGISTRATION, post(register))
        .route(endpoints::PARAM_DELETION, post(deregister))
        .route(endpoints::PARAM_READ, post(read))
        .route(endpoints::PARAM_WRITE, post(write))
        .route(endpoints::PARAM_CAS, post(compare_and_swap))
        .route(endpoints::HEALTH, get(health).post(health))
        .route(endpoints::STOP, post(stop).get(stop))
        .layer(TraceLayer::new_for_http())
        .with_state(ParamState { table, shutdown })
}

async fn register(
    State(state): State<ParamState>,
    form: Result<Form<NameForm>, FormRejection>,
) -> ApiResult<StatusCode> {
    let Form(form) = form?;
    tracing::debug!(name = %form.name, "mutex-register");
    state.table.register(&form.name)?;
    Ok(StatusCode::OK)
}

async fn deregister(
    State(state): State<ParamState>,
    form: Result<Form<NameForm>, FormRejection>,
) -> ApiResult<StatusCode> {
    let Form(form) = form?;
    tracing::debug!(name = %form.name, "mutex-delete");
    state.table.deregister(&form.name)?;
    Ok(StatusCode::OK)
}

async fn read(
    State(state): State<ParamState>,
    form: Result<Form<ParamReadForm>, FormRejection>,
) -> ApiResult<String> {
    let Form(form) = form?;
    tracing::debug!(name = %form.name, id = form.id, "param-read");
    Ok(state.table.read(&form.name)?.to_string())
}

async fn write(
    State(state): State<ParamState>,
    form: Result<Form<ParamWriteForm>, FormRejection>,
) -> ApiResult<StatusCode> {
    let Form(form) = form?;
    tracing::debug!(name = %form.name, id = form.id, value = form.value, "param-write");
    state.table.write(&form.name, form.value, Some(form.id))?;
    Ok(StatusCode::OK)
}

async fn compare_and_swap(
    State(state): State<ParamState>,
    form: Result<Form<ParamCasForm>, FormRejection>,
) -> ApiResult<Json<CasOutcome>> {
    let Form(form) = form?;
    let outcome = match form.token {
        Some(token) => state
            .table
            .compare_and_swap_once(&form.name, form.expected, form.value, form.id, token)?,
        None => state
            .table
            .compare_and_swap(&form.name, form.expected, form.value, Some(form.id))?,
    };
    tracing::debug!(
        name = %form.name,
        id = form.id,
        token = ?form.token,
        expected = form.expected,
        swapped = outcome.swapped,
        "param-cas"
    );
    Ok(Json(outcome))
}

async fn health() -> &'static str {
    HEALTH_OK
}

async fn stop(State(state): State<ParamState>) -> &'static str {
    tracing::info!("stop requested");
    state.shutdown.trigger();
    HEALTH_OK
}

/// A standalone parameter server.
pub struct ParamServer;

impl ParamServer {
    /// Bind and start serving an empty slot table in the background.
    pub async fn start(config: &ParamServerConfig) -> ServerResult<RunningServer> {
        Self::bind(&config.bind_addr, Arc::new(ParamTable::new())).await
    }

    pub async fn bind(addr: &str, table: Arc<ParamTable>) -> ServerResult<RunningServer> {
        let shutdown = Shutdown::new();
        let running = server::bind(addr, param_router(table, shutdown.clone()), shutdown).await?;
        tracing::info!(addr = %running.local_addr(), "parameter server started");
        Ok(running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use axum::middleware::{self, Next};
    use axum::response::Response;
    use dsm_link::{build_http_client, HttpParamClient, RetryPolicy};
    use dsm_mutex::MutexCoordinator;
    use dsm_types::{Endpoint, PeerId};
    use tower::util::ServiceExt;

    fn form_post(path: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn call(app: &Router, path: &str, body: &str) -> (StatusCode, String) {
        let response = app.clone().oneshot(form_post(path, body)).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn register_read_write() {
        let table = Arc::new(ParamTable::new());
        let app = param_router(Arc::clone(&table), Shutdown::new());

        assert_eq!(call(&app, "/param/registration", "name=m").await.0, StatusCode::OK);
        assert_eq!(call(&app, "/param/registration", "name=m").await.0, StatusCode::CONFLICT);
        assert_eq!(call(&app, "/param/read", "id=1&name=m").await, (StatusCode::OK, "0".into()));

        assert_eq!(call(&app, "/param/write", "id=1&name=m&value=2").await.0, StatusCode::OK);
        assert_eq!(call(&app, "/param/read", "id=3&name=m").await.1, "2");
        assert_eq!(table.entry("m").unwrap().last_writer, Some(1));
    }

    #[tokio::test]
    async fn cas_answers_json() {
        let table = Arc::new(ParamTable::new());
        table.register("m").unwrap();
        let app = param_router(Arc::clone(&table), Shutdown::new());

        let (status, body) = call(&app, "/param/cas", "id=2&name=m&expected=0&value=4").await;
        assert_eq!(status, StatusCode::OK);
        let outcome: CasOutcome = serde_json::from_str(&body).unwrap();
        assert_eq!(outcome, CasOutcome::swapped(4));

        let (_, body) = call(&app, "/param/cas", "id=1&name=m&expected=0&value=2").await;
        let outcome: CasOutcome = serde_json::from_str(&body).unwrap();
        assert_eq!(outcome, CasOutcome::mismatch(4));
    }

    #[tokio::test]
    async fn cas_with_token_applies_once() {
        let table = Arc::new(ParamTable::new());
        table.register("m").unwrap();
        let app = param_router(Arc::clone(&table), Shutdown::new());

        let release = "id=2&name=m&expected=4&value=0&token=11";
        table.write("m", 4, Some(2)).unwrap();
        assert_eq!(call(&app, "/param/cas", release).await.0, StatusCode::OK);
        table.write("m", 1, Some(0)).unwrap();

        let (_, body) = call(&app, "/param/cas", release).await;
        let outcome: CasOutcome = serde_json::from_str(&body).unwrap();
        assert_eq!(outcome, CasOutcome::swapped(0));
        assert_eq!(table.read("m").unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_slot_is_not_found() {
        let app = param_router(Arc::new(ParamTable::new()), Shutdown::new());
        assert_eq!(call(&app, "/param/read", "id=0&name=x").await.0, StatusCode::NOT_FOUND);
        assert_eq!(call(&app, "/param/deletion", "name=x").await.0, StatusCode::NOT_FOUND);
        assert_eq!(
            call(&app, "/param/cas", "id=0&name=x&expected=0&value=1").await.0,
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn non_integer_value_rejected() {
        let table = Arc::new(ParamTable::new());
        table.register("m").unwrap();
        let app = param_router(table, Shutdown::new());
        assert_eq!(
            call(&app, "/param/write", "id=0&name=m&value=high").await.0,
            StatusCode::BAD_REQUEST
        );
    }

    /// Delays every other answer well past the client's request timeout.
    /// The handler has already run, so the client sees a lost reply to a
    /// request that took effect.
    fn lose_every_other_answer(app: Router) -> Router {
        let calls = Arc::new(AtomicUsize::new(0));
        app.layer(middleware::from_fn(move |request: Request<Body>, next: Next| {
            let calls = Arc::clone(&calls);
            async move {
                let response: Response = next.run(request).await;
                if calls.fetch_add(1, Ordering::SeqCst) % 2 == 0 {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
                response
            }
        }))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn lock_and_unlock_survive_lost_cas_answers() {
        let table = Arc::new(ParamTable::new());
        table.register("m").unwrap();
        let shutdown = Shutdown::new();
        let app = lose_every_other_answer(param_router(Arc::clone(&table), shutdown.clone()));
        let running = server::bind("127.0.0.1:0", app, shutdown).await.unwrap();

        let retry = RetryPolicy::new(
            Duration::from_millis(5),
            Duration::from_millis(50),
            Some(Duration::from_secs(10)),
        );
        let client = HttpParamClient::new(
            &Endpoint::new("127.0.0.1", running.local_addr().port()),
            build_http_client(Duration::from_millis(100)).unwrap(),
            retry.clone(),
        );
        let mutex = MutexCoordinator::new(PeerId::new(2).unwrap(), Arc::new(client), retry);

        mutex.lock("m").await.unwrap();
        assert_eq!(table.entry("m").unwrap().value, 4);
        mutex.unlock("m").await.unwrap();
        assert_eq!(table.read("m").unwrap(), 0);

        running.stop().await.unwrap();
    }
}
