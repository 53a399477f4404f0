//! Health endpoint for orchestration and load balancers.
//!
//! `/healthz` reports 200 once the server is ready and the account store is
//! reachable, and 503 otherwise. Probes must be bare GETs: a query string, a
//! body or a content type other than `*/*` yields 400.
use actix_web::{HttpRequest, HttpResponse, get, web};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

use crate::domain::ports::StoreHealth;
use crate::inbound::http::cache_control::{no_store_header, pragma_no_cache_header};
use crate::inbound::http::validation::unexpected_input;

/// Shared health state for readiness and liveness checks.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
    store: Option<Arc<dyn StoreHealth>>,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
            store: None,
        }
    }
}

impl HealthState {
    /// Create a new health state starting as not ready but live.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also require the account store to answer before reporting healthy.
    #[must_use]
    pub fn with_store_probe(mut self, store: Arc<dyn StoreHealth>) -> Self {
        self.store = Some(store);
        self
    }

    /// Mark the service as ready.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Flag the service as unhealthy so probes fail fast during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    /// Whether the service should receive traffic.
    pub async fn is_healthy(&self) -> bool {
        if !(self.ready.load(Ordering::Acquire) && self.live.load(Ordering::Acquire)) {
            return false;
        }
        match &self.store {
            Some(store) => store.is_reachable().await,
            None => true,
        }
    }
}

fn probe_response(mut builder: actix_web::HttpResponseBuilder) -> HttpResponse {
    builder
        .insert_header(no_store_header())
        .insert_header(pragma_no_cache_header())
        .finish()
}

/// Health probe.
#[utoipa::path(
    get,
    path = "/healthz",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 400, description = "Probe carried query parameters, a body or a content type"),
        (status = 503, description = "Service is starting, draining or cannot reach its store")
    )
)]
#[get("/healthz")]
pub async fn healthz(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<HealthState>,
) -> HttpResponse {
    if let Some(rejected) = unexpected_input(&req, &body) {
        warn!(reason = rejected.message(), "health probe rejected");
        return probe_response(HttpResponse::BadRequest());
    }
    if state.is_healthy().await {
        probe_response(HttpResponse::Ok())
    } else {
        warn!("health check failed");
        probe_response(HttpResponse::ServiceUnavailable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::{StatusCode, header};
    use actix_web::{App, test};
    use rstest::rstest;

    use crate::domain::ports::MockStoreHealth;
    use crate::inbound::http::cache_control::NO_STORE_MUST_REVALIDATE;

    async fn probe(state: HealthState, req: test::TestRequest) -> (StatusCode, String) {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(healthz),
        )
        .await;
        let res = test::call_service(&app, req.to_request()).await;
        let cache = res
            .headers()
            .get(header::CACHE_CONTROL)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        (res.status(), cache)
    }

    fn ready_state() -> HealthState {
        let state = HealthState::new();
        state.mark_ready();
        state
    }

    #[actix_web::test]
    async fn reports_ok_when_ready() {
        let (status, cache) = probe(ready_state(), test::TestRequest::get().uri("/healthz")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cache, NO_STORE_MUST_REVALIDATE);
    }

    #[rstest]
    #[case::starting(false, true)]
    #[case::draining(true, false)]
    #[actix_web::test]
    async fn reports_unavailable_until_ready_or_when_draining(
        #[case] ready: bool,
        #[case] live: bool,
    ) {
        let state = HealthState::new();
        if ready {
            state.mark_ready();
        }
        if !live {
            state.mark_unhealthy();
        }
        let (status, cache) = probe(state, test::TestRequest::get().uri("/healthz")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(cache, NO_STORE_MUST_REVALIDATE);
    }

    #[rstest]
    #[case(true, StatusCode::OK)]
    #[case(false, StatusCode::SERVICE_UNAVAILABLE)]
    #[actix_web::test]
    async fn consults_store_probe(#[case] reachable: bool, #[case] expected: StatusCode) {
        let mut store = MockStoreHealth::new();
        store.expect_is_reachable().times(1).return_const(reachable);
        let state = HealthState::new().with_store_probe(Arc::new(store));
        state.mark_ready();

        let (status, _) = probe(state, test::TestRequest::get().uri("/healthz")).await;
        assert_eq!(status, expected);
    }

    #[actix_web::test]
    async fn rejects_content_type() {
        let (status, _) = probe(
            ready_state(),
            test::TestRequest::get()
                .uri("/healthz")
                .insert_header((header::CONTENT_TYPE, "application/json")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn rejects_query_parameters() {
        let (status, _) = probe(
            ready_state(),
            test::TestRequest::get().uri("/healthz?verbose=1"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn rejects_payload() {
        let (status, _) = probe(
            ready_state(),
            test::TestRequest::get()
                .uri("/healthz")
                .set_payload("ping"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
