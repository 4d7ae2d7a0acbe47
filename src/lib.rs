use axum::{
    Router,
    extract::FromRef,
    http::{HeaderName, header},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod handlers;
pub mod landing;
pub mod models;
pub mod router;

pub mod routes;
use routes::public;

// --- Public Re-exports ---

pub use auth::{
    IdentityResolver, JwtIdentityResolver, MockIdentityResolver, ResolverState,
    SupabaseIdentityResolver,
};
pub use config::AppConfig;
pub use landing::{LandingState, StaticLanding};
pub use router::{LIBRARY_PATH, ONBOARDING_PATH, Outcome};

/// ApiDoc
///
/// OpenAPI document for the routes this service owns, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::entry, handlers::health),
    tags(
        (name = "entry-router", description = "Site entry auth gate")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable services and configuration. Cloned into every request;
/// nothing in here is mutated after startup.
#[derive(Clone)]
pub struct AppState {
    /// Identity lookup: Supabase Auth, local JWT verification, or a mock.
    pub resolver: ResolverState,
    /// Marketing page for anonymous visitors.
    pub landing: LandingState,
    pub config: AppConfig,
}

impl FromRef<AppState> for ResolverState {
    fn from_ref(app_state: &AppState) -> ResolverState {
        app_state.resolver.clone()
    }
}

impl FromRef<AppState> for LandingState {
    fn from_ref(app_state: &AppState) -> LandingState {
        app_state.landing.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routes, the API docs and the request correlation layers.
pub fn create_router(state: AppState) -> Router {
    // Header name constant for request correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 1. Base Router Assembly
    // Swagger UI for the two routes we own, then the public routes themselves.
    // There is no authenticated router: the entry handler resolves the session itself
    // and never rejects a request.
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .with_state(state);

    // 2. Observability and Correlation Layers (outermost first)
    base_router.layer(
        ServiceBuilder::new()
            // 2a. Every request gets a UUID unless the caller already sent one.
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
            // 2b. One span per request. Resolver warnings and errors emitted by the
            // entry route are recorded inside it, so they carry the request id.
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace_span_logger)
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(tower_http::LatencyUnit::Millis),
                    ),
            )
            // 2c. Echo the id back so a visitor's report can be matched to the logs.
            .layer(PropagateRequestIdLayer::new(x_request_id)),
    )
}

/// trace_span_logger
///
/// Span for one HTTP request. Records the path rather than the full URI: query
/// strings on the entry route may carry auth callback codes, which must not reach
/// the logs. Whether the request carried any credentials is recorded as a flag,
/// never the token itself.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let headers = request.headers();

    let request_id = headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    let has_credentials =
        headers.contains_key(header::AUTHORIZATION) || headers.contains_key(header::COOKIE);

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        req_id = %request_id,
        has_credentials,
    )
}
