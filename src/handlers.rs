use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
};

use crate::{
    AppState,
    auth::SessionCredentials,
    router::{Outcome, resolve_entry},
};

// Entry responses depend on the visitor's session and must never be shared by caches.
const NO_STORE: (header::HeaderName, &str) = (header::CACHE_CONTROL, "private, no-store");

/// entry
///
/// [Public Route] The site root. Signed-in visitors are sent on to their library,
/// or to onboarding if they have not picked a username yet. Everyone else gets
/// the landing page, including visitors whose session could not be checked.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Landing page for anonymous visitors", content_type = "text/html", body = String),
        (status = 307, description = "Signed in: redirect to /library, or /onboarding when the profile has no username")
    )
)]
pub async fn entry(State(state): State<AppState>, credentials: SessionCredentials) -> Response {
    match resolve_entry(state.resolver.as_ref(), &credentials).await {
        Outcome::RedirectTo(path) => ([NO_STORE], Redirect::temporary(path)).into_response(),
        Outcome::RenderLanding => ([NO_STORE], Html(state.landing.render())).into_response(),
    }
}

/// health
///
/// [Public Route] Liveness probe for load balancers. Does not touch Supabase.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}
