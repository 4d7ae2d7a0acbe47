use std::sync::Arc;

/// LandingRenderer
///
/// Produces the public marketing page shown to visitors without a session.
/// The content is opaque to the entry router.
pub trait LandingRenderer: Send + Sync {
    fn render(&self) -> String;
}

/// LandingState
///
/// The concrete type used to share the landing renderer across the application state.
pub type LandingState = Arc<dyn LandingRenderer>;

/// StaticLanding
///
/// Serves the landing page compiled into the binary.
#[derive(Clone, Default)]
pub struct StaticLanding;

const LANDING_HTML: &str = include_str!("landing.html");

impl LandingRenderer for StaticLanding {
    fn render(&self) -> String {
        LANDING_HTML.to_string()
    }
}
