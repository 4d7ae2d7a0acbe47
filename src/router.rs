use crate::auth::{IdentityResolver, Resolution, ResolverError, SessionCredentials};

pub const ONBOARDING_PATH: &str = "/onboarding";
pub const LIBRARY_PATH: &str = "/library";

/// Outcome
///
/// What the entry route does with a visitor. The handler turns this into the
/// actual HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    RedirectTo(&'static str),
    RenderLanding,
}

/// route_identity
///
/// Decides the outcome for one identity lookup. Failed lookups are logged and
/// treated as anonymous: the visitor gets the landing page, never an error.
pub fn route_identity(resolution: Resolution) -> Outcome {
    let user = match resolution {
        Ok(user) => user,
        Err(ResolverError::Auth(reason)) => {
            tracing::warn!(%reason, "Auth check failed, showing landing");
            None
        }
        Err(ResolverError::Unexpected(reason)) => {
            tracing::error!(%reason, "Unexpected error during auth check");
            None
        }
    };

    let Some(user) = user else {
        return Outcome::RenderLanding;
    };

    match user.username() {
        Some(_) => Outcome::RedirectTo(LIBRARY_PATH),
        None => {
            tracing::debug!(user_id = %user.id, "Profile has no username, sending to onboarding");
            Outcome::RedirectTo(ONBOARDING_PATH)
        }
    }
}

/// resolve_entry
///
/// Looks the visitor up exactly once and routes them.
pub async fn resolve_entry(
    resolver: &dyn IdentityResolver,
    credentials: &SessionCredentials,
) -> Outcome {
    let resolution = resolver.current_user(credentials).await;
    route_identity(resolution)
}
