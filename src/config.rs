use std::{env, time::Duration};

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and
/// shared read-only with every request through the application state.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and which settings are mandatory.
    pub env: Env,
    // Address the HTTP server binds to.
    pub bind_addr: String,
    // Supabase project URL, e.g. https://abc.supabase.co
    pub supabase_url: String,
    // Public anon key sent as the `apikey` header to Supabase Auth.
    pub supabase_anon_key: String,
    // Secret used to verify access tokens locally (AuthMode::Jwt only).
    pub jwt_secret: String,
    // How the visitor identity is resolved.
    pub auth_mode: AuthMode,
    // Cookie carrying the Supabase access token when no Authorization header is sent.
    pub auth_cookie: String,
    // Upper bound on a single identity lookup against Supabase Auth.
    pub auth_timeout: Duration,
}

/// Env
///
/// Defines the runtime context: pretty logs and local defaults, or JSON logs
/// and mandatory secrets.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// AuthMode
///
/// `Remote` asks Supabase Auth for the current user on every request.
/// `Jwt` verifies the access token locally and reads the user from its claims.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AuthMode {
    Remote,
    Jwt,
}

const LOCAL_SUPABASE_URL: &str = "http://localhost:54321";
const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_AUTH_COOKIE: &str = "sb-access-token";
const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 5;

impl Default for AppConfig {
    /// Safe, non-panicking values for test state setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            supabase_url: LOCAL_SUPABASE_URL.to_string(),
            supabase_anon_key: "local-anon-key".to_string(),
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            auth_mode: AuthMode::Remote,
            auth_cookie: DEFAULT_AUTH_COOKIE.to_string(),
            auth_timeout: Duration::from_secs(DEFAULT_AUTH_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics if a setting required in production is missing, or if a value cannot be
    /// parsed. The service must not start half-configured.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let auth_mode = match env::var("AUTH_MODE").as_deref() {
            Ok("jwt") => AuthMode::Jwt,
            Ok("remote") | Err(_) => AuthMode::Remote,
            Ok(other) => panic!("FATAL: AUTH_MODE must be 'remote' or 'jwt', got '{other}'."),
        };

        let auth_timeout = env::var("AUTH_TIMEOUT_SECS")
            .ok()
            .map(|secs| {
                secs.parse::<u64>()
                    .expect("FATAL: AUTH_TIMEOUT_SECS must be a whole number of seconds.")
            })
            .unwrap_or(DEFAULT_AUTH_TIMEOUT_SECS);

        let auth_cookie =
            env::var("AUTH_COOKIE_NAME").unwrap_or_else(|_| DEFAULT_AUTH_COOKIE.to_string());

        match env {
            Env::Local => Self {
                env: Env::Local,
                bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
                // Matches the default `supabase start` stack.
                supabase_url: env::var("SUPABASE_URL")
                    .unwrap_or_else(|_| LOCAL_SUPABASE_URL.to_string()),
                supabase_anon_key: env::var("SUPABASE_ANON_KEY")
                    .unwrap_or_else(|_| "local-anon-key".to_string()),
                jwt_secret: env::var("SUPABASE_JWT_SECRET")
                    .unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
                auth_mode,
                auth_cookie,
                auth_timeout: Duration::from_secs(auth_timeout),
            },
            Env::Production => {
                let jwt_secret = match auth_mode {
                    AuthMode::Jwt => env::var("SUPABASE_JWT_SECRET")
                        .expect("FATAL: SUPABASE_JWT_SECRET required when AUTH_MODE=jwt."),
                    AuthMode::Remote => env::var("SUPABASE_JWT_SECRET").unwrap_or_default(),
                };

                Self {
                    env: Env::Production,
                    bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
                    supabase_url: env::var("SUPABASE_URL")
                        .expect("FATAL: SUPABASE_URL required in prod"),
                    supabase_anon_key: env::var("SUPABASE_ANON_KEY")
                        .expect("FATAL: SUPABASE_ANON_KEY required in prod"),
                    jwt_secret,
                    auth_mode,
                    auth_cookie,
                    auth_timeout: Duration::from_secs(auth_timeout),
                }
            }
        }
    }
}
