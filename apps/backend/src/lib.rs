#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod errors;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod trace_ctx;
pub mod ws;

#[cfg(test)]
pub mod test_bootstrap;

// Re-exports for public API
pub use auth::claims::AccessClaims;
pub use auth::jwt::{mint_access_token, verify_access_token};
pub use config::MatchConfig;
pub use error::AppError;
pub use extractors::current_user::CurrentUser;
pub use middleware::cors::cors_middleware;
pub use middleware::jwt_extract::JwtExtract;
pub use middleware::request_trace::RequestTrace;
pub use state::app_state::AppState;
pub use state::security_config::SecurityConfig;

// Prelude for test convenience
pub mod prelude {
    pub use super::auth::jwt::*;
    pub use super::config::*;
    pub use super::domain::*;
    pub use super::error::*;
    pub use super::state::app_state::*;
    pub use super::state::security_config::*;
}

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    test_bootstrap::logging::init();
}
