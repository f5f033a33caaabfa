//! HTTP middleware stack.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (storefront origins, credentials allowed)
//! 5. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Admin routes are guarded per handler with the [`RequireAdmin`] extractor.

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{AuthRejection, OptionalUser, RequireAdmin, clear_current_user, set_current_user};
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
