//! SecureScape HTTP server.
//!
//! Every demo is mounted twice, under `/api/attack` and `/api/secure`, over
//! the same [`AppState`]:
//!
//! ```text
//! request -> TraceLayer -> ensure_session (SESSIONID cookie)
//!         -> /api/attack/* (CORS: any origin) -> vulnerable handler
//!         -> /api/secure/* (CORS: allow-list) -> hardened handler
//!                                   |
//!                                   v
//!                 MutationGateway / DemoStore (shared rows)
//! ```

mod error;
mod routes;
mod session;
mod state;

pub use routes::build_router;
pub use session::SESSION_COOKIE;
pub use state::AppState;
