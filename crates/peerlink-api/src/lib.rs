//! Registry HTTP service for PeerLink.
//!
//! Exposes the peer registry over HTTP/JSON: `POST /register/`,
//! `GET /available/`, `DELETE /unregister/{username}`, and the relay
//! endpoint `POST /send/`.

pub mod rate_limiter;
pub mod routes;
pub mod server;

pub use server::{build_router, start_server, start_with_registry, ServerHandle};
