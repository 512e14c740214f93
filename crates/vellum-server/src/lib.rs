//! HTTP server for Vellum.
//!
//! Serves the latest version of every recorded artifact, a page composed
//! from them, and the endpoints that force that page to be recomposed.
//!
//! | route | |
//! |---|---|
//! | `GET /` | composed page |
//! | `GET /files/{path...}` | latest raw artifact |
//! | `POST /revalidate` | manual invalidation |
//! | `POST /webhook` | event invalidation |
//! | `GET /v1/health` | liveness |

pub mod config;
pub mod error;
pub mod files;
pub mod handler;
pub mod page;
pub mod revalidate;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use files::{content_type_for, RawArtifact};
pub use handler::HealthResponse;
pub use router::build_router;
pub use server::VellumServer;
pub use state::AppState;
