//! HTTP surface
//!
//! Thin axum layer over the pipeline and the store. Read endpoints have no
//! side effects; the fetch and cron endpoints each trigger one cycle.

mod routes;

pub use routes::*;
