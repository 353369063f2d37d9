//! HTTP surface of the SENTINEL service: configuration, logging and the
//! axum routes wrapping `sentinel-core`.

pub mod config;
pub mod logging;
pub mod routes;
