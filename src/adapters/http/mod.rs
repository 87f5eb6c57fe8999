//! HTTP adapters (axum).

pub mod graph_http;

pub use graph_http::{error_response, ErrorResponse, GraphHttpConfig, GraphHttpServer, MessageResponse};
