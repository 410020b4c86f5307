//! History fetch over the request/response API.

pub mod http;

pub use http::HttpHistorySource;
