//! HTTP access to the remote chat endpoint.

pub mod http_transport;

pub use http_transport::HttpTransport;
