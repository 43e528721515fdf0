//! Inference gateway adapters

mod http;

pub use http::HttpInferenceGateway;
