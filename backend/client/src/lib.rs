//! HTTP client for the Cyber Safer scenario server.
//!
//! Every JSON endpoint returns the body exactly as the server sent it; the
//! chat endpoint returns a [`ChatStream`] for incremental reading.

pub mod api;
pub mod error;
pub mod stream;

pub use api::ApiClient;
pub use error::ApiError;
pub use stream::ChatStream;
