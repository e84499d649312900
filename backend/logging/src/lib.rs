//! Structured logging for the Cyber Safer client.

pub mod logger;

pub use logger::{build_filter, init_logger, LOG_FILE_PREFIX};
