//! Rendering side of a Cyber Safer chat session.
//!
//! The renderer never looks anything up globally: the message surface and
//! the counter display are injected, so the same logic drives an in-memory
//! model in tests and the terminal in the CLI.

pub mod counter_view;
pub mod poller;
pub mod renderer;
pub mod session;
pub mod surface;

pub use counter_view::{CounterPanel, CounterSink};
pub use poller::{StatusPoller, StatusSource, DEFAULT_POLL_INTERVAL};
pub use renderer::StreamRenderer;
pub use session::ChatSession;
pub use surface::{MessageContainer, MessageElement, MessageList};
