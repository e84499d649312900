pub mod counter;
pub mod message;
pub mod types;

pub use counter::{split_counter_marker, Counter, CounterMarker};
pub use message::{MessageState, Role};
pub use types::{
    CompletionReport, ExitAck, ScenarioCatalog, ScenarioHeader, ScenarioStatus, ScenarioSummary,
    StartedScenario,
};
