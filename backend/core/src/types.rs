//! Typed views of the JSON bodies the scenario server returns.
//!
//! The API client hands back raw `serde_json::Value`s; these structs are a
//! lenient decoding of them for front-ends that want field access. Missing
//! fields fall back to defaults and unknown fields are ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::counter::Counter;

/// `GET /api/scenarios`: scenarios grouped by category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioCatalog {
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<ScenarioSummary>>,
}

impl ScenarioCatalog {
    /// Number of scenarios across all categories.
    pub fn total(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub description: String,
}

/// `POST /api/scenario/{id}/start`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartedScenario {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub scenario: ScenarioHeader,
    #[serde(default)]
    pub initial_message: String,
    #[serde(default)]
    pub adversary: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioHeader {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub introduction: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// `POST /api/scenario/complete`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionReport {
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub passed: bool,
    #[serde(default)]
    pub red_flags_detected: Vec<String>,
    #[serde(default)]
    pub red_flags_total: u32,
    #[serde(default)]
    pub success_criteria_met: Vec<String>,
    /// The full list of criteria, despite the name.
    #[serde(default)]
    pub success_criteria_total: Vec<String>,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub learning_objectives: Vec<String>,
}

/// `POST /api/scenario/exit`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExitAck {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub message: String,
}

/// `GET /api/scenario/status`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioStatus {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub red_flags_found: u32,
    #[serde(default)]
    pub red_flags_required: u32,
}

impl ScenarioStatus {
    pub fn counter(&self) -> Counter {
        Counter::new(self.red_flags_found, self.red_flags_required)
    }
}
