//! Parse phase: JSON → flow types + arena graph.

pub mod graph;
pub mod types;

pub use graph::{DanglingLink, FlowGraph};
pub use types::*;

use crate::error::CompilerError;

/// Deserialize a flow JSON string into a `Flow` struct.
pub fn parse(json: &str) -> Result<Flow, Vec<CompilerError>> {
    serde_json::from_str::<Flow>(json).map_err(|e| {
        vec![CompilerError::parse(
            "P001",
            format!("Failed to parse flow JSON: {}", e),
        )]
    })
}

/// Serialize a flow back to its document form.
pub fn to_json(flow: &Flow) -> Result<String, Vec<CompilerError>> {
    serde_json::to_string_pretty(flow).map_err(|e| {
        vec![CompilerError::parse(
            "P002",
            format!("Failed to serialize flow: {}", e),
        )]
    })
}
