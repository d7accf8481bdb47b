//! Compiled artifacts for the two backends.
//!
//! `rest` is the payload tree submitted to the remote workflow service;
//! `ui` is the ordered sequence of primitive operations for the UI driver.

pub mod rest;
pub mod ui;
pub mod validate;

use serde::Serialize;

pub use rest::*;
pub use ui::*;
pub use validate::{ArtifactError, validate_payload, validate_plan};

/// Non-fatal notice that a compiled construct only approximates the author's
/// intent, or that a build sub-step was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileWarning {
    pub action_id: Option<String>,
    pub message: String,
}

impl CompileWarning {
    pub fn new(action_id: Option<&str>, message: impl Into<String>) -> Self {
        CompileWarning {
            action_id: action_id.map(str::to_string),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for CompileWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.action_id {
            Some(id) => write!(f, "{} (action '{}')", self.message, id),
            None => write!(f, "{}", self.message),
        }
    }
}
