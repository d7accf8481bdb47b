//! Build orchestration: validate, compile, submit.
//!
//! One flow per build. Collaborator calls run one at a time with a fixed
//! pacing delay between them, each wrapped in its own retry. Only the core
//! step (flow creation, or a critical UI step) aborts a build; every other
//! failure is recorded as a warning. Nothing created remotely is rolled back.

pub mod api;
pub mod content;
pub mod ui;

use serde::Serialize;

use crate::config::BuildConfig;
use crate::ir::CompileWarning;
use crate::ir::rest::FlowStatus;
use crate::lower::Correlation;
use crate::parse::types::{Action, Flow};
use crate::validate::Finding;

pub use api::ApiBuilder;
pub use content::prepare_content;
pub use ui::UiBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Rest,
    Ui,
}

impl Backend {
    /// The REST backend unless the flow uses a construct only the UI can build.
    pub fn for_flow(flow: &Flow) -> Backend {
        if requires_ui_backend(flow) {
            Backend::Ui
        } else {
            Backend::Rest
        }
    }
}

/// True when the flow contains an A/B split.
pub fn requires_ui_backend(flow: &Flow) -> bool {
    flow.actions.iter().any(|a| matches!(a, Action::AbSplit(_)))
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub backend: Backend,
    /// Remote id of the created flow (REST only).
    pub workflow_id: Option<String>,
    pub status: FlowStatus,
    pub correlations: Vec<Correlation>,
    /// Collaborator calls (REST) or UI steps that succeeded.
    pub completed_steps: usize,
    pub validation_warnings: Vec<Finding>,
    pub warnings: Vec<CompileWarning>,
}

impl BuildReport {
    fn new(backend: Backend, validation_warnings: Vec<Finding>) -> Self {
        BuildReport {
            backend,
            workflow_id: None,
            status: FlowStatus::Draft,
            correlations: Vec::new(),
            completed_steps: 0,
            validation_warnings,
            warnings: Vec::new(),
        }
    }
}

async fn pace(config: &BuildConfig) {
    if config.pacing_ms > 0 {
        tokio::time::sleep(config.pacing()).await;
    }
}
