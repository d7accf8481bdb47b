//! Flow validation.
//!
//! Pure function over a parsed [`Flow`]. Findings are split into errors (the
//! build must not proceed) and warnings (the build proceeds, but the flow may
//! not do what its author expects). Every check runs; a check is only skipped
//! when a prior failure makes it meaningless.

pub mod action_rules;
pub mod structural;

use serde::{Deserialize, Serialize};

use crate::parse::graph::FlowGraph;
use crate::parse::types::Flow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub code: &'static str,
    pub severity: Severity,
    pub message: String,
    pub action_id: Option<String>,
}

impl Finding {
    pub fn error(code: &'static str, message: impl Into<String>, action_id: Option<&str>) -> Self {
        Finding {
            code,
            severity: Severity::Error,
            message: message.into(),
            action_id: action_id.map(str::to_string),
        }
    }

    pub fn warning(code: &'static str, message: impl Into<String>, action_id: Option<&str>) -> Self {
        Finding {
            code,
            severity: Severity::Warning,
            message: message.into(),
            action_id: action_id.map(str::to_string),
        }
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl ValidationReport {
    fn from_findings(findings: Vec<Finding>) -> Self {
        let (errors, warnings): (Vec<_>, Vec<_>) = findings
            .into_iter()
            .partition(|f| f.severity == Severity::Error);
        ValidationReport {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }

    pub fn has_error(&self, code: &str) -> bool {
        self.errors.iter().any(|f| f.code == code)
    }

    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings.iter().any(|f| f.code == code)
    }
}

/// Validate a flow. Never mutates its input and never fails.
pub fn validate(flow: &Flow) -> ValidationReport {
    let graph = FlowGraph::build(flow);
    let mut findings = Vec::new();

    structural::v001_required_fields(flow, &mut findings);
    action_rules::v010_trigger_fields(flow, &mut findings);
    structural::v020_entry_resolves(flow, &graph, &mut findings);
    structural::v030_unique_ids(flow, &mut findings);
    structural::v040_links_resolve(&graph, &mut findings);
    action_rules::v050_reentry_policy(flow, &mut findings);
    action_rules::v060_condition_groups(flow, &mut findings);
    action_rules::v070_split_ratio(flow, &mut findings);
    action_rules::v080_delay_amount(flow, &mut findings);
    structural::w002_unreachable_actions(&graph, &mut findings);

    ValidationReport::from_findings(findings)
}
