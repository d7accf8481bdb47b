//! Simulated-UI plan types.
//!
//! A plan is an ordered list of primitive operations. Steps share nothing but
//! the driver's session, and each carries a label so a failure can be
//! attributed without knowing UI internals.

use serde::Serialize;

use crate::parse::types::{
    Channel, ConditionDescriptor, ConditionFilter, LinkKind, ReentryPolicy, TimeUnit,
};

use super::CompileWarning;

#[derive(Debug, Clone, Serialize)]
pub struct UiPlan {
    pub flow_name: String,
    pub steps: Vec<UiStep>,
    pub warnings: Vec<CompileWarning>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiStep {
    pub index: usize,
    /// `"<index>: <operation> <subject>"`, used for retry labels and
    /// failure screenshots.
    pub label: String,
    pub action_id: Option<String>,
    /// A failed critical step aborts the build; later steps depend on it.
    pub critical: bool,
    pub operation: UiOperation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UiComponent {
    TimeDelay,
    Email,
    Sms,
    ConditionalSplit,
    AbSplit,
}

/// Where a new action is dropped on the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Placement {
    /// Directly below the trigger.
    AfterTrigger,
    /// On the given outgoing link of an already placed action.
    After { action_id: String, link: LinkKind },
    /// Not reachable from the entry; dropped unattached.
    Detached,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum UiOperation {
    CreateFlow {
        name: String,
    },
    SelectTrigger {
        trigger_type: String,
        name: String,
    },
    ApplyTriggerFilter {
        filter: ConditionFilter,
    },
    ApplyProfileFilter {
        filter: ConditionFilter,
    },
    SetReentry {
        policy: ReentryPolicy,
    },
    PlaceAction {
        action_id: String,
        component: UiComponent,
        placement: Placement,
    },
    ConfigureTimeDelay {
        action_id: String,
        amount: u32,
        unit: TimeUnit,
    },
    FillMessageName {
        action_id: String,
        name: String,
    },
    ConfigureMessage {
        action_id: String,
        channel: Channel,
        subject: Option<String>,
        preview_text: Option<String>,
        body: Option<String>,
        content_ref: Option<String>,
        smart_sending: bool,
        utm_tracking: bool,
    },
    ConfigureCondition {
        action_id: String,
        condition: ConditionDescriptor,
    },
    ConfigureAbSplit {
        action_id: String,
        variant_a: String,
        variant_b: String,
        split_ratio: u8,
    },
    /// Wire a link to an action that already exists (convergence or cycle).
    ConnectLink {
        from: String,
        link: LinkKind,
        to: String,
    },
    SaveFlow,
}

impl UiOperation {
    pub fn name(&self) -> &'static str {
        match self {
            UiOperation::CreateFlow { .. } => "create_flow",
            UiOperation::SelectTrigger { .. } => "select_trigger",
            UiOperation::ApplyTriggerFilter { .. } => "apply_trigger_filter",
            UiOperation::ApplyProfileFilter { .. } => "apply_profile_filter",
            UiOperation::SetReentry { .. } => "set_reentry",
            UiOperation::PlaceAction { .. } => "place_action",
            UiOperation::ConfigureTimeDelay { .. } => "configure_time_delay",
            UiOperation::FillMessageName { .. } => "fill_message_name",
            UiOperation::ConfigureMessage { .. } => "configure_message",
            UiOperation::ConfigureCondition { .. } => "configure_condition",
            UiOperation::ConfigureAbSplit { .. } => "configure_ab_split",
            UiOperation::ConnectLink { .. } => "connect_link",
            UiOperation::SaveFlow => "save_flow",
        }
    }
}
