//! REST payload types.
//!
//! Mirrors the remote service's flow-creation body: triggers, an optional
//! profile filter, the action list keyed by temporary ids, and the entry id.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::parse::types::{ReentryPolicy, TimeUnit};

use super::CompileWarning;

/// Output of the REST compiler.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledFlow {
    pub payload: FlowPayload,
    /// Action ids in traversal order (the correlation key).
    pub order: Vec<String>,
    pub warnings: Vec<CompileWarning>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlowPayload {
    pub name: String,
    pub status: FlowStatus,
    pub triggers: Vec<TriggerPayload>,
    pub profile_filter: Option<FilterPayload>,
    pub actions: Vec<ActionPayload>,
    pub entry_action_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reentry: Option<ReentryPolicy>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStatus {
    #[default]
    Draft,
    Manual,
    Live,
}

impl FlowStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(FlowStatus::Draft),
            "manual" => Some(FlowStatus::Manual),
            "live" => Some(FlowStatus::Live),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStatus::Draft => "draft",
            FlowStatus::Manual => "manual",
            FlowStatus::Live => "live",
        }
    }
}

// =============================================================================
// TRIGGERS & FILTERS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerPayload {
    #[serde(rename = "type")]
    pub trigger_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_filter: Option<FilterPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterPayload {
    pub condition_groups: Vec<FilterGroupPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterGroupPayload {
    pub conditions: Vec<Value>,
}

// =============================================================================
// ACTIONS
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ActionPayload {
    pub temporary_id: String,
    #[serde(rename = "type")]
    pub action_type: String,
    pub links: LinksPayload,
    pub data: ActionData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinksPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_if_true: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_if_false: Option<String>,
}

impl LinksPayload {
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        [&self.next, &self.next_if_true, &self.next_if_false]
            .into_iter()
            .filter_map(|t| t.as_deref())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ActionData {
    TimeDelay(TimeDelayData),
    Email(EmailData),
    Sms(SmsData),
    ConditionalSplit(SplitData),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

pub const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Monday,
    Weekday::Tuesday,
    Weekday::Wednesday,
    Weekday::Thursday,
    Weekday::Friday,
    Weekday::Saturday,
    Weekday::Sunday,
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeDelayData {
    pub unit: TimeUnit,
    pub value: u32,
    pub timezone: String,
    /// Only meaningful for day-granularity delays; `null` for any other unit.
    pub delay_until_weekdays: Option<Vec<Weekday>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailData {
    pub message: EmailMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailMessage {
    pub name: String,
    pub subject_line: String,
    pub preview_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_label: Option<String>,
    pub template_id: Option<String>,
    pub smart_sending_enabled: bool,
    pub add_tracking_params: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmsData {
    pub message: SmsMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmsMessage {
    pub name: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    pub smart_sending_enabled: bool,
    pub add_tracking_params: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitData {
    pub profile_filter: Value,
}
