//! Rust types for the flow document.
//!
//! These types are the serde target for the flow JSON. Everything the
//! validator needs to report on (missing names, unknown re-entry modes, raw
//! condition kinds) is kept loose here so that parsing a broken flow still
//! succeeds and the validator can explain what is wrong with it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// TOP-LEVEL FLOW
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Trigger>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_action_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_filter: Option<ConditionFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<FlowSettings>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Flow {
    /// First action with the given id, in definition order.
    pub fn action(&self, id: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.id() == id)
    }

    pub fn smart_sending_default(&self) -> Option<bool> {
        self.settings.as_ref().and_then(|s| s.smart_sending)
    }

    pub fn utm_tracking_default(&self) -> Option<bool> {
        self.settings.as_ref().and_then(|s| s.utm_tracking)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smart_sending: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_tracking: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reentry: Option<ReentrySpec>,
}

// =============================================================================
// TRIGGER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    Metric(MetricTrigger),
    List(ListTrigger),
    Date(DateTrigger),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricTrigger {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<ConditionFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListTrigger {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateTrigger {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
}

impl Trigger {
    pub fn trigger_type(&self) -> &'static str {
        match self {
            Trigger::Metric(_) => "metric",
            Trigger::List(_) => "list",
            Trigger::Date(_) => "date",
        }
    }

    /// Human-readable name: metric/list name, or the date property.
    pub fn display_name(&self) -> Option<&str> {
        match self {
            Trigger::Metric(t) => t.name.as_deref().or(t.id.as_deref()),
            Trigger::List(t) => t.name.as_deref().or(t.id.as_deref()),
            Trigger::Date(t) => t.property.as_deref(),
        }
    }

    pub fn filter(&self) -> Option<&ConditionFilter> {
        match self {
            Trigger::Metric(t) => t.filter.as_ref(),
            _ => None,
        }
    }
}

// =============================================================================
// CONDITION FILTERS
// =============================================================================

/// Ordered condition groups. A filter whose `condition_groups` is missing, or
/// is not an array of groups, still parses; `malformed_groups` keeps the raw
/// value so the validator can report it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawConditionFilter", into = "RawConditionFilter")]
pub struct ConditionFilter {
    pub condition_groups: Option<Vec<ConditionGroup>>,
    pub malformed_groups: Option<Value>,
}

impl ConditionFilter {
    pub fn new(groups: Vec<ConditionGroup>) -> Self {
        ConditionFilter {
            condition_groups: Some(groups),
            malformed_groups: None,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawConditionFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    condition_groups: Option<Value>,
}

impl From<RawConditionFilter> for ConditionFilter {
    fn from(raw: RawConditionFilter) -> Self {
        match raw.condition_groups {
            None | Some(Value::Null) => ConditionFilter::default(),
            Some(value) => match Vec::<ConditionGroup>::deserialize(&value) {
                Ok(groups) => ConditionFilter::new(groups),
                Err(_) => ConditionFilter {
                    condition_groups: None,
                    malformed_groups: Some(value),
                },
            },
        }
    }
}

impl From<ConditionFilter> for RawConditionFilter {
    fn from(filter: ConditionFilter) -> Self {
        let condition_groups = match filter.condition_groups {
            Some(groups) => serde_json::to_value(groups).ok(),
            None => filter.malformed_groups,
        };
        RawConditionFilter { condition_groups }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// Atomic condition: a type plus opaque parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

// =============================================================================
// RE-ENTRY
// =============================================================================

/// Raw re-entry block as written in the document. See
/// [`ReentrySpec::policy`] for the typed form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReentrySpec {
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ReentryPolicy {
    Once,
    Multiple,
    TimeBased { value: u32, unit: TimeUnit },
}

impl ReentrySpec {
    /// Typed policy. `once` and `multiple` ignore any stray value/unit.
    pub fn policy(&self) -> Result<ReentryPolicy, String> {
        match self.mode.as_str() {
            "once" => Ok(ReentryPolicy::Once),
            "multiple" => Ok(ReentryPolicy::Multiple),
            "time_based" => {
                let value = match self.value {
                    Some(v) if v > 0 => u32::try_from(v)
                        .map_err(|_| format!("re-entry value {} is out of range", v))?,
                    Some(v) => return Err(format!("re-entry value must be positive, got {}", v)),
                    None => return Err("time_based re-entry requires a value".into()),
                };
                let unit = match self.unit.as_deref() {
                    Some(u) => TimeUnit::parse(u)
                        .ok_or_else(|| format!("unknown re-entry unit '{}'", u))?,
                    None => return Err("time_based re-entry requires a unit".into()),
                };
                Ok(ReentryPolicy::TimeBased { value, unit })
            }
            other => Err(format!("unknown re-entry mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl TimeUnit {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "minutes" => Some(TimeUnit::Minutes),
            "hours" => Some(TimeUnit::Hours),
            "days" => Some(TimeUnit::Days),
            "weeks" => Some(TimeUnit::Weeks),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
            TimeUnit::Weeks => "weeks",
        }
    }
}

// =============================================================================
// ACTIONS : tagged union over 4 action types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    TimeDelay(ActionBase<TimeDelayConfig>),
    SendMessage(ActionBase<SendMessageConfig>),
    ConditionalSplit(ActionBase<ConditionalSplitConfig>),
    AbSplit(ActionBase<AbSplitConfig>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionBase<C> {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub config: C,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smart_sending: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_tracking: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeDelayConfig {
    #[serde(default)]
    pub amount: u32,
    pub unit: TimeUnit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Sms,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Sms => "sms",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMessageConfig {
    pub channel: Channel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_label: Option<String>,
    /// Plain text body (SMS).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Rich content that must go through the content pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageContent {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Value>,
    /// Local image references to upload before rendering.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalSplitConfig {
    pub condition: ConditionDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_if_true: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_if_false: Option<String>,
}

/// Human-level split condition. `kind` stays a string so unknown kinds
/// survive parsing; see [`ConditionDescriptor::classify`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDescriptor {
    pub kind: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    HasOpenedMessage,
    HasClickedMessage,
    HasReceivedMessage,
    ProfileProperty,
    Custom,
    Unknown,
}

impl ConditionDescriptor {
    pub fn classify(&self) -> ConditionKind {
        match self.kind.as_str() {
            "has_opened_message" => ConditionKind::HasOpenedMessage,
            "has_clicked_message" => ConditionKind::HasClickedMessage,
            "has_received_message" => ConditionKind::HasReceivedMessage,
            "profile_property" => ConditionKind::ProfileProperty,
            "custom" => ConditionKind::Custom,
            _ => ConditionKind::Unknown,
        }
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbSplitConfig {
    #[serde(default = "default_variant_a")]
    pub variant_a: String,
    #[serde(default = "default_variant_b")]
    pub variant_b: String,
    /// Percentage of profiles routed to variant A.
    #[serde(default = "default_split_ratio")]
    pub split_ratio: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_variant_a: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_variant_b: Option<String>,
}

fn default_variant_a() -> String {
    "A".into()
}

fn default_variant_b() -> String {
    "B".into()
}

fn default_split_ratio() -> u8 {
    50
}

// =============================================================================
// LINKS
// =============================================================================

/// A typed outgoing link. Declaration order is traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    Next,
    NextIfTrue,
    NextIfFalse,
    NextVariantA,
    NextVariantB,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::Next => "next",
            LinkKind::NextIfTrue => "next_if_true",
            LinkKind::NextIfFalse => "next_if_false",
            LinkKind::NextVariantA => "next_variant_a",
            LinkKind::NextVariantB => "next_variant_b",
        }
    }
}

impl std::fmt::Display for LinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Action {
    pub fn id(&self) -> &str {
        match self {
            Action::TimeDelay(a) => &a.id,
            Action::SendMessage(a) => &a.id,
            Action::ConditionalSplit(a) => &a.id,
            Action::AbSplit(a) => &a.id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Action::TimeDelay(a) => a.name.as_deref(),
            Action::SendMessage(a) => a.name.as_deref(),
            Action::ConditionalSplit(a) => a.name.as_deref(),
            Action::AbSplit(a) => a.name.as_deref(),
        }
    }

    /// Name if set, otherwise the id.
    pub fn label(&self) -> &str {
        self.name().unwrap_or_else(|| self.id())
    }

    pub fn action_type(&self) -> &'static str {
        match self {
            Action::TimeDelay(_) => "time_delay",
            Action::SendMessage(_) => "send_message",
            Action::ConditionalSplit(_) => "conditional_split",
            Action::AbSplit(_) => "ab_split",
        }
    }

    pub fn overrides(&self) -> (Option<bool>, Option<bool>) {
        match self {
            Action::TimeDelay(a) => (a.smart_sending, a.utm_tracking),
            Action::SendMessage(a) => (a.smart_sending, a.utm_tracking),
            Action::ConditionalSplit(a) => (a.smart_sending, a.utm_tracking),
            Action::AbSplit(a) => (a.smart_sending, a.utm_tracking),
        }
    }

    /// Present outgoing links in traversal order.
    pub fn links(&self) -> Vec<(LinkKind, &str)> {
        let slots: Vec<(LinkKind, Option<&String>)> = match self {
            Action::TimeDelay(a) => vec![(LinkKind::Next, a.config.next.as_ref())],
            Action::SendMessage(a) => vec![(LinkKind::Next, a.config.next.as_ref())],
            Action::ConditionalSplit(a) => vec![
                (LinkKind::NextIfTrue, a.config.next_if_true.as_ref()),
                (LinkKind::NextIfFalse, a.config.next_if_false.as_ref()),
            ],
            Action::AbSplit(a) => vec![
                (LinkKind::NextVariantA, a.config.next_variant_a.as_ref()),
                (LinkKind::NextVariantB, a.config.next_variant_b.as_ref()),
            ],
        };
        slots
            .into_iter()
            .filter_map(|(kind, target)| target.map(|t| (kind, t.as_str())))
            .collect()
    }

    pub fn link(&self, kind: LinkKind) -> Option<&str> {
        self.links()
            .into_iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, target)| target)
    }

    pub fn is_branching(&self) -> bool {
        matches!(self, Action::ConditionalSplit(_) | Action::AbSplit(_))
    }
}
