//! Flow → REST payload.
//!
//! Actions are emitted in traversal order, which is also the order the remote
//! service creates them in; the build step relies on that for correlation.

use crate::error::{CapabilityError, CompileError};
use crate::ir::CompileWarning;
use crate::ir::rest::*;
use crate::parse::types::*;
use crate::remote::{ContentRefs, NameLookup};
use crate::settings::effective_settings;

use super::condition::{translate_filter, translate_split};
use super::traverse::{remote_type_key, traverse};
use super::trigger::resolve_trigger;

pub const BACKEND: &str = "REST";

const DEFAULT_TIMEZONE: &str = "profile";

/// Compile a validated flow into the REST payload.
///
/// Raises a [`CapabilityError`] for the first A/B split in traversal order;
/// that construct only exists on the UI backend.
pub async fn compile_for_api(
    flow: &Flow,
    lookup: &dyn NameLookup,
    content: &ContentRefs,
) -> Result<CompiledFlow, CompileError> {
    let trigger = flow
        .trigger
        .as_ref()
        .ok_or_else(|| CompileError::Incomplete("flow has no trigger".into()))?;
    let entry_action_id = flow
        .entry_action_id
        .clone()
        .ok_or_else(|| CompileError::Incomplete("flow has no entry_action_id".into()))?;

    let order = traverse(flow);

    // Fail before touching the directory.
    if let Some(split) = order.iter().find(|a| matches!(a, Action::AbSplit(_))) {
        return Err(CapabilityError {
            backend: BACKEND,
            action_id: split.id().to_string(),
            action_type: split.action_type(),
            reason: "A/B splits cannot be created through the API; use the UI backend".into(),
        }
        .into());
    }

    let trigger_payload = resolve_trigger(trigger, lookup).await?;

    let mut warnings = Vec::new();
    let mut actions = Vec::with_capacity(order.len());
    for action in &order {
        actions.push(compile_action(flow, action, content, &mut warnings)?);
    }

    let reentry = flow
        .settings
        .as_ref()
        .and_then(|s| s.reentry.as_ref())
        .and_then(|r| r.policy().ok());

    tracing::debug!(
        flow = %flow.name,
        actions = actions.len(),
        warnings = warnings.len(),
        "compiled REST payload"
    );

    Ok(CompiledFlow {
        payload: FlowPayload {
            name: flow.name.clone(),
            status: FlowStatus::Draft,
            triggers: vec![trigger_payload],
            profile_filter: flow.profile_filter.as_ref().map(translate_filter),
            actions,
            entry_action_id,
            reentry,
            tags: flow.tags.clone(),
        },
        order: order.iter().map(|a| a.id().to_string()).collect(),
        warnings,
    })
}

fn compile_action(
    flow: &Flow,
    action: &Action,
    content: &ContentRefs,
    warnings: &mut Vec<CompileWarning>,
) -> Result<ActionPayload, CompileError> {
    let data = match action {
        Action::TimeDelay(a) => ActionData::TimeDelay(compile_time_delay(&a.config)),
        Action::SendMessage(a) => compile_message(flow, action, a, content, warnings),
        Action::ConditionalSplit(a) => ActionData::ConditionalSplit(SplitData {
            profile_filter: translate_split(&a.id, &a.config.condition, warnings),
        }),
        Action::AbSplit(a) => {
            return Err(CapabilityError {
                backend: BACKEND,
                action_id: a.id.clone(),
                action_type: action.action_type(),
                reason: "A/B splits cannot be created through the API; use the UI backend".into(),
            }
            .into());
        }
    };

    Ok(ActionPayload {
        temporary_id: action.id().to_string(),
        action_type: remote_type_key(action).to_string(),
        links: compile_links(action),
        data,
    })
}

fn compile_links(action: &Action) -> LinksPayload {
    let mut links = LinksPayload::default();
    for (kind, target) in action.links() {
        let slot = match kind {
            LinkKind::Next | LinkKind::NextVariantA | LinkKind::NextVariantB => &mut links.next,
            LinkKind::NextIfTrue => &mut links.next_if_true,
            LinkKind::NextIfFalse => &mut links.next_if_false,
        };
        *slot = Some(target.to_string());
    }
    links
}

/// The remote only honours a weekday restriction on day-granularity delays
/// and rejects one on any other unit.
pub fn compile_time_delay(config: &TimeDelayConfig) -> TimeDelayData {
    TimeDelayData {
        unit: config.unit,
        value: config.amount,
        timezone: config
            .timezone
            .clone()
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
        delay_until_weekdays: (config.unit == TimeUnit::Days).then(|| ALL_WEEKDAYS.to_vec()),
    }
}

fn compile_message(
    flow: &Flow,
    action: &Action,
    a: &ActionBase<SendMessageConfig>,
    content: &ContentRefs,
    warnings: &mut Vec<CompileWarning>,
) -> ActionData {
    let settings = effective_settings(action, flow);
    let name = action.label().to_string();
    let content_ref = content.get(&a.id);

    if a.config.content.is_some() && content_ref.is_none() {
        warnings.push(CompileWarning::new(
            Some(&a.id),
            "message has rich content but no content reference was produced; it is created empty",
        ));
    }

    match a.config.channel {
        Channel::Email => ActionData::Email(EmailData {
            message: EmailMessage {
                subject_line: a
                    .config
                    .subject
                    .clone()
                    .unwrap_or_else(|| format!("{} Subject", name)),
                preview_text: a.config.preview_text.clone().unwrap_or_default(),
                from_email: a.config.from_email.clone(),
                from_label: a.config.from_label.clone(),
                template_id: content_ref.map(|c| c.id.clone()),
                smart_sending_enabled: settings.smart_sending,
                add_tracking_params: settings.utm_tracking,
                name,
            },
        }),
        Channel::Sms => ActionData::Sms(SmsData {
            message: SmsMessage {
                body: a.config.body.clone().unwrap_or_default(),
                media_url: content_ref.and_then(|c| c.url.clone()),
                smart_sending_enabled: settings.smart_sending,
                add_tracking_params: settings.utm_tracking,
                name,
            },
        }),
    }
}
