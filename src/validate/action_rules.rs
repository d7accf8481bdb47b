//! Trigger, settings, filter and per-action rules.

use crate::parse::types::*;

use super::Finding;

pub fn v010_trigger_fields(flow: &Flow, findings: &mut Vec<Finding>) {
    let Some(trigger) = &flow.trigger else {
        return;
    };

    match trigger {
        Trigger::Metric(t) => {
            if is_blank(&t.name) && is_blank(&t.id) {
                findings.push(Finding::error(
                    "V010",
                    "Metric trigger needs a metric name or id",
                    None,
                ));
            }
        }
        Trigger::List(t) => {
            if is_blank(&t.name) && is_blank(&t.id) {
                findings.push(Finding::error(
                    "V011",
                    "List trigger needs a list name or id",
                    None,
                ));
            }
        }
        Trigger::Date(t) => {
            if is_blank(&t.property) {
                findings.push(Finding::error(
                    "V012",
                    "Date trigger needs a profile property name",
                    None,
                ));
            }
        }
    }
}

pub fn v050_reentry_policy(flow: &Flow, findings: &mut Vec<Finding>) {
    let Some(spec) = flow.settings.as_ref().and_then(|s| s.reentry.as_ref()) else {
        return;
    };
    if let Err(reason) = spec.policy() {
        findings.push(Finding::error(
            "V050",
            format!("Invalid re-entry policy: {}", reason),
            None,
        ));
    }
}

pub fn v060_condition_groups(flow: &Flow, findings: &mut Vec<Finding>) {
    if let Some(filter) = &flow.profile_filter {
        check_filter("profile_filter", filter, findings);
    }
    if let Some(filter) = flow.trigger.as_ref().and_then(Trigger::filter) {
        check_filter("trigger filter", filter, findings);
    }
}

fn check_filter(location: &str, filter: &ConditionFilter, findings: &mut Vec<Finding>) {
    match &filter.condition_groups {
        None if filter.malformed_groups.is_some() => findings.push(Finding::error(
            "V060",
            format!("{} condition_groups is not an array of condition groups", location),
            None,
        )),
        None => findings.push(Finding::error(
            "V060",
            format!("{} is present but has no condition_groups array", location),
            None,
        )),
        Some(groups) if groups.is_empty() => findings.push(Finding::warning(
            "W001",
            format!("{} has no condition groups and filters nothing", location),
            None,
        )),
        Some(groups) => {
            for (i, group) in groups.iter().enumerate() {
                if group.conditions.is_empty() {
                    findings.push(Finding::warning(
                        "W001",
                        format!("{} condition group {} is empty", location, i),
                        None,
                    ));
                }
            }
        }
    }
}

pub fn v070_split_ratio(flow: &Flow, findings: &mut Vec<Finding>) {
    for action in &flow.actions {
        if let Action::AbSplit(a) = action {
            if a.config.split_ratio > 100 {
                findings.push(Finding::error(
                    "V070",
                    format!(
                        "A/B split '{}' routes {}% to variant A; ratio must be 0-100",
                        a.id, a.config.split_ratio
                    ),
                    Some(&a.id),
                ));
            }
        }
    }
}

pub fn v080_delay_amount(flow: &Flow, findings: &mut Vec<Finding>) {
    for action in &flow.actions {
        if let Action::TimeDelay(a) = action {
            if a.config.amount == 0 {
                findings.push(Finding::error(
                    "V080",
                    format!("Time delay '{}' needs a positive amount", a.id),
                    Some(&a.id),
                ));
            }
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}
