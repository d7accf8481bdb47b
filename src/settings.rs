//! Effective boolean settings for message actions.
//!
//! Three-level precedence: an explicit per-action value wins, then an explicit
//! flow-level default, then the hard-coded fallback for the setting.

use serde::Serialize;

use crate::parse::types::{Action, Flow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    SmartSending,
    UtmTracking,
}

impl Setting {
    pub fn fallback(&self) -> bool {
        match self {
            Setting::SmartSending => true,
            Setting::UtmTracking => false,
        }
    }
}

pub fn resolve(per_action: Option<bool>, flow_default: Option<bool>, fallback: bool) -> bool {
    per_action.or(flow_default).unwrap_or(fallback)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EffectiveSettings {
    pub smart_sending: bool,
    pub utm_tracking: bool,
}

/// Resolve both settings for one action, each independently.
pub fn effective_settings(action: &Action, flow: &Flow) -> EffectiveSettings {
    let (smart_sending, utm_tracking) = action.overrides();
    EffectiveSettings {
        smart_sending: resolve(
            smart_sending,
            flow.smart_sending_default(),
            Setting::SmartSending.fallback(),
        ),
        utm_tracking: resolve(
            utm_tracking,
            flow.utm_tracking_default(),
            Setting::UtmTracking.fallback(),
        ),
    }
}
