//! Effective per-action settings.

mod helpers;

use flowsmith::settings::{EffectiveSettings, Setting, effective_settings, resolve};
use proptest::prelude::*;

#[test]
fn flow_default_applies_without_override() {
    let flow = helpers::welcome_series();
    let email = flow.action("email-1").unwrap();
    assert_eq!(
        effective_settings(email, &flow),
        EffectiveSettings {
            smart_sending: false,
            utm_tracking: false
        }
    );
}

#[test]
fn action_override_beats_flow_default() {
    let flow = helpers::welcome_series();
    let email = flow.action("email-2").unwrap();
    assert!(effective_settings(email, &flow).smart_sending);
}

#[test]
fn settings_resolve_independently() {
    let flow = helpers::welcome_series();
    let sms = flow.action("sms-1").unwrap();
    let effective = effective_settings(sms, &flow);
    assert!(!effective.smart_sending, "flow default");
    assert!(effective.utm_tracking, "action override");
}

#[test]
fn hard_fallbacks_without_any_settings() {
    let flow = helpers::rich_content();
    let sms = flow.action("sms-1").unwrap();
    assert_eq!(
        effective_settings(sms, &flow),
        EffectiveSettings {
            smart_sending: Setting::SmartSending.fallback(),
            utm_tracking: Setting::UtmTracking.fallback()
        }
    );
}

proptest! {
    #[test]
    fn explicit_action_value_always_wins(
        action in any::<bool>(),
        flow_default in prop::option::of(any::<bool>()),
        fallback in any::<bool>(),
    ) {
        prop_assert_eq!(resolve(Some(action), flow_default, fallback), action);
    }

    #[test]
    fn flow_default_wins_over_fallback(flow_default in any::<bool>(), fallback in any::<bool>()) {
        prop_assert_eq!(resolve(None, Some(flow_default), fallback), flow_default);
    }
}
