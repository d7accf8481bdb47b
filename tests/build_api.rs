//! REST build orchestration against in-memory collaborators.

mod helpers;

use flowsmith::build::{ApiBuilder, Backend, requires_ui_backend};
use flowsmith::error::{BuildError, CompileError};
use flowsmith::ir::rest::FlowStatus;
use flowsmith::remote::{CachedLookup, RemoteError, TemplateShape};
use flowsmith::retry::RetryPolicy;
use helpers::{MockDirectory, MockPipeline, MockService, fast_config};

fn lookup() -> CachedLookup<MockDirectory> {
    CachedLookup::new(
        MockDirectory::with_exact(&[("Placed Order", "MET-PO")]),
        RetryPolicy::no_retry(),
    )
}

#[tokio::test]
async fn builds_and_correlates_welcome_series() {
    helpers::init_tracing();
    let service = MockService::default();
    let lookup = lookup();
    let builder = ApiBuilder::new(&service, &lookup, fast_config());

    let report = builder.build(&helpers::welcome_series()).await.unwrap();

    assert_eq!(report.backend, Backend::Rest);
    assert_eq!(report.workflow_id.as_deref(), Some("FLOW01"));
    assert_eq!(report.status, FlowStatus::Draft);
    assert_eq!(service.create_calls(), 1);
    let pairs: Vec<(&str, &str)> = report
        .correlations
        .iter()
        .map(|c| (c.action_id.as_str(), c.remote_id.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("wait-1", "R0"),
            ("email-1", "R1"),
            ("split-1", "R2"),
            ("sms-1", "R3"),
            ("wait-2", "R4"),
            ("email-2", "R5"),
        ]
    );
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
}

#[tokio::test]
async fn invalid_flow_never_reaches_the_service() {
    let service = MockService::default();
    let lookup = lookup();
    let err = ApiBuilder::new(&service, &lookup, fast_config())
        .build(&helpers::dangling_link())
        .await
        .unwrap_err();

    let BuildError::Invalid(report) = err else {
        panic!("expected validation failure");
    };
    assert!(report.has_error("V040"));
    assert_eq!(service.create_calls(), 0);
}

#[tokio::test]
async fn ab_split_surfaces_capability_error() {
    let service = MockService::default();
    let lookup = lookup();
    let flow = helpers::ab_split();
    assert!(requires_ui_backend(&flow));
    assert_eq!(Backend::for_flow(&flow), Backend::Ui);

    let err = ApiBuilder::new(&service, &lookup, fast_config())
        .build(&flow)
        .await
        .unwrap_err();
    assert!(matches!(err, BuildError::Compile(CompileError::Capability(_))));
    assert_eq!(service.create_calls(), 0);
}

#[tokio::test]
async fn create_failure_aborts_after_retries() {
    let service = MockService::default();
    service.fail_create(vec![
        RemoteError::Network("reset".into()),
        RemoteError::Network("reset".into()),
        RemoteError::Network("reset".into()),
    ]);
    let lookup = lookup();

    let err = ApiBuilder::new(&service, &lookup, fast_config())
        .build(&helpers::welcome_series())
        .await
        .unwrap_err();

    let BuildError::Remote(retry) = err else {
        panic!("expected remote failure");
    };
    assert_eq!(retry.attempts, 3);
    assert_eq!(service.create_calls(), 3);
}

#[tokio::test]
async fn reordering_remote_is_misattributed() {
    // Correlation trusts creation order; a remote that reorders breaks it silently.
    let service = MockService {
        reverse_read: true,
        ..Default::default()
    };
    let lookup = lookup();

    let report = ApiBuilder::new(&service, &lookup, fast_config())
        .build(&helpers::linear_flow(3))
        .await
        .unwrap();
    let pairs: Vec<(&str, &str)> = report
        .correlations
        .iter()
        .map(|c| (c.action_id.as_str(), c.remote_id.as_str()))
        .collect();
    assert_eq!(pairs, vec![("a0", "R2"), ("a1", "R1"), ("a2", "R0")]);
    assert!(report.warnings.is_empty());
}

#[tokio::test]
async fn read_failure_is_a_warning() {
    let service = MockService {
        fail_read: true,
        ..Default::default()
    };
    let lookup = lookup();

    let report = ApiBuilder::new(&service, &lookup, fast_config())
        .build(&helpers::welcome_series())
        .await
        .unwrap();
    assert!(report.correlations.is_empty());
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].message.contains("correlated"));
}

#[tokio::test]
async fn status_is_applied_when_configured() {
    let service = MockService::default();
    let lookup = lookup();
    let mut config = fast_config();
    config.status = FlowStatus::Live;

    let report = ApiBuilder::new(&service, &lookup, config)
        .build(&helpers::welcome_series())
        .await
        .unwrap();
    assert_eq!(report.status, FlowStatus::Live);
    assert_eq!(
        *service.statuses.lock().unwrap(),
        vec![("FLOW01".to_string(), FlowStatus::Live)]
    );
}

#[tokio::test]
async fn status_failure_leaves_draft() {
    let service = MockService {
        fail_status: true,
        ..Default::default()
    };
    let lookup = lookup();
    let mut config = fast_config();
    config.status = FlowStatus::Manual;

    let report = ApiBuilder::new(&service, &lookup, config)
        .build(&helpers::welcome_series())
        .await
        .unwrap();
    assert_eq!(report.status, FlowStatus::Draft);
    assert!(report.warnings.iter().any(|w| w.message.contains("draft")));
}

#[tokio::test]
async fn rendered_content_is_attached_and_assigned() {
    let service = MockService::default();
    let lookup = lookup();
    let pipeline = MockPipeline::accepting(TemplateShape::LegacySections);

    let report = ApiBuilder::new(&service, &lookup, fast_config())
        .with_content(&pipeline)
        .build(&helpers::rich_content())
        .await
        .unwrap();

    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert_eq!(
        *pipeline.uploads.lock().unwrap(),
        vec!["hero.png".to_string(), "footer.png".to_string()]
    );
    assert_eq!(
        pipeline.rendered_shapes(),
        vec![TemplateShape::Sections, TemplateShape::LegacySections]
    );

    let created = service.created.lock().unwrap();
    let email = serde_json::to_value(&created[0].actions[0]).unwrap();
    assert_eq!(email["data"]["message"]["template_id"], "TPL-email-1");

    let assigned = service.assigned.lock().unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].0, "R0");
    assert_eq!(assigned[0].1.id, "TPL-email-1");
}

#[tokio::test]
async fn unrenderable_content_is_a_warning() {
    let service = MockService::default();
    let lookup = lookup();
    let pipeline = MockPipeline::rejecting_everything();

    let report = ApiBuilder::new(&service, &lookup, fast_config())
        .with_content(&pipeline)
        .build(&helpers::rich_content())
        .await
        .unwrap();

    assert_eq!(pipeline.rendered_shapes().len(), 3);
    let for_email: Vec<_> = report
        .warnings
        .iter()
        .filter(|w| w.action_id.as_deref() == Some("email-1"))
        .collect();
    // Render exhaustion, then the compiler notes the missing reference.
    assert_eq!(for_email.len(), 2);
    assert!(service.assigned.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn calls_are_paced() {
    let service = MockService::default();
    let lookup = lookup();
    let mut config = fast_config();
    config.pacing_ms = 250;
    config.status = FlowStatus::Live;

    let start = tokio::time::Instant::now();
    ApiBuilder::new(&service, &lookup, config)
        .build(&helpers::welcome_series())
        .await
        .unwrap();
    // create, then read and set_status each preceded by one pacing delay.
    assert_eq!(start.elapsed(), std::time::Duration::from_millis(500));
}
