#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use flowsmith::config::BuildConfig;
use flowsmith::ir::rest::{FlowPayload, FlowStatus};
use flowsmith::ir::ui::UiOperation;
use flowsmith::lower::RemoteResource;
use flowsmith::parse::{self, Flow};
use flowsmith::remote::*;
use flowsmith::retry::RetryPolicy;

/// Route `tracing` output to the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn welcome_series() -> Flow {
    parse::parse(include_str!("../fixtures/welcome_series.json")).unwrap()
}

pub fn ab_split() -> Flow {
    parse::parse(include_str!("../fixtures/ab_split.json")).unwrap()
}

pub fn two_cycle() -> Flow {
    parse::parse(include_str!("../fixtures/two_cycle.json")).unwrap()
}

pub fn unreachable() -> Flow {
    parse::parse(include_str!("../fixtures/unreachable.json")).unwrap()
}

pub fn dangling_link() -> Flow {
    parse::parse(include_str!("../fixtures/dangling_link.json")).unwrap()
}

pub fn engagement_split() -> Flow {
    parse::parse(include_str!("../fixtures/engagement_split.json")).unwrap()
}

pub fn rich_content() -> Flow {
    parse::parse(include_str!("../fixtures/rich_content.json")).unwrap()
}

/// Linear chain of `n` one-day delays, `a0 -> a1 -> ...`, entry `a0`.
pub fn linear_flow(n: usize) -> Flow {
    let actions: Vec<serde_json::Value> = (0..n)
        .map(|i| {
            let mut a = serde_json::json!({
                "type": "time_delay",
                "id": format!("a{i}"),
                "amount": 1,
                "unit": "days"
            });
            if i + 1 < n {
                a["next"] = serde_json::json!(format!("a{}", i + 1));
            }
            a
        })
        .collect();
    serde_json::from_value(serde_json::json!({
        "name": "Linear",
        "trigger": { "type": "list", "id": "LIST01" },
        "entry_action_id": "a0",
        "actions": actions
    }))
    .unwrap()
}

/// Config with no pacing and three zero-delay attempts for every error.
pub fn fast_config() -> BuildConfig {
    let mut config = BuildConfig {
        pacing_ms: 0,
        ..BuildConfig::default()
    };
    let fast = RetryPolicy::default()
        .with_max_attempts(3)
        .with_retryable(Vec::<String>::new());
    let fast = RetryPolicy {
        base_delay_ms: 0,
        ..fast
    };
    config.retry.create = fast.clone();
    config.retry.lookup = fast.clone();
    config.retry.content = fast.clone();
    config.retry.ui = fast;
    config
}

// =============================================================================
// Mock collaborators
// =============================================================================

/// Directory with a fixed exact-match table and a listing for fuzzy matches.
#[derive(Default)]
pub struct MockDirectory {
    pub exact: HashMap<String, String>,
    pub listing: Vec<NamedResource>,
    pub failures: Mutex<VecDeque<RemoteError>>,
    pub find_calls: Mutex<usize>,
    pub list_calls: Mutex<usize>,
}

impl MockDirectory {
    pub fn with_exact(pairs: &[(&str, &str)]) -> Self {
        MockDirectory {
            exact: pairs
                .iter()
                .map(|(n, i)| (n.to_string(), i.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn with_listing(pairs: &[(&str, &str)]) -> Self {
        MockDirectory {
            listing: pairs
                .iter()
                .map(|(n, i)| NamedResource {
                    id: i.to_string(),
                    name: n.to_string(),
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn fail_next(&self, errors: Vec<RemoteError>) {
        self.failures.lock().unwrap().extend(errors);
    }

    pub fn find_calls(&self) -> usize {
        *self.find_calls.lock().unwrap()
    }

    pub fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }
}

#[async_trait]
impl ResourceDirectory for MockDirectory {
    async fn find_by_name(&self, _kind: ResourceKind, name: &str) -> Result<Option<String>, RemoteError> {
        *self.find_calls.lock().unwrap() += 1;
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(self.exact.get(name).cloned())
    }

    async fn list(&self, _kind: ResourceKind) -> Result<Vec<NamedResource>, RemoteError> {
        *self.list_calls.lock().unwrap() += 1;
        Ok(self.listing.clone())
    }
}

/// Workflow service that echoes created actions back in creation order.
#[derive(Default)]
pub struct MockService {
    pub created: Mutex<Vec<FlowPayload>>,
    pub create_failures: Mutex<VecDeque<RemoteError>>,
    pub fail_read: bool,
    pub fail_status: bool,
    /// Reverse the echoed action order, as a reordering remote would.
    pub reverse_read: bool,
    pub assigned: Mutex<Vec<(String, ContentRef)>>,
    pub statuses: Mutex<Vec<(String, FlowStatus)>>,
}

impl MockService {
    pub fn fail_create(&self, errors: Vec<RemoteError>) {
        self.create_failures.lock().unwrap().extend(errors);
    }

    pub fn create_calls(&self) -> usize {
        self.created.lock().unwrap().len()
    }
}

#[async_trait]
impl WorkflowService for MockService {
    async fn create(&self, payload: &FlowPayload) -> Result<RemoteFlow, RemoteError> {
        self.created.lock().unwrap().push(payload.clone());
        if let Some(err) = self.create_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(RemoteFlow {
            id: "FLOW01".into(),
            name: payload.name.clone(),
        })
    }

    async fn read(&self, id: &str) -> Result<RemoteDefinition, RemoteError> {
        if self.fail_read {
            return Err(RemoteError::Network("connection reset".into()));
        }
        let created = self.created.lock().unwrap();
        let Some(payload) = created.last() else {
            return Err(RemoteError::NotFound(id.to_string()));
        };
        let mut actions: Vec<RemoteResource> = payload
            .actions
            .iter()
            .enumerate()
            .map(|(i, a)| RemoteResource {
                id: format!("R{i}"),
                resource_type: a.action_type.clone(),
            })
            .collect();
        if self.reverse_read {
            actions.reverse();
        }
        Ok(RemoteDefinition {
            id: id.to_string(),
            name: payload.name.clone(),
            actions,
        })
    }

    async fn set_status(&self, id: &str, status: FlowStatus) -> Result<(), RemoteError> {
        if self.fail_status {
            return Err(RemoteError::Validation("status change rejected".into()));
        }
        self.statuses.lock().unwrap().push((id.to_string(), status));
        Ok(())
    }

    async fn assign_content(&self, remote_action_id: &str, content: &ContentRef) -> Result<(), RemoteError> {
        self.assigned
            .lock()
            .unwrap()
            .push((remote_action_id.to_string(), content.clone()));
        Ok(())
    }
}

/// Content pipeline that only produces a usable template for one shape.
pub struct MockPipeline {
    pub usable_shape: Option<TemplateShape>,
    pub failing_uploads: HashSet<String>,
    pub uploads: Mutex<Vec<String>>,
    pub renders: Mutex<Vec<RenderRequest>>,
}

impl MockPipeline {
    pub fn accepting(shape: TemplateShape) -> Self {
        MockPipeline {
            usable_shape: Some(shape),
            failing_uploads: HashSet::new(),
            uploads: Mutex::new(vec![]),
            renders: Mutex::new(vec![]),
        }
    }

    pub fn rejecting_everything() -> Self {
        MockPipeline {
            usable_shape: None,
            ..MockPipeline::accepting(TemplateShape::Sections)
        }
    }

    pub fn rendered_shapes(&self) -> Vec<TemplateShape> {
        self.renders.lock().unwrap().iter().map(|r| r.shape).collect()
    }
}

#[async_trait]
impl ContentPipeline for MockPipeline {
    async fn upload_asset(&self, local_ref: &str) -> Result<String, RemoteError> {
        self.uploads.lock().unwrap().push(local_ref.to_string());
        if self.failing_uploads.contains(local_ref) {
            return Err(RemoteError::Validation(format!("{local_ref} is too large")));
        }
        Ok(format!("https://cdn.example/{local_ref}"))
    }

    async fn render(&self, request: &RenderRequest) -> Result<RenderedContent, RemoteError> {
        self.renders.lock().unwrap().push(request.clone());
        if self.usable_shape == Some(request.shape) {
            Ok(RenderedContent {
                template_id: Some(format!("TPL-{}", request.action_id)),
                url: Some(format!("https://cdn.example/{}.html", request.action_id)),
            })
        } else {
            Ok(RenderedContent {
                template_id: None,
                url: None,
            })
        }
    }
}

/// UI driver that fails selected operations a fixed number of times.
#[derive(Default)]
pub struct MockDriver {
    /// Operation name → remaining failures (`usize::MAX` = always).
    pub failures: Mutex<HashMap<&'static str, usize>>,
    pub performed: Mutex<Vec<UiOperation>>,
    pub attempts: Mutex<usize>,
    pub captures: Mutex<Vec<String>>,
}

impl MockDriver {
    pub fn failing(op: &'static str, times: usize) -> Self {
        let driver = MockDriver::default();
        driver.failures.lock().unwrap().insert(op, times);
        driver
    }

    pub fn performed_names(&self) -> Vec<&'static str> {
        self.performed.lock().unwrap().iter().map(|o| o.name()).collect()
    }
}

#[async_trait]
impl UiDriver for MockDriver {
    async fn perform(&self, operation: &UiOperation) -> Result<(), RemoteError> {
        *self.attempts.lock().unwrap() += 1;
        {
            let mut failures = self.failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(operation.name()) {
                if *remaining > 0 {
                    if *remaining != usize::MAX {
                        *remaining -= 1;
                    }
                    return Err(RemoteError::Step(format!("{} did not respond", operation.name())));
                }
            }
        }
        self.performed.lock().unwrap().push(operation.clone());
        Ok(())
    }

    async fn capture_failure(&self, label: &str) {
        self.captures.lock().unwrap().push(label.to_string());
    }
}
