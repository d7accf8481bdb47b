//! Contracts with the external collaborators.
//!
//! The compiler and build steps only ever talk to the outside world through
//! these traits. Implementations (HTTP clients, browser drivers, template
//! renderers) live outside this crate.

pub mod directory;
pub mod fallback;

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ir::rest::{FlowPayload, FlowStatus};
use crate::ir::ui::UiOperation;
use crate::lower::traverse::RemoteResource;
use crate::retry::Classify;

pub use directory::{CachedLookup, NameLookup, fuzzy_match};
pub use fallback::{FallbackAttempt, FallbackChain, FallbackExhausted, FallbackOutcome};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("rejected by remote validation: {0}")]
    Validation(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// A simulated-UI step did not complete.
    #[error("ui step failed: {0}")]
    Step(String),
}

impl Classify for RemoteError {
    fn kind(&self) -> Option<&str> {
        Some(match self {
            RemoteError::Auth(_) => "auth",
            RemoteError::Validation(_) => "validation",
            RemoteError::RateLimited(_) => "rate_limited",
            RemoteError::Network(_) => "network",
            RemoteError::NotFound(_) => "not_found",
            RemoteError::Step(_) => "step",
        })
    }
}

// =============================================================================
// REMOTE WORKFLOW SERVICE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFlow {
    pub id: String,
    pub name: String,
}

/// A created flow as read back from the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDefinition {
    pub id: String,
    pub name: String,
    /// Created actions in the order the remote reports them.
    pub actions: Vec<RemoteResource>,
}

#[async_trait]
pub trait WorkflowService: Send + Sync {
    async fn create(&self, payload: &FlowPayload) -> Result<RemoteFlow, RemoteError>;

    async fn read(&self, id: &str) -> Result<RemoteDefinition, RemoteError>;

    async fn set_status(&self, id: &str, status: FlowStatus) -> Result<(), RemoteError>;

    /// Attach rendered content to a created message action.
    async fn assign_content(
        &self,
        remote_action_id: &str,
        content: &ContentRef,
    ) -> Result<(), RemoteError>;
}

// =============================================================================
// METRIC / LIST DIRECTORY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Metric,
    List,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Metric => "metric",
            ResourceKind::List => "list",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub id: String,
    pub name: String,
}

#[async_trait]
pub trait ResourceDirectory: Send + Sync {
    async fn find_by_name(&self, kind: ResourceKind, name: &str) -> Result<Option<String>, RemoteError>;

    async fn list(&self, kind: ResourceKind) -> Result<Vec<NamedResource>, RemoteError>;
}

// =============================================================================
// CONTENT PIPELINE
// =============================================================================

/// Hosted content a message action points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Content references keyed by local action id.
pub type ContentRefs = HashMap<String, ContentRef>;

/// Request shapes the renderer has accepted over time, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateShape {
    Sections,
    LegacySections,
    RawHtml,
}

impl std::fmt::Display for TemplateShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateShape::Sections => write!(f, "sections"),
            TemplateShape::LegacySections => write!(f, "legacy_sections"),
            TemplateShape::RawHtml => write!(f, "raw_html"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderRequest {
    pub action_id: String,
    pub message_name: String,
    pub shape: TemplateShape,
    pub sections: Vec<Value>,
    pub html: Option<String>,
    /// Hosted references of the uploaded images, in document order.
    pub assets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedContent {
    pub template_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl RenderedContent {
    pub fn is_usable(&self) -> bool {
        self.template_id.as_deref().is_some_and(|id| !id.trim().is_empty())
    }
}

#[async_trait]
pub trait ContentPipeline: Send + Sync {
    async fn upload_asset(&self, local_ref: &str) -> Result<String, RemoteError>;

    async fn render(&self, request: &RenderRequest) -> Result<RenderedContent, RemoteError>;
}

// =============================================================================
// SIMULATED-UI DRIVER
// =============================================================================

#[async_trait]
pub trait UiDriver: Send + Sync {
    async fn perform(&self, operation: &UiOperation) -> Result<(), RemoteError>;

    /// Record the session state after a failed step (e.g. a screenshot).
    async fn capture_failure(&self, label: &str);
}
