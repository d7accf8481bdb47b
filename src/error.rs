//! Error types shared across phases.
//!
//! `CompilerError` is the phase-tagged diagnostic used for parse failures,
//! validation findings and the browser surface. The `thiserror` enums below
//! are the typed failures of compilation and of a whole build.

use crate::ir::validate::ArtifactError;
use crate::remote::RemoteError;
use crate::retry::RetryError;
use crate::validate::{Finding, ValidationReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Parse,
    Validate,
    Compile,
    ArtifactValidate,
    Submit,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Parse => write!(f, "Parse"),
            Phase::Validate => write!(f, "Validate"),
            Phase::Compile => write!(f, "Compile"),
            Phase::ArtifactValidate => write!(f, "Artifact Validate"),
            Phase::Submit => write!(f, "Submit"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompilerError {
    pub code: String,
    pub phase: Phase,
    pub message: String,
    pub action_id: Option<String>,
}

impl std::fmt::Display for CompilerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.action_id {
            Some(id) => write!(
                f,
                "[{}:{}] {} (action '{}')",
                self.phase, self.code, self.message, id
            ),
            None => write!(f, "[{}:{}] {}", self.phase, self.code, self.message),
        }
    }
}

impl std::error::Error for CompilerError {}

impl From<Finding> for CompilerError {
    fn from(f: Finding) -> Self {
        CompilerError {
            code: f.code.to_string(),
            phase: Phase::Validate,
            message: f.message,
            action_id: f.action_id,
        }
    }
}

impl From<ArtifactError> for CompilerError {
    fn from(e: ArtifactError) -> Self {
        CompilerError {
            code: e.code.to_string(),
            phase: Phase::ArtifactValidate,
            message: e.message,
            action_id: e.action_id,
        }
    }
}

impl From<CompileError> for CompilerError {
    fn from(e: CompileError) -> Self {
        let (code, action_id) = match &e {
            CompileError::Capability(c) => ("C001", Some(c.action_id.clone())),
            CompileError::Unresolved { .. } => ("C002", None),
            CompileError::Incomplete(_) => ("C003", None),
        };
        CompilerError {
            code: code.into(),
            phase: Phase::Compile,
            message: e.to_string(),
            action_id,
        }
    }
}

impl CompilerError {
    pub fn parse(code: &str, message: impl Into<String>) -> Self {
        CompilerError {
            code: code.into(),
            phase: Phase::Parse,
            message: message.into(),
            action_id: None,
        }
    }

    pub fn submit(code: &str, message: impl Into<String>, action_id: Option<String>) -> Self {
        CompilerError {
            code: code.into(),
            phase: Phase::Submit,
            message: message.into(),
            action_id,
        }
    }
}

/// A backend cannot represent a construct in the flow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("action '{action_id}' ({action_type}) cannot be compiled for the {backend} backend: {reason}")]
pub struct CapabilityError {
    pub backend: &'static str,
    pub action_id: String,
    pub action_type: &'static str,
    pub reason: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Capability(#[from] CapabilityError),
    /// A trigger name could not be resolved to an external id.
    #[error("{kind} '{name}' not found: {reason}")]
    Unresolved {
        kind: &'static str,
        name: String,
        reason: String,
    },
    /// The flow is missing something validation would have rejected.
    #[error("flow is incomplete: {0}")]
    Incomplete(String),
}

/// Failure that aborts a whole build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("flow failed validation with {} error(s): {}", .0.errors.len(), .0.error_messages().join("; "))]
    Invalid(ValidationReport),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error("compiled payload is inconsistent: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Artifact(Vec<ArtifactError>),
    #[error(transparent)]
    Remote(#[from] RetryError<RemoteError>),
    /// A critical UI step failed; steps before it were already performed.
    #[error("step '{label}' failed after {completed} completed step(s): {source}")]
    Step {
        label: String,
        completed: usize,
        #[source]
        source: RetryError<RemoteError>,
    },
}
