//! Ordered fallback over request shapes.
//!
//! Each variant is tried in sequence until one returns a response the caller
//! accepts as structurally valid. Every attempt is recorded so the chain can be
//! audited after the fact.

use std::fmt::Display;
use std::future::Future;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallbackAttempt {
    pub variant: String,
    pub outcome: String,
}

#[derive(Debug, Clone)]
pub struct FallbackOutcome<T, S> {
    pub value: T,
    pub variant: S,
    pub attempts: Vec<FallbackAttempt>,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{label}: no variant produced a usable response ({})", summarize(.attempts))]
pub struct FallbackExhausted {
    pub label: String,
    pub attempts: Vec<FallbackAttempt>,
}

fn summarize(attempts: &[FallbackAttempt]) -> String {
    if attempts.is_empty() {
        return "no variants".into();
    }
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.variant, a.outcome))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone)]
pub struct FallbackChain<S> {
    variants: Vec<S>,
}

impl<S: Clone + Display> FallbackChain<S> {
    pub fn new(variants: Vec<S>) -> Self {
        FallbackChain { variants }
    }

    pub fn variants(&self) -> &[S] {
        &self.variants
    }

    pub async fn run<T, E, F, Fut, A>(
        &self,
        label: &str,
        mut call: F,
        accept: A,
    ) -> Result<FallbackOutcome<T, S>, FallbackExhausted>
    where
        F: FnMut(S) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        A: Fn(&T) -> bool,
    {
        let mut attempts = Vec::with_capacity(self.variants.len());

        for variant in &self.variants {
            match call(variant.clone()).await {
                Ok(value) if accept(&value) => {
                    attempts.push(FallbackAttempt {
                        variant: variant.to_string(),
                        outcome: "accepted".into(),
                    });
                    return Ok(FallbackOutcome {
                        value,
                        variant: variant.clone(),
                        attempts,
                    });
                }
                Ok(_) => {
                    tracing::debug!(label, variant = %variant, "response rejected as unusable");
                    attempts.push(FallbackAttempt {
                        variant: variant.to_string(),
                        outcome: "unusable response".into(),
                    });
                }
                Err(e) => {
                    tracing::debug!(label, variant = %variant, error = %e, "variant failed");
                    attempts.push(FallbackAttempt {
                        variant: variant.to_string(),
                        outcome: e.to_string(),
                    });
                }
            }
        }

        Err(FallbackExhausted {
            label: label.to_string(),
            attempts,
        })
    }
}
