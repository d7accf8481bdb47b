//! Simulated-UI build: perform the compiled plan step by step.

use tracing::instrument;

use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::ir::CompileWarning;
use crate::ir::validate::validate_plan;
use crate::lower::compile_for_ui_with;
use crate::parse::types::Flow;
use crate::remote::{ContentPipeline, ContentRefs, UiDriver};
use crate::retry::with_retry;
use crate::validate::validate;

use super::{Backend, BuildReport, pace, prepare_content};

pub struct UiBuilder<'a> {
    driver: &'a dyn UiDriver,
    content: Option<&'a dyn ContentPipeline>,
    config: BuildConfig,
}

impl<'a> UiBuilder<'a> {
    pub fn new(driver: &'a dyn UiDriver, config: BuildConfig) -> Self {
        UiBuilder {
            driver,
            content: None,
            config,
        }
    }

    #[must_use]
    pub fn with_content(mut self, pipeline: &'a dyn ContentPipeline) -> Self {
        self.content = Some(pipeline);
        self
    }

    #[instrument(skip_all, fields(flow = %flow.name))]
    pub async fn build(&self, flow: &Flow) -> Result<BuildReport, BuildError> {
        let validation = validate(flow);
        if !validation.valid {
            return Err(BuildError::Invalid(validation));
        }
        let mut report = BuildReport::new(Backend::Ui, validation.warnings);

        let refs = match self.content {
            Some(pipeline) => {
                let (refs, warnings) = prepare_content(flow, pipeline, &self.config).await;
                report.warnings.extend(warnings);
                refs
            }
            None => ContentRefs::new(),
        };

        let plan = compile_for_ui_with(flow, &refs)?;
        report.warnings.extend(plan.warnings.iter().cloned());

        let errors = validate_plan(&plan);
        if !errors.is_empty() {
            return Err(BuildError::Artifact(errors));
        }

        for step in &plan.steps {
            if step.index > 1 {
                pace(&self.config).await;
            }
            let result = with_retry(
                || self.driver.perform(&step.operation),
                &step.label,
                &self.config.retry.ui,
            )
            .await;

            let Err(e) = result else {
                report.completed_steps += 1;
                continue;
            };
            if self.config.capture_screenshots {
                self.driver.capture_failure(&step.label).await;
            }
            if step.critical {
                tracing::error!(step = %step.label, error = %e, "critical step failed, aborting");
                return Err(BuildError::Step {
                    label: step.label.clone(),
                    completed: report.completed_steps,
                    source: e,
                });
            }
            report
                .warnings
                .push(CompileWarning::new(step.action_id.as_deref(), e.to_string()));
        }

        tracing::info!(
            steps = report.completed_steps,
            warnings = report.warnings.len(),
            "build finished"
        );
        Ok(report)
    }
}
