//! REST build: create the flow in one call, then populate it.

use tracing::instrument;

use crate::config::BuildConfig;
use crate::error::BuildError;
use crate::ir::CompileWarning;
use crate::ir::rest::FlowStatus;
use crate::ir::validate::validate_payload;
use crate::lower::{compile_for_api, correlate, traverse};
use crate::parse::types::Flow;
use crate::remote::{ContentPipeline, ContentRefs, NameLookup, WorkflowService};
use crate::retry::with_retry;
use crate::validate::validate;

use super::{Backend, BuildReport, pace, prepare_content};

pub struct ApiBuilder<'a> {
    service: &'a dyn WorkflowService,
    lookup: &'a dyn NameLookup,
    content: Option<&'a dyn ContentPipeline>,
    config: BuildConfig,
}

impl<'a> ApiBuilder<'a> {
    pub fn new(service: &'a dyn WorkflowService, lookup: &'a dyn NameLookup, config: BuildConfig) -> Self {
        ApiBuilder {
            service,
            lookup,
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
        let mut report = BuildReport::new(Backend::Rest, validation.warnings);

        let refs = match self.content {
            Some(pipeline) => {
                let (refs, warnings) = prepare_content(flow, pipeline, &self.config).await;
                report.warnings.extend(warnings);
                refs
            }
            None => ContentRefs::new(),
        };

        let compiled = compile_for_api(flow, self.lookup, &refs).await?;
        report.warnings.extend(compiled.warnings.iter().cloned());

        let errors = validate_payload(&compiled.payload);
        if !errors.is_empty() {
            return Err(BuildError::Artifact(errors));
        }

        // Core step: nothing after this is worth doing if it fails.
        let label = format!("create flow '{}'", flow.name);
        let created = with_retry(
            || self.service.create(&compiled.payload),
            &label,
            &self.config.retry.create,
        )
        .await?;
        report.completed_steps += 1;
        report.workflow_id = Some(created.id.clone());
        tracing::info!(workflow = %created.id, actions = compiled.order.len(), "flow created");

        pace(&self.config).await;
        let label = format!("read flow '{}'", created.id);
        match with_retry(|| self.service.read(&created.id), &label, &self.config.retry.create).await {
            Ok(definition) => {
                report.completed_steps += 1;
                report.correlations = correlate(&traverse(flow), &definition.actions);
                if report.correlations.len() != compiled.order.len() {
                    report.warnings.push(CompileWarning::new(
                        None,
                        format!(
                            "remote reported {} action(s) for {} compiled; some actions are uncorrelated",
                            definition.actions.len(),
                            compiled.order.len()
                        ),
                    ));
                }
            }
            Err(e) => report.warnings.push(CompileWarning::new(
                None,
                format!("created actions could not be correlated: {e}"),
            )),
        }

        for correlation in &report.correlations {
            let Some(content) = refs.get(&correlation.action_id) else {
                continue;
            };
            pace(&self.config).await;
            let label = format!("assign content to '{}'", correlation.action_id);
            match with_retry(
                || self.service.assign_content(&correlation.remote_id, content),
                &label,
                &self.config.retry.content,
            )
            .await
            {
                Ok(()) => report.completed_steps += 1,
                Err(e) => report.warnings.push(CompileWarning::new(
                    Some(&correlation.action_id),
                    format!("content was not assigned: {e}"),
                )),
            }
        }

        if self.config.status != FlowStatus::Draft {
            pace(&self.config).await;
            let label = format!("set status of '{}' to {}", created.id, self.config.status.as_str());
            match with_retry(
                || self.service.set_status(&created.id, self.config.status),
                &label,
                &self.config.retry.create,
            )
            .await
            {
                Ok(()) => {
                    report.completed_steps += 1;
                    report.status = self.config.status;
                }
                Err(e) => report.warnings.push(CompileWarning::new(
                    None,
                    format!("flow left as draft: {e}"),
                )),
            }
        }

        tracing::info!(
            workflow = %created.id,
            status = report.status.as_str(),
            warnings = report.warnings.len(),
            "build finished"
        );
        Ok(report)
    }
}
