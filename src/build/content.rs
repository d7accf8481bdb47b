//! Asset upload and template rendering for message actions with rich content.

use crate::config::BuildConfig;
use crate::ir::CompileWarning;
use crate::lower::traverse;
use crate::parse::types::{Action, Flow};
use crate::remote::{
    ContentPipeline, ContentRef, ContentRefs, FallbackChain, RenderRequest, TemplateShape,
};
use crate::retry::with_retry;

use super::pace;

/// Render request shapes, newest first.
pub fn template_shapes() -> FallbackChain<TemplateShape> {
    FallbackChain::new(vec![
        TemplateShape::Sections,
        TemplateShape::LegacySections,
        TemplateShape::RawHtml,
    ])
}

/// Upload every referenced image and render one template per message.
///
/// Never fails: a message whose content cannot be produced is left without a
/// reference and a warning says so.
pub async fn prepare_content(
    flow: &Flow,
    pipeline: &dyn ContentPipeline,
    config: &BuildConfig,
) -> (ContentRefs, Vec<CompileWarning>) {
    let mut refs = ContentRefs::new();
    let mut warnings = Vec::new();
    let shapes = template_shapes();
    let policy = &config.retry.content;
    let mut first_call = true;

    for action in traverse(flow) {
        let Action::SendMessage(message) = action else {
            continue;
        };
        let Some(content) = &message.config.content else {
            continue;
        };
        let id = message.id.as_str();

        let mut assets = Vec::with_capacity(content.images.len());
        for image in &content.images {
            if !std::mem::take(&mut first_call) {
                pace(config).await;
            }
            let label = format!("upload '{image}' for '{id}'");
            match with_retry(|| pipeline.upload_asset(image), &label, policy).await {
                Ok(hosted) => assets.push(hosted),
                Err(e) => warnings.push(CompileWarning::new(
                    Some(id),
                    format!("asset '{image}' was not uploaded: {e}"),
                )),
            }
        }

        if !std::mem::take(&mut first_call) {
            pace(config).await;
        }
        let message_name = action.label().to_string();
        let outcome = shapes
            .run(
                &format!("render '{id}'"),
                |shape| {
                    let request = RenderRequest {
                        action_id: id.to_string(),
                        message_name: message_name.clone(),
                        shape,
                        sections: content.sections.clone(),
                        html: content.html.clone(),
                        assets: assets.clone(),
                    };
                    let label = format!("render '{id}' as {shape}");
                    async move { with_retry(|| pipeline.render(&request), &label, policy).await }
                },
                |rendered| rendered.is_usable(),
            )
            .await;

        match outcome {
            Ok(found) => {
                tracing::info!(
                    action = id,
                    shape = %found.variant,
                    tried = found.attempts.len(),
                    "content rendered"
                );
                if let Some(template_id) = found.value.template_id {
                    refs.insert(
                        id.to_string(),
                        ContentRef {
                            id: template_id,
                            url: found.value.url,
                        },
                    );
                }
            }
            Err(exhausted) => {
                tracing::warn!(action = id, error = %exhausted, "content not rendered");
                warnings.push(CompileWarning::new(Some(id), exhausted.to_string()));
            }
        }
    }

    (refs, warnings)
}
