//! WASM entry points for browser use.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::error::CompilerError;
use crate::ir::ui::UiPlan;

/// Parse + validate a flow JSON.
/// Returns `{ valid, errors, warnings }`, each finding as an error object.
#[wasm_bindgen]
pub fn validate_flow(json: &str) -> JsValue {
    let result = validate_flow_inner(json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn validate_flow_inner(json: &str) -> ValidationDto {
    let flow = match crate::parse::parse(json) {
        Ok(f) => f,
        Err(errors) => {
            return ValidationDto {
                valid: false,
                errors: errors.into_iter().map(ErrorDto::from).collect(),
                warnings: vec![],
            };
        }
    };

    let report = crate::validate::validate(&flow);
    ValidationDto {
        valid: report.valid,
        errors: report
            .errors
            .into_iter()
            .map(|f| ErrorDto::from(CompilerError::from(f)))
            .collect(),
        warnings: report
            .warnings
            .into_iter()
            .map(|f| ErrorDto::from(CompilerError::from(f)))
            .collect(),
    }
}

/// Full UI pipeline: parse → validate → compile → plan validation.
/// Returns `{ status: "success", plan }` or `{ status: "errors", errors }`.
#[wasm_bindgen]
pub fn compile_ui_plan(json: &str) -> JsValue {
    let result = compile_ui_plan_inner(json);
    serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
}

fn compile_ui_plan_inner(json: &str) -> PlanResult {
    let flow = match crate::parse::parse(json) {
        Ok(f) => f,
        Err(errors) => return PlanResult::errors(errors),
    };

    let report = crate::validate::validate(&flow);
    if !report.valid {
        return PlanResult::errors(report.errors.into_iter().map(CompilerError::from));
    }

    let plan = match crate::lower::compile_for_ui(&flow) {
        Ok(p) => p,
        Err(e) => return PlanResult::errors([CompilerError::from(e)]),
    };

    let plan_errors = crate::ir::validate_plan(&plan);
    if !plan_errors.is_empty() {
        return PlanResult::errors(plan_errors.into_iter().map(CompilerError::from));
    }

    PlanResult::Success { plan }
}

// ---------------------------------------------------------------------------
// DTOs for serialization to JS
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ErrorDto {
    code: String,
    phase: String,
    message: String,
    action_id: Option<String>,
}

impl From<CompilerError> for ErrorDto {
    fn from(e: CompilerError) -> Self {
        ErrorDto {
            code: e.code,
            phase: e.phase.to_string(),
            message: e.message,
            action_id: e.action_id,
        }
    }
}

#[derive(Debug, Serialize)]
struct ValidationDto {
    valid: bool,
    errors: Vec<ErrorDto>,
    warnings: Vec<ErrorDto>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum PlanResult {
    Success { plan: UiPlan },
    Errors { errors: Vec<ErrorDto> },
}

impl PlanResult {
    fn errors(errors: impl IntoIterator<Item = CompilerError>) -> Self {
        PlanResult::Errors {
            errors: errors.into_iter().map(ErrorDto::from).collect(),
        }
    }
}
