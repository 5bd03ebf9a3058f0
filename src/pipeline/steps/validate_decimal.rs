use async_trait::async_trait;
use serde_json::{Number, Value};

use crate::json_path::JsonPath;
use crate::pipeline::responses::{data_validation_failure, DATA_VALIDATION_DETAIL};
use crate::pipeline::{PipelineError, PipelineStep, RequestContext};
use crate::schema::{DecimalPropertyValidationInfo, ResourceSchema};
use crate::types::ValidationFailures;

/// Digits left and right of the decimal point, ignoring sign, leading zeros
/// of the integer part and trailing zeros of the fraction
fn digit_counts(number: &Number) -> (usize, usize) {
    let text = if number.is_f64() {
        number.as_f64().map(|f| f.to_string()).unwrap_or_default()
    } else {
        number.to_string()
    };
    let text = text.trim_start_matches('-');
    let (integer, fraction) = text.split_once('.').unwrap_or((text, ""));
    (
        integer.trim_start_matches('0').len(),
        fraction.trim_end_matches('0').len(),
    )
}

fn check_property(info: &DecimalPropertyValidationInfo, body: &Value, failures: &mut ValidationFailures) {
    let (Some(total_digits), Some(decimal_places)) = (info.total_digits, info.decimal_places) else {
        tracing::debug!("Decimal info for {} has no precision, skipping", info.path);
        return;
    };
    let path = match JsonPath::parse(&info.path) {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!("Skipping decimal path: {}", e);
            return;
        }
    };

    let max_integer_digits = total_digits.saturating_sub(decimal_places) as usize;
    let name = path.last_property().unwrap_or_default().to_string();
    for (concrete, value) in path.select_with_paths(body) {
        let Value::Number(number) = value else {
            continue;
        };
        let (integer_digits, fraction_digits) = digit_counts(number);
        if integer_digits > max_integer_digits || fraction_digits > decimal_places as usize {
            failures.add(
                concrete,
                format!(
                    "{} must be within {} digits to the left and {} digits to the right of the decimal point.",
                    name, max_integer_digits, decimal_places
                ),
            );
        }
    }
}

pub fn validate_decimals(resource: &ResourceSchema, body: &Value) -> ValidationFailures {
    let mut failures = ValidationFailures::new();
    for info in &resource.decimal_property_validation_infos {
        check_property(info, body, &mut failures);
    }
    failures
}

/// Enforces declared decimal precision and scale
pub struct ValidateDecimalStep;

#[async_trait]
impl PipelineStep for ValidateDecimalStep {
    fn name(&self) -> &'static str {
        "ValidateDecimal"
    }

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        let Some(resource) = ctx.resource_schema.clone() else {
            return Ok(());
        };

        let failures = validate_decimals(&resource, &ctx.parsed_body);
        if !failures.is_empty() {
            let response = data_validation_failure(DATA_VALIDATION_DETAIL, ctx.trace_id(), &failures, &[]);
            ctx.respond(response);
        }
        Ok(())
    }
}
