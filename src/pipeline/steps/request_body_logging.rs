use async_trait::async_trait;
use serde_json::Value;

use crate::pipeline::{PipelineError, PipelineStep, RequestContext};

/// Replaces every scalar with `"*"`, keeping the structure
pub fn mask_body(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(map.iter().map(|(k, v)| (k.clone(), mask_body(v))).collect()),
        Value::Array(items) => Value::Array(items.iter().map(mask_body).collect()),
        _ => Value::String("*".to_string()),
    }
}

/// Logs the parsed body at debug level. Never affects the outcome.
pub struct RequestBodyLoggingStep {
    mask_request_body: bool,
}

impl RequestBodyLoggingStep {
    pub fn new(mask_request_body: bool) -> Self {
        Self { mask_request_body }
    }
}

#[async_trait]
impl PipelineStep for RequestBodyLoggingStep {
    fn name(&self) -> &'static str {
        "RequestBodyLogging"
    }

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        if tracing::enabled!(tracing::Level::DEBUG) {
            let body = if self.mask_request_body {
                mask_body(&ctx.parsed_body)
            } else {
                ctx.parsed_body.clone()
            };
            tracing::debug!("Request body: {} - {}", body, ctx.trace_id());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mask_keeps_structure() {
        let masked = mask_body(&json!({"a": 1, "b": {"c": "secret"}, "d": [true, null]}));
        assert_eq!(masked, json!({"a": "*", "b": {"c": "*"}, "d": ["*", "*"]}));
    }
}
