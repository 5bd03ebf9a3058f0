use async_trait::async_trait;
use serde_json::Value;

use crate::json_path::JsonPath;
use crate::pipeline::{PipelineError, PipelineStep, RequestContext};
use crate::schema::ResourceSchema;
use crate::validation::formats;

/// Any accepted date-time spelling -> `yyyy-MM-ddTHH:mm:ssZ` in UTC.
/// Values without an offset are taken as UTC; bare dates become midnight.
/// Unparsable strings are left for validation to reject.
pub fn normalize_date_time(value: &mut Value) {
    let Value::String(text) = value else {
        return;
    };
    if let Some(date_time) = formats::parse_date_time(text) {
        *value = Value::String(date_time.format("%Y-%m-%dT%H:%M:%S%.fZ").to_string());
    }
}

pub fn coerce_date_times(resource: &ResourceSchema, body: &mut Value) {
    for path in &resource.date_time_json_paths {
        match JsonPath::parse(path) {
            Ok(path) => path.for_each_mut(body, normalize_date_time),
            Err(e) => tracing::warn!("Skipping date-time path: {}", e),
        }
    }
}

/// Normalizes date-time values. Runs even when string coercion is bypassed.
pub struct CoerceDateTimesStep;

#[async_trait]
impl PipelineStep for CoerceDateTimesStep {
    fn name(&self) -> &'static str {
        "CoerceDateTimes"
    }

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        if let Some(resource) = ctx.resource_schema.clone() {
            coerce_date_times(&resource, &mut ctx.parsed_body);
        }
        Ok(())
    }
}
