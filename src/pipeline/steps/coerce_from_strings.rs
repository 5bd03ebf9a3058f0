use async_trait::async_trait;
use serde_json::{Number, Value};

use crate::json_path::JsonPath;
use crate::pipeline::{PipelineError, PipelineStep, RequestContext};
use crate::schema::ResourceSchema;
use crate::validation::formats;

/// `"12"` -> `12`, `"1.5"` -> `1.5`. Non-strings and unparsable strings are left alone.
pub fn coerce_number(value: &mut Value) {
    let Value::String(text) = value else {
        return;
    };
    let text = text.trim();
    let number = if let Ok(n) = text.parse::<i64>() {
        Some(Number::from(n))
    } else if let Ok(n) = text.parse::<u64>() {
        Some(Number::from(n))
    } else {
        text.parse::<f64>().ok().and_then(Number::from_f64)
    };
    if let Some(number) = number {
        *value = Value::Number(number);
    }
}

/// `"true"`/`"false"` in any case -> boolean
pub fn coerce_boolean(value: &mut Value) {
    let Value::String(text) = value else {
        return;
    };
    if text.eq_ignore_ascii_case("true") {
        *value = Value::Bool(true);
    } else if text.eq_ignore_ascii_case("false") {
        *value = Value::Bool(false);
    }
}

/// A date path holding a date-time keeps only `yyyy-MM-dd`
pub fn truncate_to_date(value: &mut Value) {
    let Value::String(text) = value else {
        return;
    };
    if formats::parse_iso_date(text).is_some() {
        return;
    }
    if let Some(date_time) = formats::parse_date_time(text) {
        *value = Value::String(date_time.date().format("%Y-%m-%d").to_string());
    }
}

/// Applies every declared coercion to `body` in place. Running it twice is a no-op.
pub fn coerce_document(resource: &ResourceSchema, body: &mut Value) {
    let groups: [(&[String], fn(&mut Value)); 3] = [
        (resource.numeric_json_paths.as_slice(), coerce_number),
        (resource.boolean_json_paths.as_slice(), coerce_boolean),
        (resource.date_json_paths.as_slice(), truncate_to_date),
    ];

    for (paths, coerce) in groups {
        for path in paths {
            match JsonPath::parse(path) {
                Ok(path) => path.for_each_mut(body, coerce),
                Err(e) => tracing::warn!("Skipping coercion path: {}", e),
            }
        }
    }
}

/// Rewrites string-typed numbers, booleans and dates declared by the schema
pub struct CoerceFromStringsStep;

#[async_trait]
impl PipelineStep for CoerceFromStringsStep {
    fn name(&self) -> &'static str {
        "CoerceFromStrings"
    }

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        if let Some(resource) = ctx.resource_schema.clone() {
            coerce_document(&resource, &mut ctx.parsed_body);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bell_schedule() -> ResourceSchema {
        ResourceSchema {
            resource_name: "BellSchedule".into(),
            numeric_json_paths: vec![
                "$.schoolReference.schoolId".into(),
                "$.classPeriods[*].classPeriodReference.schoolId".into(),
                "$.totalInstructionalTime".into(),
            ],
            boolean_json_paths: vec!["$.isActive".into()],
            date_json_paths: vec!["$.dates[*].date".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_strings_are_coerced_in_place() {
        let mut body = json!({
            "schoolReference": {"schoolId": "255901"},
            "classPeriods": [
                {"classPeriodReference": {"schoolId": "1"}},
                {"classPeriodReference": {"schoolId": 2}}
            ],
            "totalInstructionalTime": "12.5",
            "isActive": "TRUE",
            "dates": [{"date": "2024-08-01T10:00:00Z"}, {"date": "2024-08-02"}]
        });
        coerce_document(&bell_schedule(), &mut body);

        assert_eq!(body["schoolReference"]["schoolId"], json!(255901));
        assert_eq!(body["classPeriods"][0]["classPeriodReference"]["schoolId"], json!(1));
        assert_eq!(body["classPeriods"][1]["classPeriodReference"]["schoolId"], json!(2));
        assert_eq!(body["totalInstructionalTime"], json!(12.5));
        assert_eq!(body["isActive"], json!(true));
        assert_eq!(body["dates"][0]["date"], json!("2024-08-01"));
        assert_eq!(body["dates"][1]["date"], json!("2024-08-02"));
    }

    #[test]
    fn test_coercion_is_idempotent() {
        let mut body = json!({"schoolReference": {"schoolId": "7"}, "isActive": "false"});
        coerce_document(&bell_schedule(), &mut body);
        let once = body.clone();
        coerce_document(&bell_schedule(), &mut body);
        assert_eq!(body, once);
    }

    #[test]
    fn test_unparsable_values_are_left_for_validation() {
        let mut body = json!({"schoolReference": {"schoolId": "abc"}, "isActive": "yes"});
        coerce_document(&bell_schedule(), &mut body);
        assert_eq!(body["schoolReference"]["schoolId"], json!("abc"));
        assert_eq!(body["isActive"], json!("yes"));
    }
}
