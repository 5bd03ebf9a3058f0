use async_trait::async_trait;
use serde_json::Value;

use crate::json_path::{JsonPath, Segment};
use crate::pipeline::responses::{data_validation_failure, ordinal, DATA_VALIDATION_DETAIL};
use crate::pipeline::{PipelineError, PipelineStep, RequestContext};
use crate::schema::{ArrayUniquenessConstraint, ResourceSchema};
use crate::types::ValidationFailures;

/// `$.items[*].a.b` -> (`$.items`, `$.a.b`)
fn split_at_array(path: &str) -> Option<(JsonPath, JsonPath)> {
    let (array, item) = path.split_once("[*]")?;
    let item = if item.is_empty() { "$".to_string() } else { format!("${}", item) };
    Some((JsonPath::parse(array).ok()?, JsonPath::parse(&item).ok()?))
}

fn array_name(array_path: &JsonPath) -> String {
    match array_path.segments().last() {
        Some(Segment::Property(name)) => name.clone(),
        _ => array_path.as_str().to_string(),
    }
}

/// Checks one constraint inside `scope`, which sits at `scope_path` in the body
fn check_scope(
    constraint: &ArrayUniquenessConstraint,
    scope: &Value,
    scope_path: &str,
    failures: &mut ValidationFailures,
) {
    let Some((array_path, _)) = constraint.paths.first().and_then(|p| split_at_array(p)) else {
        tracing::warn!("Array uniqueness constraint without an array path: {:?}", constraint.paths);
        return;
    };
    let item_paths: Vec<JsonPath> = constraint
        .paths
        .iter()
        .filter_map(|p| split_at_array(p).map(|(_, item)| item))
        .collect();

    for (concrete, array) in array_path.select_with_paths(scope) {
        let Value::Array(items) = array else {
            continue;
        };
        let location = format!("{}{}", scope_path, &concrete[1..]);
        let name = array_name(&array_path);

        let mut seen: Vec<Vec<Vec<&Value>>> = Vec::new();
        for (index, item) in items.iter().enumerate() {
            let key: Vec<Vec<&Value>> = item_paths.iter().map(|p| p.select(item)).collect();
            if seen.contains(&key) {
                failures.add(
                    location.clone(),
                    format!(
                        "The {} item of the {} has the same identifying values as another item earlier in the list.",
                        ordinal(index + 1),
                        name
                    ),
                );
            } else {
                seen.push(key);
            }
        }
    }
}

fn check_constraint(constraint: &ArrayUniquenessConstraint, body: &Value, failures: &mut ValidationFailures) {
    match &constraint.base_path {
        Some(base_path) => match JsonPath::parse(base_path) {
            Ok(base) => {
                for (scope_path, scope) in base.select_with_paths(body) {
                    check_scope(constraint, scope, &scope_path, failures);
                }
            }
            Err(e) => tracing::warn!("Skipping array uniqueness base path: {}", e),
        },
        None => check_scope(constraint, body, "$", failures),
    }

    for nested in &constraint.nested_constraints {
        check_constraint(nested, body, failures);
    }
}

/// Duplicate items in arrays the schema declares unique, reported under the
/// concrete array path
pub fn find_duplicate_array_items(resource: &ResourceSchema, body: &Value) -> ValidationFailures {
    let mut failures = ValidationFailures::new();
    for constraint in &resource.array_uniqueness_constraints {
        check_constraint(constraint, body, &mut failures);
    }
    failures
}

pub struct ArrayUniquenessStep;

#[async_trait]
impl PipelineStep for ArrayUniquenessStep {
    fn name(&self) -> &'static str {
        "ArrayUniqueness"
    }

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        let Some(resource) = ctx.resource_schema.clone() else {
            return Ok(());
        };

        let failures = find_duplicate_array_items(&resource, &ctx.parsed_body);
        if !failures.is_empty() {
            let response = data_validation_failure(DATA_VALIDATION_DETAIL, ctx.trace_id(), &failures, &[]);
            ctx.respond(response);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource(constraints: Vec<ArrayUniquenessConstraint>) -> ResourceSchema {
        ResourceSchema {
            resource_name: "RequiredImmunization".into(),
            array_uniqueness_constraints: constraints,
            ..Default::default()
        }
    }

    fn constraint(base_path: Option<&str>, paths: &[&str]) -> ArrayUniquenessConstraint {
        ArrayUniquenessConstraint {
            base_path: base_path.map(str::to_string),
            paths: paths.iter().map(|p| p.to_string()).collect(),
            nested_constraints: vec![],
        }
    }

    fn immunizations() -> ResourceSchema {
        let mut outer = constraint(None, &["$.requiredImmunizations[*].immunizationTypeDescriptor"]);
        outer.nested_constraints = vec![constraint(
            Some("$.requiredImmunizations[*]"),
            &["$.dates[*].immunizationDate"],
        )];
        resource(vec![outer])
    }

    #[test]
    fn test_third_item_repeats_first() {
        let schema = resource(vec![constraint(None, &["$.gradeLevels[*].gradeLevelDescriptor"])]);
        let body = json!({"gradeLevels": [
            {"gradeLevelDescriptor": "uri://ed-fi.org/GradeLevelDescriptor#Ninth"},
            {"gradeLevelDescriptor": "uri://ed-fi.org/GradeLevelDescriptor#Tenth"},
            {"gradeLevelDescriptor": "uri://ed-fi.org/GradeLevelDescriptor#Ninth"}
        ]});

        let failures = find_duplicate_array_items(&schema, &body);
        assert_eq!(
            failures.get("$.gradeLevels").unwrap(),
            &["The 3rd item of the gradeLevels has the same identifying values as another item earlier in the list.".to_string()]
        );
    }

    #[test]
    fn test_multi_path_identity_compares_all_values() {
        let schema = resource(vec![constraint(
            None,
            &[
                "$.items[*].assessmentItemReference.identificationCode",
                "$.items[*].assessmentItemReference.namespace",
            ],
        )]);
        let item = |code: &str, ns: &str| json!({"assessmentItemReference": {"identificationCode": code, "namespace": ns}});

        let distinct = json!({"items": [item("a", "x"), item("a", "y")]});
        assert!(find_duplicate_array_items(&schema, &distinct).is_empty());

        let repeated = json!({"items": [item("a", "x"), item("a", "x")]});
        let failures = find_duplicate_array_items(&schema, &repeated);
        assert_eq!(
            failures.get("$.items").unwrap(),
            &["The 2nd item of the items has the same identifying values as another item earlier in the list.".to_string()]
        );
    }

    #[test]
    fn test_nested_duplicates_report_concrete_parent() {
        let body = json!({"requiredImmunizations": [
            {
                "dates": [{"immunizationDate": "2007-07-01"}, {"immunizationDate": "2007-07-01"}],
                "immunizationTypeDescriptor": "uri://ed-fi.org/ImmunizationTypeDescriptor#MMR"
            },
            {
                "dates": [{"immunizationDate": "2010-04-01"}],
                "immunizationTypeDescriptor": "uri://ed-fi.org/ImmunizationTypeDescriptor#IPV"
            }
        ]});

        let failures = find_duplicate_array_items(&immunizations(), &body);
        assert_eq!(failures.len(), 1);
        assert_eq!(
            failures.get("$.requiredImmunizations[0].dates").unwrap(),
            &["The 2nd item of the dates has the same identifying values as another item earlier in the list.".to_string()]
        );
    }

    #[test]
    fn test_both_levels_reported() {
        let body = json!({"requiredImmunizations": [
            {
                "dates": [{"immunizationDate": "2007-07-01"}, {"immunizationDate": "2007-07-01"}],
                "immunizationTypeDescriptor": "uri://ed-fi.org/ImmunizationTypeDescriptor#IPV"
            },
            {
                "dates": [{"immunizationDate": "2010-04-01"}],
                "immunizationTypeDescriptor": "uri://ed-fi.org/ImmunizationTypeDescriptor#IPV"
            }
        ]});

        let failures = find_duplicate_array_items(&immunizations(), &body);
        assert!(failures.get("$.requiredImmunizations").is_some());
        assert!(failures.get("$.requiredImmunizations[0].dates").is_some());
    }

    #[test]
    fn test_same_dates_under_different_parents_are_allowed() {
        let body = json!({"requiredImmunizations": [
            {"dates": [{"immunizationDate": "2007-07-01"}], "immunizationTypeDescriptor": "a"},
            {"dates": [{"immunizationDate": "2007-07-01"}], "immunizationTypeDescriptor": "b"}
        ]});
        assert!(find_duplicate_array_items(&immunizations(), &body).is_empty());
    }
}
