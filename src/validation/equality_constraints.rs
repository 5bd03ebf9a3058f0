use serde_json::Value;

use crate::json_path::{value_to_string, JsonPath};
use crate::schema::EqualityConstraint;
use crate::types::ValidationFailures;

/// Checks that every value found at a constraint's source and target paths is
/// the same. A conflict is reported under both paths.
pub fn validate_equality_constraints(body: &Value, constraints: &[EqualityConstraint]) -> ValidationFailures {
    let mut failures = ValidationFailures::new();

    for constraint in constraints {
        let (source, target) = match (
            JsonPath::parse(&constraint.source_json_path),
            JsonPath::parse(&constraint.target_json_path),
        ) {
            (Ok(source), Ok(target)) => (source, target),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!("Skipping equality constraint: {}", e);
                continue;
            }
        };

        let mut distinct: Vec<String> = Vec::new();
        for value in source.select(body).into_iter().chain(target.select(body)) {
            let value = value_to_string(value);
            if !distinct.contains(&value) {
                distinct.push(value);
            }
        }

        if distinct.len() > 1 {
            let name = source.last_property().unwrap_or_default();
            let message = format!(
                "All values supplied for '{}' must match. Review all references (including those higher up in the resource's data) and align the following conflicting values: '{}'",
                name,
                distinct.join("', '")
            );
            failures.add(source.as_str(), message.clone());
            failures.add(target.as_str(), message);
        }
    }

    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn constraint() -> Vec<EqualityConstraint> {
        vec![EqualityConstraint {
            source_json_path: "$.classPeriods[*].classPeriodReference.schoolId".into(),
            target_json_path: "$.schoolReference.schoolId".into(),
        }]
    }

    #[test]
    fn test_matching_values_pass() {
        let body = json!({
            "schoolReference": {"schoolId": 1},
            "classPeriods": [
                {"classPeriodReference": {"schoolId": 1}},
                {"classPeriodReference": {"schoolId": 1}}
            ]
        });
        assert!(validate_equality_constraints(&body, &constraint()).is_empty());
    }

    #[test]
    fn test_conflict_is_reported_on_both_paths() {
        let body = json!({
            "schoolReference": {"schoolId": 2},
            "classPeriods": [{"classPeriodReference": {"schoolId": 1}}]
        });

        let failures = validate_equality_constraints(&body, &constraint());
        let expected = "All values supplied for 'schoolId' must match. Review all references (including those higher up in the resource's data) and align the following conflicting values: '1', '2'";
        assert_eq!(
            failures.get("$.classPeriods[*].classPeriodReference.schoolId").unwrap(),
            &[expected.to_string()]
        );
        assert_eq!(failures.get("$.schoolReference.schoolId").unwrap(), &[expected.to_string()]);
    }

    #[test]
    fn test_absent_values_do_not_conflict() {
        let body = json!({"schoolReference": {"schoolId": 2}});
        assert!(validate_equality_constraints(&body, &constraint()).is_empty());
    }
}
