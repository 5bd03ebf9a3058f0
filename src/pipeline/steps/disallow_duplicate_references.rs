use async_trait::async_trait;
use indexmap::IndexMap;

use crate::json_path::JsonPath;
use crate::pipeline::responses::{data_validation_failure, ordinal, DATA_VALIDATION_DETAIL};
use crate::pipeline::{PipelineError, PipelineStep, RequestContext};
use crate::types::{DocumentIdentity, DocumentInfo, ValidationFailures};

fn duplicate_message(position: usize, name: &str) -> String {
    format!(
        "The {} item of the {} has the same identifying values as another item earlier in the list.",
        ordinal(position),
        name
    )
}

/// Positions (1-based) of items whose identity already appeared earlier in the list
fn repeated_positions<'a>(identities: impl Iterator<Item = &'a DocumentIdentity>) -> Vec<usize> {
    let mut seen: Vec<&DocumentIdentity> = Vec::new();
    let mut repeated = Vec::new();
    for (index, identity) in identities.enumerate() {
        if seen.contains(&identity) {
            repeated.push(index + 1);
        } else {
            seen.push(identity);
        }
    }
    repeated
}

/// Collections of document references report under `$.<ResourceName>`;
/// collections of descriptors report under their own wildcard path.
pub fn find_duplicate_references(info: &DocumentInfo) -> ValidationFailures {
    let mut failures = ValidationFailures::new();

    let mut document_groups: IndexMap<(&str, &str), Vec<&DocumentIdentity>> = IndexMap::new();
    for reference in &info.document_references {
        if reference.path.contains("[*]") {
            document_groups
                .entry((reference.path.as_str(), reference.resource_info.resource_name.as_str()))
                .or_default()
                .push(&reference.identity);
        }
    }
    for ((_, resource_name), identities) in document_groups {
        for position in repeated_positions(identities.into_iter()) {
            failures.add(format!("$.{}", resource_name), duplicate_message(position, resource_name));
        }
    }

    let mut descriptor_groups: IndexMap<&str, Vec<&DocumentIdentity>> = IndexMap::new();
    for reference in &info.descriptor_references {
        if reference.path.contains("[*]") {
            descriptor_groups
                .entry(reference.path.as_str())
                .or_default()
                .push(&reference.identity);
        }
    }
    for (path, identities) in descriptor_groups {
        let name = JsonPath::parse(path)
            .ok()
            .and_then(|p| p.array_property().map(str::to_string))
            .unwrap_or_else(|| path.to_string());
        for position in repeated_positions(identities.into_iter()) {
            failures.add(path, duplicate_message(position, &name));
        }
    }

    failures
}

pub struct DisallowDuplicateReferencesStep;

#[async_trait]
impl PipelineStep for DisallowDuplicateReferencesStep {
    fn name(&self) -> &'static str {
        "DisallowDuplicateReferences"
    }

    async fn execute(&self, ctx: &mut RequestContext) -> Result<(), PipelineError> {
        let Some(info) = &ctx.document_info else {
            return Ok(());
        };

        let failures = find_duplicate_references(info);
        if !failures.is_empty() {
            let response = data_validation_failure(DATA_VALIDATION_DETAIL, ctx.trace_id(), &failures, &[]);
            ctx.respond(response);
        }
        Ok(())
    }
}
